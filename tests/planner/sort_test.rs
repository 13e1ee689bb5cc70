//! Tests for the sorter stage.

use trellis::error::ErrorKind;
use trellis::query::expr::{alias, column};
use trellis::query::{OrderByExpr, SortDir};
use trellis::resolve::{DerivedSpec, PathSpec};
use trellis::{QueryBuilder, Schema};

fn blog_schema() -> Schema {
    Schema::from_toml(include_str!("../fixtures/blog.toml")).unwrap()
}

#[test]
fn test_untagged_entries_sort_ascending() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .order_by(&PathSpec::fields(["title", "id"]))
        .finish();

    assert!(built.query.order_by.iter().all(|t| t.dir == SortDir::Asc));
    assert_eq!(
        built.query.order_by,
        vec![
            OrderByExpr::asc(column("post", "title")),
            OrderByExpr::asc(column("post", "id")),
        ]
    );
}

#[test]
fn test_direction_per_entry_in_input_order() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .order_by(&[
            PathSpec::path(["author", "name"]).asc(),
            PathSpec::field("inserted_at").desc(),
            PathSpec::field("id"),
        ])
        .finish();

    assert_eq!(
        built.query.order_by,
        vec![
            OrderByExpr::asc(column("post__author", "name")),
            OrderByExpr::desc(column("post", "inserted_at")),
            OrderByExpr::asc(column("post", "id")),
        ]
    );
}

#[test]
fn test_unresolvable_bare_field_sorts_by_alias() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .order_by(&[PathSpec::field("comment_count").desc()])
        .finish();

    assert!(built.is_complete());
    assert_eq!(built.query.order_by, vec![OrderByExpr::desc(alias("comment_count"))]);
}

#[test]
fn test_bad_association_is_sort_error() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .order_by(&[PathSpec::path(["reviewer", "name"]), PathSpec::field("title")])
        .finish();

    assert_eq!(built.query.order_by, vec![OrderByExpr::asc(column("post", "title"))]);
    let errors: Vec<_> = built.errors_of(ErrorKind::Sort).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, vec!["reviewer"]);
}

#[test]
fn test_derived_entry_is_sort_error() {
    let schema = blog_schema();
    let spec: PathSpec = DerivedSpec::function("title", "upper").with_alias("t").into();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .order_by(&[spec.desc()])
        .finish();

    assert!(built.query.order_by.is_empty());
    assert_eq!(built.errors_of(ErrorKind::Sort).count(), 1);
}
