//! End-to-end builds across every clause stage.

use std::thread;

use trellis::error::ErrorKind;
use trellis::resolve::{DerivedSpec, PathSpec};
use trellis::{Accumulator, AggregateSpec, QueryBuilder, Schema, SchemaGraph};

fn blog_schema() -> Schema {
    Schema::from_toml(include_str!("../fixtures/blog.toml")).unwrap()
}

fn report(graph: &dyn SchemaGraph) -> Accumulator {
    QueryBuilder::new(graph, "Post")
        .unwrap()
        .select(&[
            PathSpec::field("title"),
            DerivedSpec::function(PathSpec::path(["author", "name"]), "upper")
                .with_alias("author_name")
                .into(),
        ])
        .unwrap()
        .aggregate(
            &[PathSpec::field("title")],
            &[AggregateSpec::new("count", PathSpec::path(["comments", "id"]))
                .with_alias("comment_count")],
        )
        .unwrap()
        .order_by(&[PathSpec::field("comment_count").desc()])
        .limit(10)
        .finish()
}

#[test]
fn test_report_explain() {
    let schema = blog_schema();
    let built = report(&schema);

    assert!(built.is_complete());
    insta::assert_snapshot!(built.query.explain(), @r"
    from Post as post
    left join post.author as post__author (User, one)
    left join post.comments as post__comments (Comment, many)
    select title: post.title
    select author_name: upper(post__author.name)
    select comment_count: count(post__comments.id)
    group by post.title
    order by @comment_count desc
    limit 10
    ");
}

#[test]
fn test_load_path_copied_into_every_record() {
    let schema = blog_schema();
    let context = ["post", "comments", "user"];

    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .load_path(context)
        .select(&[PathSpec::path(["ghost", "name"])])
        .unwrap()
        .group_by(&[PathSpec::path(["bad_association", "field"])])
        .order_by(&[PathSpec::path(["nope", "id"])])
        .aggregate(&[], &[AggregateSpec::new("sum", PathSpec::path(["void", "views"]))])
        .unwrap()
        .finish();

    assert_eq!(built.errors.len(), 4);
    assert!(built.errors.iter().all(|e| e.load_path == context));

    let kinds: Vec<ErrorKind> = built.errors.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::Select,
            ErrorKind::Group,
            ErrorKind::Sort,
            ErrorKind::Aggregate
        ]
    );
    assert_eq!(
        built.errors[1].to_string(),
        "group error at [bad_association] (loading post -> comments -> user): \
         unknown association 'bad_association' on 'Post'"
    );
}

#[test]
fn test_recoverable_errors_do_not_stop_the_build() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Comment")
        .unwrap()
        .select(&[
            PathSpec::path(["post", "missing"]),
            PathSpec::field("body"),
            PathSpec::path(["post", "title"]),
        ])
        .unwrap()
        .offset(40)
        .limit(20)
        .finish();

    assert_eq!(built.query.root_alias, "comment");
    assert_eq!(built.query.projection_names(), vec!["body", "title"]);
    assert_eq!(built.errors.len(), 1);
    assert_eq!(built.query.limit(), Some(20));
    assert_eq!(built.query.offset(), Some(40));
}

#[test]
fn test_concurrent_builds_share_one_schema() {
    let schema = blog_schema();
    let expected = report(&schema);

    let results: Vec<Accumulator> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| report(&schema))).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r == &expected));
}
