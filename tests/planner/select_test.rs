//! Tests for the selector stage.

use trellis::config::Settings;
use trellis::error::{BuildError, ErrorKind};
use trellis::query::expr::{column, func, lit_float, lit_int, lit_str};
use trellis::resolve::{DerivedSpec, PathSpec};
use trellis::{QueryBuilder, Schema};

fn blog_schema() -> Schema {
    Schema::from_toml(include_str!("../fixtures/blog.toml")).unwrap()
}

#[test]
fn test_root_field_bound_to_root_alias() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[PathSpec::field("title")])
        .unwrap()
        .finish();

    assert_eq!(built.query.root_alias, "post");
    assert_eq!(built.query.projection("title"), Some(&column("post", "title")));
    assert!(built.query.joins.is_empty());
    assert!(built.is_complete());
}

#[test]
fn test_select_is_idempotent() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&PathSpec::fields(["title", "title"]))
        .unwrap()
        .select(&[PathSpec::field("title")])
        .unwrap()
        .finish();

    assert_eq!(built.query.projection_names(), vec!["title"]);
}

#[test]
fn test_calls_accumulate_into_one_projection() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[PathSpec::field("title")])
        .unwrap()
        .select(&[PathSpec::path(["author", "name"])])
        .unwrap()
        .finish();

    assert_eq!(built.query.projection_names(), vec!["title", "name"]);
    assert_eq!(built.query.projection("name"), Some(&column("post__author", "name")));
}

#[test]
fn test_nested_spec_expands_under_association() {
    let schema = blog_schema();
    let specs = PathSpec::nested(
        "author",
        [PathSpec::field("email"), PathSpec::path(["publisher", "country"])],
    );

    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&specs)
        .unwrap()
        .finish();

    assert_eq!(built.query.projection("email"), Some(&column("post__author", "email")));
    assert_eq!(
        built.query.projection("country"),
        Some(&column("post__author__publisher", "country"))
    );
    assert_eq!(built.query.joins.len(), 2);
}

#[test]
fn test_bare_field_found_through_associations() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&PathSpec::fields(["country", "label"]))
        .unwrap()
        .finish();

    assert_eq!(
        built.query.projection("country"),
        Some(&column("post__author__publisher", "country"))
    );
    assert_eq!(built.query.projection("label"), Some(&column("post__tags", "label")));
}

#[test]
fn test_bare_field_without_deep_search_is_an_error() {
    let schema = blog_schema();
    let mut settings = Settings::default();
    settings.resolution.deep_search = false;

    let built = QueryBuilder::with_settings(&schema, "Post", &settings)
        .unwrap()
        .select(&[PathSpec::field("country")])
        .unwrap()
        .finish();

    assert!(built.query.select.is_empty());
    let errors: Vec<_> = built.errors_of(ErrorKind::Select).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, vec!["country"]);
    assert_eq!(errors[0].message, "unknown field 'country' on 'Post'");
}

#[test]
fn test_bad_path_recorded_with_root_to_failure_path() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[
            PathSpec::path(["author", "nickname"]),
            PathSpec::path(["author", "agent", "name"]),
        ])
        .unwrap()
        .finish();

    let paths: Vec<_> = built.errors.iter().map(|e| e.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            vec!["author".to_string(), "nickname".to_string()],
            vec!["author".to_string(), "agent".to_string()],
        ]
    );
}

#[test]
fn test_derived_function_and_fragment() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[
            DerivedSpec::function(PathSpec::path(["author", "name"]), "upper")
                .with_alias("shout")
                .into(),
            DerivedSpec::fragment("inserted_at", "DATE_TRUNC( 'month',  ? )")
                .with_alias("month")
                .into(),
            DerivedSpec::function("title", "concat")
                .with_alias("label")
                .with_param("value", "!")
                .into(),
        ])
        .unwrap()
        .finish();

    assert!(built.is_complete());
    assert_eq!(
        built.query.projection("shout"),
        Some(&func("upper", vec![column("post__author", "name")]))
    );
    assert_eq!(
        built.query.projection("month"),
        Some(&func(
            "date_trunc",
            vec![lit_str("month"), column("post", "inserted_at")]
        ))
    );
    assert_eq!(
        built.query.projection("label"),
        Some(&func("concat", vec![column("post", "title"), lit_str("!")]))
    );
}

#[test]
fn test_percentile_and_bucket_parameters() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[
            DerivedSpec::function("views", "percentile")
                .with_alias("p90")
                .with_param("percentile", 0.9)
                .into(),
            DerivedSpec::function("views", "bucket")
                .with_alias("band")
                .with_param("lower", 0_i64)
                .with_param("upper", 1000_i64)
                .with_param("count", 10_i64)
                .into(),
        ])
        .unwrap()
        .finish();

    assert!(built.is_complete());
    assert_eq!(
        built.query.projection("p90"),
        Some(&func("percentile_cont", vec![lit_float(0.9), column("post", "views")]))
    );
    assert_eq!(
        built.query.projection("band"),
        Some(&func(
            "width_bucket",
            vec![
                column("post", "views"),
                lit_float(0.0),
                lit_float(1000.0),
                lit_int(10),
            ]
        ))
    );
}

#[test]
fn test_missing_parameters_are_recoverable() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[
            DerivedSpec::function("views", "percentile").with_alias("p").into(),
            DerivedSpec::function("views", "bucket")
                .with_alias("b")
                .with_param("lower", 0_i64)
                .with_param("upper", 10_i64)
                .into(),
            DerivedSpec::function("views", "percentile")
                .with_alias("q")
                .with_param("percentile", 1.5)
                .into(),
            PathSpec::field("title"),
        ])
        .unwrap()
        .finish();

    assert_eq!(built.query.projection_names(), vec!["title"]);
    assert_eq!(built.errors_of(ErrorKind::Select).count(), 3);
    assert!(built.errors.iter().all(|e| e.path == vec!["views"]));
}

#[test]
fn test_missing_alias_is_recoverable() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[DerivedSpec::function("title", "lower").into()])
        .unwrap()
        .finish();

    assert!(built.query.select.is_empty());
    assert_eq!(built.errors.len(), 1);
    assert!(built.errors[0].message.contains("requires an output alias"));
}

#[test]
fn test_unsupported_function_aborts_build() {
    let schema = blog_schema();
    let result = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[DerivedSpec::function(PathSpec::path(["title"]), "not_a_real_fn")
            .with_alias("x")
            .into()]);

    assert_eq!(
        result.err(),
        Some(BuildError::UnsupportedFunction {
            identifier: "not_a_real_fn".into(),
            field: "title".into(),
        })
    );
}

#[test]
fn test_unknown_root_entity() {
    let schema = blog_schema();
    let result = QueryBuilder::new(&schema, "Invoice");
    assert_eq!(result.err(), Some(BuildError::UnknownEntity("Invoice".into())));
}

#[test]
fn test_long_function_spellings_are_accepted() {
    let schema = blog_schema();
    let built = QueryBuilder::new(&schema, "Post")
        .unwrap()
        .select(&[
            DerivedSpec::function("views", "average").with_alias("a").into(),
            DerivedSpec::function("views", "maximum").with_alias("m").into(),
        ])
        .unwrap()
        .finish();

    assert!(built.is_complete());
    assert_eq!(built.query.projection("a"), Some(&func("avg", vec![column("post", "views")])));
    assert_eq!(built.query.projection("m"), Some(&func("max", vec![column("post", "views")])));
}
