//! Tests for JSON request decoding and the one-call build.

use serde_json::json;

use trellis::config::Settings;
use trellis::error::{BuildError, ErrorKind};
use trellis::query::expr::{alias, column, func};
use trellis::query::OrderByExpr;
use trellis::request::{build, decode_specs, BuildRequest, RequestError};
use trellis::resolve::PathSpec;
use trellis::Schema;

fn blog_schema() -> Schema {
    Schema::from_toml(include_str!("../fixtures/blog.toml")).unwrap()
}

#[test]
fn test_full_request_runs_every_stage() {
    let schema = blog_schema();
    let request = BuildRequest::from_json(
        r#"{
            "entity": "Post",
            "load_path": ["post"],
            "select": ["title", {"author": ["name", {"publisher": ["country"]}]}],
            "order_by": [{"desc": "inserted_at"}, "total"],
            "aggregate": {
                "group_by": ["title"],
                "functions": [{"function": "sum", "field": "views", "as": "total"}]
            },
            "limit": 25,
            "offset": 50
        }"#,
    )
    .unwrap();

    let built = build(&schema, &request, &Settings::default()).unwrap();

    assert!(built.is_complete());
    assert_eq!(
        built.query.projection_names(),
        vec!["title", "name", "country", "total"]
    );
    assert_eq!(
        built.query.projection("country"),
        Some(&column("post__author__publisher", "country"))
    );
    assert_eq!(built.query.group_by, vec![column("post", "title")]);
    assert_eq!(
        built.query.order_by,
        vec![
            OrderByExpr::desc(column("post", "inserted_at")),
            OrderByExpr::asc(alias("total")),
        ]
    );
    assert_eq!(built.query.limit(), Some(25));
    assert_eq!(built.query.offset(), Some(50));
}

#[test]
fn test_derived_request_entry() {
    let schema = blog_schema();
    let request = BuildRequest::from_json(
        r#"{
            "entity": "Post",
            "select": [{"field": ["author", "name"], "as": "shout", "fragment": "UPPER(?)"}]
        }"#,
    )
    .unwrap();

    let built = build(&schema, &request, &Settings::default()).unwrap();
    assert_eq!(
        built.query.projection("shout"),
        Some(&func("upper", vec![column("post__author", "name")]))
    );
}

#[test]
fn test_unsupported_function_is_fatal() {
    let schema = blog_schema();
    let request = BuildRequest::from_json(
        r#"{
            "entity": "Post",
            "select": [{"field": ["title"], "as": "x", "function": "not_a_real_fn"}]
        }"#,
    )
    .unwrap();

    let err = build(&schema, &request, &Settings::default()).unwrap_err();
    assert!(matches!(
        err,
        RequestError::Build(BuildError::UnsupportedFunction { ref identifier, .. })
            if identifier == "not_a_real_fn"
    ));
}

#[test]
fn test_recoverable_errors_carry_request_context() {
    let schema = blog_schema();
    let request = BuildRequest::from_json(
        r#"{
            "entity": "Post",
            "load_path": ["post", "comments", "user"],
            "group_by": [["bad_association", "field"]]
        }"#,
    )
    .unwrap();

    let built = build(&schema, &request, &Settings::default()).unwrap();
    assert_eq!(built.errors.len(), 1);
    assert_eq!(built.errors[0].kind, ErrorKind::Group);
    assert_eq!(built.errors[0].path, vec!["bad_association"]);
    assert_eq!(built.errors[0].load_path, vec!["post", "comments", "user"]);

    let record = serde_json::to_value(&built.errors[0]).unwrap();
    assert_eq!(
        record,
        json!({
            "kind": "group",
            "path": ["bad_association"],
            "load_path": ["post", "comments", "user"],
            "message": "unknown association 'bad_association' on 'Post'"
        })
    );
}

#[test]
fn test_root_alias_override() {
    let schema = blog_schema();
    let request = BuildRequest::from_json(
        r#"{"entity": "Post", "root_alias": "p", "select": ["title"]}"#,
    )
    .unwrap();

    let built = build(&schema, &request, &Settings::default()).unwrap();
    assert_eq!(built.query.projection("title"), Some(&column("p", "title")));
}

#[test]
fn test_unknown_entity() {
    let schema = blog_schema();
    let request = BuildRequest::from_json(r#"{"entity": "Invoice"}"#).unwrap();

    let err = build(&schema, &request, &Settings::default()).unwrap_err();
    assert!(matches!(
        err,
        RequestError::Build(BuildError::UnknownEntity(ref name)) if name == "Invoice"
    ));
}

#[test]
fn test_malformed_specs_rejected_before_build() {
    let schema = blog_schema();
    let cases = [
        json!({"entity": "Post", "select": [7]}),
        json!({"entity": "Post", "select": [["author", null]]}),
        json!({"entity": "Post", "select": [{"field": "title", "as": "t"}]}),
        json!({
            "entity": "Post",
            "select": [{"field": "title", "function": "upper", "fragment": "upper(?)"}]
        }),
        json!({
            "entity": "Post",
            "select": [{"field": "views", "as": "p", "function": "percentile", "percentile": [1]}]
        }),
        json!({"entity": "Post", "order_by": [{"asc": "title", "desc": "id"}]}),
        json!({
            "entity": "Post",
            "aggregate": {"functions": [{"function": "sum", "field": {"author": ["id", "name"]}}]}
        }),
    ];

    for case in cases {
        let request: BuildRequest = serde_json::from_value(case.clone()).unwrap();
        let err = build(&schema, &request, &Settings::default()).unwrap_err();
        assert!(
            matches!(err, RequestError::InvalidSpec { .. }),
            "expected InvalidSpec for {case}, got {err:?}"
        );
    }
}

#[test]
fn test_missing_entity_is_a_json_error() {
    let err = BuildRequest::from_json(r#"{"select": ["title"]}"#).unwrap_err();
    assert!(matches!(err, RequestError::Json(_)));
}

#[test]
fn test_decode_specs_flattens_nested_lists() {
    let specs = decode_specs(&[
        json!("title"),
        json!({"comments": [{"desc": "score"}, {"author": "name"}]}),
    ])
    .unwrap();

    assert_eq!(
        specs,
        vec![
            PathSpec::field("title"),
            PathSpec::path(["comments", "score"]).desc(),
            PathSpec::path(["comments", "author", "name"]),
        ]
    );
}
