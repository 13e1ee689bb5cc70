//! Tests for declarative schema loading.

use trellis::schema::{Cardinality, Schema, SchemaError, SchemaGraph};

#[test]
fn test_load_blog_fixture() {
    let schema = Schema::from_toml(include_str!("../fixtures/blog.toml")).unwrap();

    assert_eq!(schema.entity_count(), 5);
    assert_eq!(schema.association_count(), 8);
    assert_eq!(
        schema.association_names("Post"),
        vec!["author", "editor", "comments", "tags"]
    );
    assert_eq!(
        schema.association("User", "publisher").unwrap().cardinality,
        Cardinality::One
    );
    assert!(schema.has_field("Publisher", "country"));
    assert!(!schema.has_field("Publisher", "email"));
}

#[test]
fn test_load_json_definition() {
    let schema = Schema::from_json(
        r#"{
            "entities": [
                {"name": "Order", "fields": ["id", "total"],
                 "associations": [{"name": "lines", "entity": "Line", "cardinality": "many"}]},
                {"name": "Line", "fields": ["id", "qty"]}
            ]
        }"#,
    )
    .unwrap();

    let lines = schema.association("Order", "lines").unwrap();
    assert_eq!(lines.entity, "Line");
    assert_eq!(lines.cardinality, Cardinality::Many);
    assert_eq!(schema.field_names("Line"), vec!["id", "qty"]);
}

#[test]
fn test_dangling_target_rejected() {
    let err = Schema::from_toml(
        r#"
        [[entities]]
        name = "Post"
        fields = ["id"]
        associations = [{ name = "author", entity = "User" }]
        "#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        SchemaError::UnknownTarget {
            entity: "Post".into(),
            association: "author".into(),
            target: "User".into(),
        }
    );
}

#[test]
fn test_field_and_association_share_a_name() {
    let err = Schema::from_toml(
        r#"
        [[entities]]
        name = "Post"
        fields = ["id", "author"]
        associations = [{ name = "author", entity = "Post" }]
        "#,
    )
    .unwrap_err();

    assert!(matches!(err, SchemaError::DuplicateMember { ref member, .. } if member == "author"));
}

#[test]
fn test_malformed_definition() {
    let err = Schema::from_json(r#"{"entities": [{"fields": []}]}"#).unwrap_err();
    assert!(matches!(err, SchemaError::Parse(_)));
}
