use pretty_assertions::assert_eq;
use rcdata_model::{DataModel, FieldSchema, FieldType, SchemaBuilder, TypedField};
use serde_json::json;

struct Profile;

impl DataModel for Profile {
    fn declare(schema: &mut SchemaBuilder) {
        schema
            .field("name", TypedField::text("default_name"))
            .field("age", TypedField::integer(30))
            .field("tags", TypedField::list(vec![]));
    }
}

struct Duplicated;

impl DataModel for Duplicated {
    fn declare(schema: &mut SchemaBuilder) {
        schema
            .field("name", TypedField::text("a"))
            .field("name", TypedField::text("b"));
    }
}

struct BadDefault;

impl DataModel for BadDefault {
    fn declare(schema: &mut SchemaBuilder) {
        schema.try_field("age", TypedField::new(Some(json!("thirty")), Some(FieldType::Integer)));
    }
}

// ── build_from_model ─────────────────────────────────────────────

#[test]
fn build_preserves_declaration_order() {
    let schema = FieldSchema::build_from_model::<Profile>().unwrap();
    assert_eq!(schema.field_names(), vec!["name", "age", "tags"]);
    assert_eq!(schema.len(), 3);
}

#[test]
fn build_binds_names() {
    let schema = FieldSchema::build_from_model::<Profile>().unwrap();
    assert_eq!(schema.field("age").unwrap().name(), "age");
}

#[test]
fn duplicate_field_is_schema_error() {
    let err = FieldSchema::build_from_model::<Duplicated>().unwrap_err();
    assert!(err.is_schema());
    assert!(err.to_string().contains("`name`"));
}

#[test]
fn empty_name_is_schema_error() {
    let mut builder = SchemaBuilder::new();
    builder.field("", TypedField::bool(false));
    assert!(builder.build().unwrap_err().is_schema());
}

#[test]
fn invalid_declaration_surfaces_at_build() {
    let err = FieldSchema::build_from_model::<BadDefault>().unwrap_err();
    assert!(err.is_config());
}

// ── accessors ────────────────────────────────────────────────────

#[test]
fn snapshot_lists_current_values_in_order() {
    let mut schema = FieldSchema::build_from_model::<Profile>().unwrap();
    schema.set("name", "Alice").unwrap();

    let snapshot = schema.snapshot();
    let keys: Vec<_> = snapshot.keys().cloned().collect();
    assert_eq!(keys, vec!["name", "age", "tags"]);
    assert_eq!(snapshot["name"], json!("Alice"));
    assert_eq!(snapshot["age"], json!(30));
}

#[test]
fn set_unknown_field_fails() {
    let mut schema = FieldSchema::build_from_model::<Profile>().unwrap();
    let err = schema.set("email", "a@b.c").unwrap_err();
    assert!(err.is_schema());
}

#[test]
fn set_wrong_type_keeps_value() {
    let mut schema = FieldSchema::build_from_model::<Profile>().unwrap();
    let err = schema.set("age", "25").unwrap_err();
    assert!(err.is_config());
    assert_eq!(schema.get("age"), Some(&json!(30)));
}

#[test]
fn get_as_deserializes() {
    let mut schema = FieldSchema::build_from_model::<Profile>().unwrap();
    schema.set("tags", json!(["a", "b"])).unwrap();
    let tags: Vec<String> = schema.get_as("tags").unwrap();
    assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    let age: i64 = schema.get_as("age").unwrap();
    assert_eq!(age, 30);
}

#[test]
fn reset_restores_all_defaults() {
    let mut schema = FieldSchema::build_from_model::<Profile>().unwrap();
    schema.set("name", "Bob").unwrap();
    schema.set("age", 41).unwrap();
    schema.reset();
    assert_eq!(schema.get("name"), Some(&json!("default_name")));
    assert_eq!(schema.get("age"), Some(&json!(30)));
}

#[test]
fn instances_do_not_share_values() {
    let mut a = FieldSchema::build_from_model::<Profile>().unwrap();
    let b = FieldSchema::build_from_model::<Profile>().unwrap();
    a.set("name", "Alice").unwrap();
    assert_eq!(b.get("name"), Some(&json!("default_name")));
}
