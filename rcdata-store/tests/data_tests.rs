use std::fs;

use pretty_assertions::assert_eq;
use rcdata_format::{ContentType, PipelineConfig};
use rcdata_model::{DataModel, Priorities, Priority, SchemaBuilder, TypedField};
use rcdata_primitives::{SHA256, ZSTD};
use rcdata_store::{ConfigData, Data, OpenOptions, StoreError};
use serde_json::{Map, json};
use tempfile::tempdir;

struct Server;

impl DataModel for Server {
    fn declare(schema: &mut SchemaBuilder) {
        schema
            .field("host", TypedField::text("localhost"))
            .field("port", TypedField::integer(8080))
            .field("debug", TypedField::bool(false));
    }
}

fn map(value: serde_json::Value) -> Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(m) => m,
        _ => panic!("not an object"),
    }
}

#[test]
fn defaults_when_nothing_provided() {
    let data = Data::<Server>::open(OpenOptions::new()).unwrap();
    assert_eq!(data.get("host"), Some(&json!("localhost")));
    assert_eq!(data.get_as::<i64>("port").unwrap(), 8080);
    assert_eq!(data.path(), None);
}

#[test]
fn env_string_is_coerced_to_declared_type() {
    let vars = [("APP_PORT", "25"), ("APP_DEBUG", "true"), ("OTHER", "x")];
    let data = Data::<Server>::open(OpenOptions::new().env_vars("APP_", vars)).unwrap();

    assert_eq!(data.get("port"), Some(&json!(25)));
    assert_eq!(data.get("debug"), Some(&json!(true)));
    assert_eq!(data.resolution().winner("port"), Some("env"));
}

#[test]
fn unparsable_env_value_is_rejected() {
    let options = OpenOptions::new().env_vars("APP_", [("APP_PORT", "eighty")]);
    let err = Data::<Server>::open(options).unwrap_err();
    assert!(err.is_config(), "{err:?}");
}

#[test]
fn init_beats_env_beats_file_beats_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("server.data");

    let mut seeded = Data::<Server>::open(OpenOptions::new().path(&path)).unwrap();
    seeded.set("host", "from-file").unwrap();
    seeded.set("port", 1).unwrap();
    seeded.set("debug", true).unwrap();
    seeded.sync().unwrap();

    let data = Data::<Server>::open(
        OpenOptions::new()
            .path(&path)
            .init_value("host", "from-init")
            .env_vars("APP_", [("APP_HOST", "from-env"), ("APP_PORT", "2")])
            .defaults(map(json!({"host": "from-defaults", "port": 3, "debug": false}))),
    )
    .unwrap();

    assert_eq!(data.get("host"), Some(&json!("from-init")));
    assert_eq!(data.get("port"), Some(&json!(2)));
    assert_eq!(data.get("debug"), Some(&json!(true)));
    assert_eq!(data.resolution().winner("debug"), Some("file"));
}

#[test]
fn custom_priorities_reorder_sources() {
    let data = Data::<Server>::open(
        OpenOptions::new()
            .priorities(Priorities {
                init: Priority(1),
                defaults: Priority(9),
                ..Priorities::default()
            })
            .init_value("port", 1)
            .defaults(map(json!({"port": 9}))),
    )
    .unwrap();
    assert_eq!(data.get("port"), Some(&json!(9)));
}

#[test]
fn disabled_file_source_never_reads_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("server.data");
    fs::write(&path, b"\xff\xff garbage that is not rcdata").unwrap();

    let data = Data::<Server>::open(
        OpenOptions::new().path(&path).priorities(Priorities {
            file: Priority::DISABLED,
            ..Priorities::default()
        }),
    )
    .unwrap();

    assert_eq!(data.get("port"), Some(&json!(8080)));
    assert!(data.resolution().skipped().contains(&"file".to_string()));
}

#[test]
fn disabled_file_source_ignores_valid_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("server.data");

    let mut seeded = Data::<Server>::open(OpenOptions::new().path(&path)).unwrap();
    seeded.set("host", "example.org").unwrap();
    seeded.set("port", 9000).unwrap();
    seeded.sync().unwrap();

    let enabled = Data::<Server>::open(OpenOptions::new().path(&path)).unwrap();
    assert_eq!(enabled.get("port"), Some(&json!(9000)));

    let priorities = Priorities {
        file: Priority::DISABLED,
        ..Priorities::default()
    };
    let disabled =
        Data::<Server>::open(OpenOptions::new().path(&path).priorities(priorities)).unwrap();

    assert_eq!(disabled.get("host"), Some(&json!("localhost")));
    assert_eq!(disabled.get("port"), Some(&json!(8080)));
    assert_eq!(disabled.resolution().winner("port"), None);
}

#[test]
fn enabled_file_source_surfaces_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("server.data");
    fs::write(&path, b"\xff\xff garbage that is not rcdata").unwrap();

    let err = Data::<Server>::open(OpenOptions::new().path(&path)).unwrap_err();
    assert!(err.is_format(), "{err:?}");
}

#[test]
fn sync_then_reopen_with_pipeline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("server.data");
    let pipeline = PipelineConfig::new(ContentType::Generic).compact(ZSTD).hash(SHA256);

    let options = OpenOptions::new().path(&path).pipeline(pipeline.clone());
    let mut data = Data::<Server>::open(options).unwrap();
    data.set("host", "example.org").unwrap();
    data.sync().unwrap();

    let reopened = Data::<Server>::open(OpenOptions::new().path(&path).pipeline(pipeline)).unwrap();
    assert_eq!(reopened.snapshot(), data.snapshot());
}

#[test]
fn reload_discards_unsaved_changes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("server.data");

    let mut data = Data::<Server>::open(OpenOptions::new().path(&path)).unwrap();
    data.set("port", 9999).unwrap();
    data.reload().unwrap();
    assert_eq!(data.get("port"), Some(&json!(8080)));

    data.set("port", 9999).unwrap();
    data.sync().unwrap();
    data.set("port", 1).unwrap();
    data.reload().unwrap();
    assert_eq!(data.get("port"), Some(&json!(9999)));
}

#[test]
fn wrong_type_set_is_rejected() {
    let mut data = Data::<Server>::open(OpenOptions::new()).unwrap();
    assert!(data.set("port", "eighty").unwrap_err().is_config());
    assert_eq!(data.get("port"), Some(&json!(8080)));
}

#[test]
fn unknown_field_set_is_rejected() {
    let mut data = Data::<Server>::open(OpenOptions::new()).unwrap();
    assert!(data.set("nope", 1).is_err());
}

#[test]
fn sync_without_path_is_config_error() {
    let data = Data::<Server>::open(OpenOptions::new()).unwrap();
    assert!(matches!(data.sync(), Err(StoreError::Config(_))));
}

#[test]
fn invalid_pipeline_is_config_error() {
    let options = OpenOptions::new().pipeline(PipelineConfig::new(ContentType::Generic).prime(8));
    let err = Data::<Server>::open(options).unwrap_err();
    assert!(err.is_config());
}

struct Twice;

impl DataModel for Twice {
    fn declare(schema: &mut SchemaBuilder) {
        schema
            .field("a", TypedField::integer(1))
            .field("a", TypedField::integer(2));
    }
}

#[test]
fn duplicate_declaration_is_schema_error() {
    let err = Data::<Twice>::open(OpenOptions::new()).unwrap_err();
    assert!(matches!(err, StoreError::Schema(_)), "{err:?}");
}

#[test]
fn config_data_persists_over_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.config");
    let defaults = map(json!({"theme": "dark", "volume": 0.5, "plugins": []}));

    let mut config = ConfigData::open(defaults.clone(), &path).unwrap();
    assert_eq!(config.get("theme"), Some(&json!("dark")));
    config.set("volume", 0.8).unwrap();
    config.set("plugins", json!(["spell"])).unwrap();
    config.sync().unwrap();

    let reopened = ConfigData::open(defaults, &path).unwrap();
    assert_eq!(reopened.get_as::<f64>("volume").unwrap(), 0.8);
    assert_eq!(reopened.get_as::<Vec<String>>("plugins").unwrap(), vec!["spell".to_string()]);
    assert_eq!(reopened.get("theme"), Some(&json!("dark")));
}

#[test]
fn config_data_rejects_null_default() {
    let err = ConfigData::open(map(json!({"x": null})), "unused.config").unwrap_err();
    assert!(err.is_config(), "{err:?}");
}
