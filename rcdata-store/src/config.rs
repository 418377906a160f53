//! Generic keyed settings backed by a defaults map.

use std::path::PathBuf;

use rcdata_format::{ContentType, PipelineConfig};
use rcdata_model::{Priorities, Priority, SchemaBuilder, Snapshot, TypedField};
use rcdata_primitives::Primitives;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::data::{Data, OpenOptions};
use crate::error::StoreResult;

/// Settings whose fields are whatever keys the defaults map holds.
///
/// Each default fixes its field's type. The file overrides the defaults;
/// nothing else is consulted. Stored uncompressed as generic content.
#[derive(Debug)]
pub struct ConfigData {
    data: Data<ConfigData>,
}

impl ConfigData {
    pub fn open(defaults: Snapshot, path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with(defaults, path, Primitives::standard())
    }

    pub fn open_with(
        defaults: Snapshot,
        path: impl Into<PathBuf>,
        primitives: Primitives,
    ) -> StoreResult<Self> {
        let mut builder = SchemaBuilder::new();
        for (name, value) in &defaults {
            builder.try_field(name, TypedField::new(Some(value.clone()), None));
        }
        let schema = builder.build()?;

        let options = OpenOptions::new()
            .path(path)
            .priorities(Priorities {
                init: Priority::DISABLED,
                env: Priority::DISABLED,
                ..Priorities::default()
            })
            .defaults(defaults)
            .pipeline(PipelineConfig::new(ContentType::Generic))
            .primitives(primitives);
        let data = Data::open_with_schema(schema, options)?;
        Ok(Self { data })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> StoreResult<T> {
        self.data.get_as(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> StoreResult<()> {
        self.data.set(name, value)
    }

    pub fn sync(&self) -> StoreResult<()> {
        self.data.sync()
    }

    pub fn reload(&mut self) -> StoreResult<()> {
        self.data.reload()
    }

    pub fn data(&self) -> &Data<ConfigData> {
        &self.data
    }
}
