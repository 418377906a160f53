//! Typed data bound to an optional file.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rcdata_format::{PipelineConfig, PipelineMetadata};
use rcdata_model::{
    DataModel, FieldSchema, Priorities, Resolution, Snapshot, Source, SourceMerger,
};
use rcdata_primitives::Primitives;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::store::PersistentStore;

#[derive(Debug, Clone)]
enum EnvInput {
    Process { prefix: String },
    Vars { prefix: String, vars: Vec<(String, String)> },
}

/// How to open a [`Data`].
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    path: Option<PathBuf>,
    priorities: Priorities,
    init: Snapshot,
    env: Option<EnvInput>,
    defaults: Snapshot,
    pipeline: PipelineConfig,
    primitives: Primitives,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the data to a file, read as the file source and written by
    /// [`Data::sync`].
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn priorities(mut self, priorities: Priorities) -> Self {
        self.priorities = priorities;
        self
    }

    /// Explicit values, the init source.
    pub fn init(mut self, values: Snapshot) -> Self {
        self.init = values;
        self
    }

    pub fn init_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.init.insert(name.to_string(), value.into());
        self
    }

    /// Reads `{prefix}{FIELD}` from the process environment at open and
    /// reload time.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env = Some(EnvInput::Process {
            prefix: prefix.to_string(),
        });
        self
    }

    /// Uses `vars` in place of the process environment.
    pub fn env_vars<I, K, V>(mut self, prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(EnvInput::Vars {
            prefix: prefix.to_string(),
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        });
        self
    }

    /// Host-supplied defaults, the lowest ranked source.
    pub fn defaults(mut self, values: Snapshot) -> Self {
        self.defaults = values;
        self
    }

    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn primitives(mut self, primitives: Primitives) -> Self {
        self.primitives = primitives;
        self
    }

    fn sources(&self, file_values: Snapshot) -> Vec<Source> {
        let p = self.priorities;
        let mut sources = vec![Source::init(p.init, self.init.clone())];
        match &self.env {
            Some(EnvInput::Process { prefix }) => {
                sources.push(Source::from_process_env(p.env, prefix))
            }
            Some(EnvInput::Vars { prefix, vars }) => {
                let vars = vars.iter().map(|(k, v)| (k, v.clone()));
                sources.push(Source::from_env(p.env, prefix, vars))
            }
            None => {}
        }
        sources.push(Source::file(p.file, file_values));
        sources.push(Source::defaults(p.defaults, self.defaults.clone()));
        sources
    }
}

/// A schema of typed fields resolved from ranked sources and optionally
/// persisted to a file.
pub struct Data<M> {
    schema: FieldSchema,
    store: PersistentStore,
    options: OpenOptions,
    resolution: Resolution,
    _model: PhantomData<fn() -> M>,
}

impl<M: DataModel> Data<M> {
    /// Builds `M`'s schema and resolves every source into it.
    pub fn open(options: OpenOptions) -> StoreResult<Self> {
        let schema = FieldSchema::build_from_model::<M>()?;
        Self::open_with_schema(schema, options)
    }
}

impl<M> Data<M> {
    pub(crate) fn open_with_schema(schema: FieldSchema, options: OpenOptions) -> StoreResult<Self> {
        let metadata = PipelineMetadata::from_configuration(&options.pipeline)?;
        let store = PersistentStore::new(metadata, options.primitives.clone());
        let mut data = Self {
            schema,
            store,
            options,
            resolution: Resolution::default(),
            _model: PhantomData,
        };
        data.resolve()?;
        Ok(data)
    }

    fn resolve(&mut self) -> StoreResult<()> {
        let file_values = match &self.options.path {
            Some(path) if self.options.priorities.file.is_enabled() => self.store.load(path)?,
            Some(path) => {
                debug!(path = %path.display(), "File source disabled, not reading");
                Snapshot::new()
            }
            None => Snapshot::new(),
        };
        let sources = self.options.sources(file_values);
        self.resolution = SourceMerger::resolve(&mut self.schema, sources)?;
        Ok(())
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    pub fn path(&self) -> Option<&Path> {
        self.options.path.as_deref()
    }

    /// Which source decided each field on the last resolution.
    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.get(name)
    }

    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> StoreResult<T> {
        Ok(self.schema.get_as(name)?)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> StoreResult<()> {
        Ok(self.schema.set(name, value)?)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.schema.snapshot()
    }

    /// Writes the current values to the bound file.
    pub fn sync(&self) -> StoreResult<()> {
        let path = self
            .options
            .path
            .as_deref()
            .ok_or_else(|| StoreError::Config("no file bound to this data".into()))?;
        self.store.save(&self.schema, path)
    }

    /// Discards in-memory changes and resolves all sources again.
    pub fn reload(&mut self) -> StoreResult<()> {
        self.schema.reset();
        self.resolve()
    }
}

impl<M> std::fmt::Debug for Data<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("path", &self.options.path)
            .field("fields", &self.schema.snapshot())
            .finish_non_exhaustive()
    }
}
