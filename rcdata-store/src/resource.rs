//! Named resources and the index that lists them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rcdata_format::{ContentType, KeyRef, PipelineConfig};
use rcdata_model::{DataModel, Priorities, Priority, SchemaBuilder, TypedField};
use rcdata_primitives::{ED25519, Primitives, SHA256, ZSTD, sha256_hex};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::data::{Data, OpenOptions};
use crate::error::{StoreError, StoreResult};

pub const RESOURCE_EXT: &str = "resource";
pub const COMPACT_RESOURCE_EXT: &str = "cresource";
pub const INDEX_EXT: &str = "index";
pub const COMPACT_INDEX_EXT: &str = "cindex";

/// Primitives and signing choice shared by a resource index and the
/// resources it opens.
#[derive(Debug, Clone, Default)]
pub struct ResourceOptions {
    pub primitives: Primitives,
    /// Resources are signed with this key when set.
    pub signing: Option<KeyRef>,
}

impl ResourceOptions {
    pub fn signed(primitives: Primitives, key_ref: KeyRef) -> Self {
        Self {
            primitives,
            signing: Some(key_ref),
        }
    }
}

/// Whether `path` names the compacted variant of a file kind.
fn is_compact(path: &Path, plain: &str, compact: &str) -> StoreResult<bool> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == plain => Ok(false),
        Some(ext) if ext == compact => Ok(true),
        other => Err(StoreError::Config(format!(
            "{}: expected a .{plain} or .{compact} extension, found {}",
            path.display(),
            other.map_or_else(|| "none".to_string(), |e| format!(".{e}"))
        ))),
    }
}

/// A single named resource file.
///
/// Only the file is consulted; init, env, and defaults are disabled.
#[derive(Debug)]
pub struct Resource {
    data: Data<Resource>,
}

impl DataModel for Resource {
    fn declare(schema: &mut SchemaBuilder) {
        schema.field("name", TypedField::text(""));
    }
}

impl Resource {
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open_with(path, &ResourceOptions::default())
    }

    pub fn open_with(path: impl Into<PathBuf>, options: &ResourceOptions) -> StoreResult<Self> {
        let path = path.into();
        let mut pipeline = PipelineConfig::new(ContentType::Resource);
        if is_compact(&path, RESOURCE_EXT, COMPACT_RESOURCE_EXT)? {
            pipeline = pipeline.compact(ZSTD);
        }
        if let Some(key_ref) = &options.signing {
            pipeline = pipeline.encrypt(ED25519, Some(key_ref.clone()));
        }

        let data = Data::open(
            OpenOptions::new()
                .path(path)
                .priorities(Priorities::file_only())
                .pipeline(pipeline)
                .primitives(options.primitives.clone()),
        )?;
        Ok(Self { data })
    }

    /// Opens `path`, names the resource, and writes it.
    pub fn create(
        path: impl Into<PathBuf>,
        name: &str,
        options: &ResourceOptions,
    ) -> StoreResult<Self> {
        let mut resource = Self::open_with(path, options)?;
        resource.set_name(name)?;
        resource.sync()?;
        Ok(resource)
    }

    pub fn name(&self) -> &str {
        self.data.get("name").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn set_name(&mut self, name: &str) -> StoreResult<()> {
        self.data.set("name", name)
    }

    pub fn path(&self) -> Option<&Path> {
        self.data.path()
    }

    pub fn sync(&self) -> StoreResult<()> {
        self.data.sync()
    }

    pub fn data(&self) -> &Data<Resource> {
        &self.data
    }
}

/// Lists resource files and their SHA-256 hashes.
///
/// Listed files live in the directory named after the index file without
/// its extension (`assets.index` lists files under `assets/`).
#[derive(Debug)]
pub struct ResourceIndex {
    data: Data<ResourceIndex>,
    root: PathBuf,
    options: ResourceOptions,
    resources: BTreeMap<String, Resource>,
}

impl DataModel for ResourceIndex {
    fn declare(schema: &mut SchemaBuilder) {
        schema
            .field("file_list", TypedField::list(Vec::new()))
            .field("file_hash", TypedField::map(Map::new()));
    }
}

impl ResourceIndex {
    /// Opens the index at `path` and every resource it lists.
    pub fn open(path: impl Into<PathBuf>, options: ResourceOptions) -> StoreResult<Self> {
        let path = path.into();
        let mut pipeline = PipelineConfig::new(ContentType::ResourceIndex);
        if is_compact(&path, INDEX_EXT, COMPACT_INDEX_EXT)? {
            pipeline = pipeline.compact(ZSTD);
        }

        let data = Data::open(
            OpenOptions::new()
                .path(path.clone())
                .priorities(Priorities {
                    init: Priority::DISABLED,
                    env: Priority::DISABLED,
                    ..Priorities::default()
                })
                .pipeline(pipeline)
                .primitives(options.primitives.clone()),
        )?;

        let mut index = Self {
            data,
            root: path.with_extension(""),
            options,
            resources: BTreeMap::new(),
        };
        index.load_resources()?;
        Ok(index)
    }

    /// Directory the listed files are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_list(&self) -> StoreResult<Vec<String>> {
        self.data.get_as("file_list")
    }

    pub fn file_hash(&self) -> StoreResult<BTreeMap<String, String>> {
        self.data.get_as("file_hash")
    }

    /// Adds `file` to the index with the hash of its current contents.
    pub fn register(&mut self, file: &str) -> StoreResult<()> {
        let path = self.root.join(file);
        let bytes = fs::read(&path).map_err(|e| StoreError::io("read", &path, e))?;

        let mut files = self.file_list()?;
        if !files.iter().any(|f| f == file) {
            files.push(file.to_string());
        }
        let mut hashes = self.file_hash()?;
        hashes.insert(file.to_string(), sha256_hex(&bytes));

        self.data.set("file_list", serde_json::to_value(files)?)?;
        self.data.set("file_hash", serde_json::to_value(hashes)?)?;
        debug!(file, "Registered resource");
        Ok(())
    }

    /// Opens every listed resource, replacing those already loaded.
    ///
    /// Unreadable files, hash mismatches, and files that fail to decode are
    /// skipped with a warning. Returns how many resources loaded.
    pub fn load_resources(&mut self) -> StoreResult<usize> {
        let files = self.file_list()?;
        let hashes = self.file_hash()?;
        self.resources.clear();

        for file in files {
            let path = self.root.join(&file);
            match self.open_resource(&path, hashes.get(&file)) {
                Ok(resource) => {
                    self.resources.insert(file, resource);
                }
                Err(e) => warn!(file = %file, error = %e, "Skipping resource"),
            }
        }

        info!(
            root = %self.root.display(),
            loaded = self.resources.len(),
            "Loaded resources"
        );
        Ok(self.resources.len())
    }

    fn open_resource(&self, path: &Path, expected_hash: Option<&String>) -> StoreResult<Resource> {
        let bytes = fs::read(path).map_err(|e| StoreError::io("read", path, e))?;
        if let Some(expected) = expected_hash {
            let actual = sha256_hex(&bytes);
            if &actual != expected {
                return Err(StoreError::Integrity {
                    algorithm: SHA256.into(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        Resource::open_with(path, &self.options)
    }

    /// A loaded resource by its listed file name.
    pub fn get_resource(&self, file: &str) -> Option<&Resource> {
        self.resources.get(file)
    }

    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn sync(&self) -> StoreResult<()> {
        self.data.sync()
    }
}
