//! Reading and writing rcdata files.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use rcdata_format::{ContentType, PipelineMetadata, decode_preamble, encode_preamble};
use rcdata_model::{FieldSchema, Snapshot};
use rcdata_primitives::Primitives;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::pipeline;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    content_type: ContentType,
    fields: &'a Snapshot,
}

#[derive(Deserialize)]
struct Envelope {
    content_type: ContentType,
    fields: Snapshot,
}

/// A decoded file: the metadata its header declared plus its field values.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub metadata: PipelineMetadata,
    pub fields: Snapshot,
}

/// Persists field snapshots through the compact, sign, and hash pipeline.
///
/// The store's own metadata governs writes only. Reads take their metadata
/// from the file header.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    metadata: PipelineMetadata,
    primitives: Primitives,
}

impl PersistentStore {
    pub fn new(metadata: PipelineMetadata, primitives: Primitives) -> Self {
        Self {
            metadata,
            primitives,
        }
    }

    pub fn metadata(&self) -> &PipelineMetadata {
        &self.metadata
    }

    pub fn primitives(&self) -> &Primitives {
        &self.primitives
    }

    /// Encodes `schema`'s values into the full on-disk byte layout.
    pub fn encode(&self, schema: &FieldSchema) -> StoreResult<Vec<u8>> {
        let fields = schema.snapshot();
        let payload = serde_json::to_vec(&EnvelopeRef {
            content_type: self.metadata.content_type(),
            fields: &fields,
        })?;
        let body = pipeline::seal(payload, &self.metadata, &self.primitives)?;

        let mut out = encode_preamble(&self.metadata);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decodes bytes produced by [`encode`](Self::encode).
    pub fn decode(&self, bytes: &[u8]) -> StoreResult<Loaded> {
        let (metadata, body) = decode_preamble(bytes)?;
        let payload = pipeline::unseal(body, &metadata, &self.primitives)?;
        let envelope: Envelope = serde_json::from_slice(&payload)
            .map_err(|e| StoreError::Format(format!("invalid payload: {e}")))?;
        if envelope.content_type != metadata.content_type() {
            return Err(StoreError::Format(format!(
                "header declares {} but payload holds {}",
                metadata.content_type(),
                envelope.content_type
            )));
        }
        Ok(Loaded {
            metadata,
            fields: envelope.fields,
        })
    }

    /// Writes `schema` to `path` atomically.
    ///
    /// The bytes go to `<path>.tmp` first, are synced, then renamed over
    /// `path`. Missing parent directories are created.
    pub fn save(&self, schema: &FieldSchema, path: &Path) -> StoreResult<()> {
        let bytes = self.encode(schema)?;
        let temp_path = temp_path_for(path)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::io("create directory", parent, e))?;
        }

        let written = write_synced(&temp_path, &bytes).and_then(|()| {
            fs::rename(&temp_path, path).map_err(|e| StoreError::io("rename", path, e))
        });
        discard_on_error(&temp_path, written)?;

        info!(
            path = %path.display(),
            content_type = %self.metadata.content_type(),
            bytes = bytes.len(),
            "Saved data"
        );
        Ok(())
    }

    /// Reads the field values stored at `path`.
    ///
    /// A missing file yields an empty map. A file whose header declares a
    /// different content type than this store is a format error.
    pub fn load(&self, path: &Path) -> StoreResult<Snapshot> {
        let Some(loaded) = self.load_with_metadata(path)? else {
            debug!(path = %path.display(), "No file, starting empty");
            return Ok(Snapshot::new());
        };
        if loaded.metadata.content_type() != self.metadata.content_type() {
            return Err(StoreError::Format(format!(
                "{} holds {}, expected {}",
                path.display(),
                loaded.metadata.content_type(),
                self.metadata.content_type()
            )));
        }
        Ok(loaded.fields)
    }

    /// Reads and decodes `path` whatever its content type. `None` if missing.
    pub fn load_with_metadata(&self, path: &Path) -> StoreResult<Option<Loaded>> {
        let Some(bytes) = read_if_exists(path)? else {
            return Ok(None);
        };
        let loaded = self.decode(&bytes)?;
        info!(
            path = %path.display(),
            content_type = %loaded.metadata.content_type(),
            fields = loaded.fields.len(),
            "Loaded data"
        );
        Ok(Some(loaded))
    }

    /// Reads only the header and expansion record of `path`.
    pub fn load_metadata(path: &Path) -> StoreResult<Option<PipelineMetadata>> {
        let Some(bytes) = read_if_exists(path)? else {
            return Ok(None);
        };
        let (metadata, _) = decode_preamble(&bytes)?;
        Ok(Some(metadata))
    }
}

fn read_if_exists(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io("read", path, e)),
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let mut file = File::create(path).map_err(|e| StoreError::io("create", path, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io("write", path, e))?;
    file.sync_all().map_err(|e| StoreError::io("sync", path, e))
}

// Leaves no partial temp file behind when any step of the write failed.
fn discard_on_error<T>(temp_path: &Path, result: StoreResult<T>) -> StoreResult<T> {
    if result.is_err() {
        let _ = fs::remove_file(temp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> StoreResult<PathBuf> {
    let mut name = path
        .file_name()
        .ok_or_else(|| StoreError::Config(format!("{} has no file name", path.display())))?
        .to_os_string();
    name.push(".tmp");
    Ok(path.with_file_name(name))
}
