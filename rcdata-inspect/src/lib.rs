//! Reports on rcdata files for the `rcdata-inspect` binary.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rcdata_format::{KeyRef, MicroCodeHeader, PipelineMetadata, decode_preamble};
use rcdata_primitives::{Ed25519Keyring, Primitives, VerifyingKey};
use rcdata_store::PersistentStore;
use serde::Serialize;
use serde_json::{Map, Value};

/// Key ref used for a public key given without one in the file.
pub const DEFAULT_KEY_REF: &str = "default";

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HeaderReport {
    pub header_hex: String,
    pub identifier: u8,
    pub expand_len: usize,
    pub version: u8,
    pub content_type: String,
    pub prime: u8,
    pub compact: Option<String>,
    pub encrypt: Option<String>,
    pub key_ref: Option<String>,
    pub hash: Option<String>,
    pub payload_len: usize,
}

impl HeaderReport {
    fn new(header: &MicroCodeHeader, metadata: &PipelineMetadata, payload_len: usize) -> Self {
        Self {
            header_hex: hex::encode(header.encode()),
            identifier: header.identifier(),
            expand_len: header.expand_len(),
            version: metadata.version(),
            content_type: metadata.content_type().to_string(),
            prime: metadata.prime(),
            compact: metadata.compact_algorithm().map(str::to_string),
            encrypt: metadata.encrypt().map(|e| e.algorithm.clone()),
            key_ref: metadata
                .encrypt()
                .and_then(|e| e.key_ref.as_ref())
                .map(|k| k.to_string()),
            hash: metadata.hash_algorithm().map(str::to_string),
            payload_len,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DumpReport {
    pub header: HeaderReport,
    pub fields: Map<String, Value>,
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Decodes the header and expansion record of `path`.
pub fn inspect_header(path: &Path) -> Result<HeaderReport> {
    let bytes = read(path)?;
    let header = MicroCodeHeader::decode(&bytes).context("invalid header")?;
    let (metadata, payload) = decode_preamble(&bytes).context("invalid expansion record")?;
    Ok(HeaderReport::new(&header, &metadata, payload.len()))
}

/// Decodes `path` fully, verifying a signature against `public_key` (hex)
/// when the file is signed.
pub fn dump(path: &Path, public_key: Option<&str>) -> Result<DumpReport> {
    let bytes = read(path)?;
    let header = MicroCodeHeader::decode(&bytes).context("invalid header")?;
    let (metadata, payload) = decode_preamble(&bytes).context("invalid expansion record")?;
    let report = HeaderReport::new(&header, &metadata, payload.len());

    let primitives = primitives_for(&metadata, public_key)?;
    let store = PersistentStore::new(metadata, primitives);
    let loaded = store
        .decode(&bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    Ok(DumpReport {
        header: report,
        fields: loaded.fields,
    })
}

fn primitives_for(metadata: &PipelineMetadata, public_key: Option<&str>) -> Result<Primitives> {
    let Some(stage) = metadata.encrypt() else {
        return Ok(Primitives::standard());
    };
    let Some(public_key) = public_key else {
        bail!("file is signed with {}; pass --public-key to verify it", stage.algorithm);
    };
    let key = VerifyingKey::from_hex(public_key).context("invalid public key")?;
    let key_ref = stage
        .key_ref
        .clone()
        .unwrap_or_else(|| KeyRef::new(DEFAULT_KEY_REF));
    Ok(Primitives::with_keyring(
        Ed25519Keyring::new().with_verifying_key(key_ref, key),
    ))
}
