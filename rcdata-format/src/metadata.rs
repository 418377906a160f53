//! Pipeline metadata and its expansion record.
//!
//! The expansion record follows the fixed header and carries what the header
//! bits cannot: the format version, the content-type tag, and the name of
//! each active stage's algorithm.
//!
//! ```text
//! [version:1][tag:3][compact name?][encrypt name?][key ref?][hash name?]
//! ```
//!
//! Each name is `len:u8` followed by ASCII bytes. The key reference slot is
//! present whenever encryption is active; a zero length means no reference.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::ContentType;
use crate::error::{FormatError, FormatResult};
use crate::header::{MAX_EXPAND_LEN, MAX_PRIME, MicroCodeHeader};

/// Current metadata format version.
pub const FORMAT_VERSION: u8 = 1;

/// Bytes the expansion record always takes (version + tag).
const RECORD_BASE_LEN: usize = 4;

/// Opaque handle naming key material held by the signer.
///
/// Only the handle is persisted; keys never enter the metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRef(String);

impl KeyRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Declarative pipeline configuration as a host would write it.
///
/// Validated by [`PipelineMetadata::from_configuration`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub content_type: ContentType,
    pub compact: bool,
    pub compact_algorithm: Option<String>,
    pub encrypt: bool,
    pub encrypt_algorithm: Option<String>,
    pub key_ref: Option<KeyRef>,
    pub hash: bool,
    pub hash_algorithm: Option<String>,
    pub prime: u8,
}

impl PipelineConfig {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            ..Self::default()
        }
    }

    pub fn compact(mut self, algorithm: &str) -> Self {
        self.compact = true;
        self.compact_algorithm = Some(algorithm.into());
        self
    }

    pub fn encrypt(mut self, algorithm: &str, key_ref: Option<KeyRef>) -> Self {
        self.encrypt = true;
        self.encrypt_algorithm = Some(algorithm.into());
        self.key_ref = key_ref;
        self
    }

    pub fn hash(mut self, algorithm: &str) -> Self {
        self.hash = true;
        self.hash_algorithm = Some(algorithm.into());
        self
    }

    pub fn prime(mut self, prime: u8) -> Self {
        self.prime = prime;
        self
    }
}

/// The signing/encryption stage: algorithm plus key handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncryptStage {
    pub algorithm: String,
    pub key_ref: Option<KeyRef>,
}

/// Which transformations a file went through, and with what.
///
/// An algorithm is named exactly when its stage is active; the type makes
/// the other combinations unrepresentable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineMetadata {
    version: u8,
    content_type: ContentType,
    prime: u8,
    compact: Option<String>,
    encrypt: Option<EncryptStage>,
    hash: Option<String>,
}

impl PipelineMetadata {
    /// Metadata for a payload written without any transformation.
    pub fn plain(content_type: ContentType) -> Self {
        Self {
            version: FORMAT_VERSION,
            content_type,
            prime: 0,
            compact: None,
            encrypt: None,
            hash: None,
        }
    }

    /// Validates a configuration and builds the metadata.
    ///
    /// Fails with [`FormatError::Config`] if an algorithm is named without
    /// its flag or a flag is set without a name, if a name is empty or not
    /// printable ASCII, if `prime` exceeds 3 bits, or if the expansion
    /// record would not fit in the header's `expand_len`.
    pub fn from_configuration(config: &PipelineConfig) -> FormatResult<Self> {
        let compact = stage_name(
            "compact",
            config.compact,
            config.compact_algorithm.as_deref(),
        )?;
        let encrypt_algorithm = stage_name(
            "encrypt",
            config.encrypt,
            config.encrypt_algorithm.as_deref(),
        )?;
        let hash = stage_name("hash", config.hash, config.hash_algorithm.as_deref())?;

        let encrypt = match (encrypt_algorithm, &config.key_ref) {
            (Some(algorithm), key_ref) => {
                if let Some(key_ref) = key_ref {
                    check_name("key_ref", key_ref.as_str())?;
                }
                Some(EncryptStage {
                    algorithm,
                    key_ref: key_ref.clone(),
                })
            }
            (None, Some(_)) => {
                return Err(FormatError::Config(
                    "key_ref given but encrypt is disabled".into(),
                ));
            }
            (None, None) => None,
        };

        if config.prime > MAX_PRIME {
            return Err(FormatError::Config(format!(
                "prime {} does not fit in 3 bits",
                config.prime
            )));
        }

        let metadata = Self {
            version: FORMAT_VERSION,
            content_type: config.content_type,
            prime: config.prime,
            compact,
            encrypt,
            hash,
        };

        let len = metadata.record_len();
        if len > usize::from(MAX_EXPAND_LEN) {
            return Err(FormatError::Config(format!(
                "algorithm names need {len} expansion bytes, at most {MAX_EXPAND_LEN} fit"
            )));
        }
        Ok(metadata)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn prime(&self) -> u8 {
        self.prime
    }

    pub fn compact_algorithm(&self) -> Option<&str> {
        self.compact.as_deref()
    }

    pub fn encrypt(&self) -> Option<&EncryptStage> {
        self.encrypt.as_ref()
    }

    pub fn hash_algorithm(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// Back to the declarative form.
    pub fn to_configuration(&self) -> PipelineConfig {
        PipelineConfig {
            content_type: self.content_type,
            compact: self.compact.is_some(),
            compact_algorithm: self.compact.clone(),
            encrypt: self.encrypt.is_some(),
            encrypt_algorithm: self.encrypt.as_ref().map(|e| e.algorithm.clone()),
            key_ref: self.encrypt.as_ref().and_then(|e| e.key_ref.clone()),
            hash: self.hash.is_some(),
            hash_algorithm: self.hash.clone(),
            prime: self.prime,
        }
    }

    fn record_len(&self) -> usize {
        let name = |n: &str| 1 + n.len();
        RECORD_BASE_LEN
            + self.compact.as_deref().map_or(0, name)
            + self.encrypt.as_ref().map_or(0, |e| {
                name(&e.algorithm) + e.key_ref.as_ref().map_or(1, |k| name(k.as_str()))
            })
            + self.hash.as_deref().map_or(0, name)
    }

    /// Splits the metadata into header bits and the expansion record.
    pub fn to_header_fields(&self) -> (MicroCodeHeader, Vec<u8>) {
        let mut record = Vec::with_capacity(self.record_len());
        record.push(self.version);
        record.extend_from_slice(&self.content_type.tag());
        if let Some(name) = &self.compact {
            push_name(&mut record, name);
        }
        if let Some(stage) = &self.encrypt {
            push_name(&mut record, &stage.algorithm);
            push_name(&mut record, stage.key_ref.as_ref().map_or("", KeyRef::as_str));
        }
        if let Some(name) = &self.hash {
            push_name(&mut record, name);
        }

        // Fields were range-checked in from_configuration.
        let header = MicroCodeHeader {
            identifier: self.content_type.identifier(),
            compact: self.compact.is_some(),
            encrypt: self.encrypt.is_some(),
            prime: self.prime,
            hash: self.hash.is_some(),
            expand_len: record.len() as u8,
        };
        (header, record)
    }

    /// Rebuilds metadata from decoded header bits and the expansion bytes
    /// that followed them.
    pub fn from_header_and_trailer(header: &MicroCodeHeader, trailer: &[u8]) -> FormatResult<Self> {
        if trailer.len() != header.expand_len() {
            return Err(FormatError::ExpandLength {
                claimed: header.expand_len(),
                available: trailer.len(),
            });
        }
        if trailer.len() < RECORD_BASE_LEN {
            return Err(FormatError::Malformed(format!(
                "record of {} bytes is shorter than version and tag",
                trailer.len()
            )));
        }

        let version = trailer[0];
        if version != FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        let tag = [trailer[1], trailer[2], trailer[3]];
        let content_type = ContentType::from_tag(tag)?;
        if content_type.identifier() != header.identifier() {
            return Err(FormatError::ContentTypeMismatch {
                identifier: header.identifier(),
                tag: hex::encode(tag),
            });
        }

        let mut cursor = &trailer[RECORD_BASE_LEN..];
        let compact = match header.is_compact() {
            true => Some(read_name(&mut cursor, "compact")?),
            false => None,
        };
        let encrypt = match header.is_encrypt() {
            true => {
                let algorithm = read_name(&mut cursor, "encrypt")?;
                let key_ref = read_optional_name(&mut cursor, "key_ref")?.map(KeyRef::new);
                Some(EncryptStage { algorithm, key_ref })
            }
            false => None,
        };
        let hash = match header.is_hash() {
            true => Some(read_name(&mut cursor, "hash")?),
            false => None,
        };

        if !cursor.is_empty() {
            return Err(FormatError::Malformed(format!(
                "{} unexpected trailing bytes",
                cursor.len()
            )));
        }

        Ok(Self {
            version,
            content_type,
            prime: header.prime(),
            compact,
            encrypt,
            hash,
        })
    }
}

fn stage_name(stage: &str, active: bool, name: Option<&str>) -> FormatResult<Option<String>> {
    match (active, name) {
        (true, Some(name)) => {
            check_name(stage, name)?;
            Ok(Some(name.to_string()))
        }
        (true, None) => Err(FormatError::Config(format!(
            "{stage} is enabled but no algorithm is named"
        ))),
        (false, Some(name)) => Err(FormatError::Config(format!(
            "{stage} algorithm `{name}` given but {stage} is disabled"
        ))),
        (false, None) => Ok(None),
    }
}

fn check_name(what: &str, name: &str) -> FormatResult<()> {
    if name.is_empty() {
        return Err(FormatError::Config(format!("{what} name must not be empty")));
    }
    if !name.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(FormatError::Config(format!(
            "{what} name `{name}` must be printable ASCII"
        )));
    }
    Ok(())
}

fn push_name(record: &mut Vec<u8>, name: &str) {
    record.push(name.len() as u8);
    record.extend_from_slice(name.as_bytes());
}

fn read_optional_name(cursor: &mut &[u8], what: &str) -> FormatResult<Option<String>> {
    let (&len, rest) = cursor
        .split_first()
        .ok_or_else(|| FormatError::Malformed(format!("missing {what} length")))?;
    let len = usize::from(len);
    if rest.len() < len {
        return Err(FormatError::Malformed(format!(
            "{what} needs {len} bytes, {} left",
            rest.len()
        )));
    }
    let (bytes, rest) = rest.split_at(len);
    *cursor = rest;
    if len == 0 {
        return Ok(None);
    }
    if !bytes.iter().all(u8::is_ascii_graphic) {
        return Err(FormatError::Malformed(format!("{what} name is not printable ASCII")));
    }
    String::from_utf8(bytes.to_vec())
        .map(Some)
        .map_err(|e| FormatError::Malformed(format!("{what} name: {e}")))
}

fn read_name(cursor: &mut &[u8], what: &str) -> FormatResult<String> {
    read_optional_name(cursor, what)?
        .ok_or_else(|| FormatError::Malformed(format!("{what} name is empty")))
}
