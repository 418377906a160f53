//! Error types for the persistent store.

use std::path::PathBuf;

use rcdata_format::FormatError;
use rcdata_model::ModelError;
use rcdata_primitives::PrimitiveError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while resolving, saving, or loading data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Schema, type, or pipeline configuration misuse.
    #[error("config error: {0}")]
    Config(String),

    /// Duplicate or missing field declarations.
    #[error("schema error: {0}")]
    Schema(String),

    /// Malformed header, expansion record, or payload.
    #[error("format error: {0}")]
    Format(String),

    /// The stored digest does not match the content.
    #[error("integrity check failed ({algorithm}): expected {expected}, computed {actual}")]
    Integrity {
        algorithm: String,
        expected: String,
        actual: String,
    },

    /// Signature verification failed or could not be performed.
    #[error("security error: {0}")]
    Security(String),

    /// Filesystem failure.
    #[error("failed to {operation} {}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A named algorithm is not available from the injected primitives.
    #[error("unsupported {stage} algorithm: {name}")]
    UnsupportedAlgorithm { stage: &'static str, name: String },

    /// Payload (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }

    pub fn is_security(&self) -> bool {
        matches!(self, Self::Security(_))
    }
}

impl From<ModelError> for StoreError {
    fn from(err: ModelError) -> Self {
        if err.is_schema() {
            Self::Schema(err.to_string())
        } else {
            Self::Config(err.to_string())
        }
    }
}

impl From<FormatError> for StoreError {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::Config(msg) => Self::Config(msg),
            other => Self::Format(other.to_string()),
        }
    }
}

impl From<PrimitiveError> for StoreError {
    fn from(err: PrimitiveError) -> Self {
        match err {
            PrimitiveError::UnsupportedAlgorithm { stage, name } => {
                Self::UnsupportedAlgorithm { stage, name }
            }
            PrimitiveError::Decompression(msg) => {
                Self::Format(format!("decompression failed: {msg}"))
            }
            PrimitiveError::MalformedSignature { .. } => Self::Security(err.to_string()),
            other => Self::Config(other.to_string()),
        }
    }
}
