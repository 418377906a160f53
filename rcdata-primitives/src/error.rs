//! Error types for the pipeline primitives.

use thiserror::Error;

/// Result type for primitive operations.
pub type PrimitiveResult<T> = Result<T, PrimitiveError>;

#[derive(Debug, Error)]
pub enum PrimitiveError {
    #[error("unsupported {stage} algorithm: {name}")]
    UnsupportedAlgorithm { stage: &'static str, name: String },

    #[error("compression failed: {0}")]
    Compression(String),

    #[error("decompression failed: {0}")]
    Decompression(String),

    #[error("no key registered for reference `{0}`")]
    UnknownKey(String),

    #[error("key `{0}` can only verify, not sign")]
    VerifyOnly(String),

    #[error("a key reference is required")]
    MissingKeyRef,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("malformed signature: expected {expected} bytes, got {actual}")]
    MalformedSignature { expected: usize, actual: usize },
}

impl PrimitiveError {
    pub(crate) fn unsupported(stage: &'static str, name: &str) -> Self {
        Self::UnsupportedAlgorithm {
            stage,
            name: name.to_string(),
        }
    }
}
