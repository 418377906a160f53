//! Error types for the header and metadata codec.

use thiserror::Error;

/// Result type for format operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while building or decoding pipeline metadata.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The pipeline configuration is inconsistent (caller bug).
    #[error("config error: {0}")]
    Config(String),

    /// Fewer bytes than the fixed header width.
    #[error("truncated header: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// `expand_len` points past the end of the buffer.
    #[error("expand length {claimed} exceeds the {available} bytes available")]
    ExpandLength { claimed: usize, available: usize },

    /// Header bits violate a format invariant.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The expansion record carries an unknown format version.
    #[error("unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u8, supported: u8 },

    /// The content-type tag is not one this reader knows.
    #[error("unknown content type tag {0}")]
    UnknownContentType(String),

    /// The expansion record's tag disagrees with the header identifier.
    #[error("content type mismatch: header identifier {identifier:#x}, record tag {tag}")]
    ContentTypeMismatch { identifier: u8, tag: String },

    /// The expansion record could not be parsed.
    #[error("malformed expansion record: {0}")]
    Malformed(String),
}

impl FormatError {
    /// Returns true if the error comes from configuration rather than from
    /// bytes read off disk.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
