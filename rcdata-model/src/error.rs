//! Error types for the field model.

use thiserror::Error;

/// Result type for field model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while declaring fields or assigning their values.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Type, priority, or declaration misuse by the caller.
    #[error("config error: {0}")]
    Config(String),

    /// A value failed a field's type check.
    #[error("config error: field `{field}` expects {expected}, got {value}")]
    TypeMismatch {
        field: String,
        expected: crate::FieldType,
        value: serde_json::Value,
    },

    /// A source supplied a value the field rejected during resolution.
    #[error("config error: source `{source_name}` rejected by field `{field}`: {reason}")]
    Rejected {
        source_name: String,
        field: String,
        reason: String,
    },

    /// Duplicate or malformed field declarations.
    #[error("schema error: {0}")]
    Schema(String),

    /// No field with this name is declared.
    #[error("schema error: unknown field `{0}`")]
    UnknownField(String),

    /// Typed read of a field value failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    /// Returns true for the caller-error family (type and priority misuse).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::TypeMismatch { .. } | Self::Rejected { .. }
        )
    }

    /// Returns true for declaration-time schema errors.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::UnknownField(_))
    }
}
