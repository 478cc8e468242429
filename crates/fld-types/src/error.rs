//! Error types for record validation.

use thiserror::Error;

/// A field failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The name is empty or whitespace only.
    #[error("field name must not be empty")]
    EmptyName,

    /// The value is empty or whitespace only.
    #[error("value of field {name:?} must not be empty")]
    EmptyValue { name: String },

    /// The name exceeds the configured maximum length (in characters).
    #[error("field name is {len} characters long, limit is {max}")]
    NameTooLong { len: usize, max: usize },

    /// The name contains a control character.
    #[error("field name {name:?} contains control character {ch:?}")]
    NonPrintableName { name: String, ch: char },
}

/// Convenience type alias for validation results.
pub type FieldResult<T> = std::result::Result<T, FieldError>;
