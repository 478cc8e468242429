use fld_codec::CodecError;
use fld_log::LogError;
use fld_types::FieldError;
use thiserror::Error;

use crate::gate::Readiness;

/// Errors returned by [`FieldStore`](crate::FieldStore) operations.
///
/// Every variant is a distinct failure kind so callers can choose between
/// retrying, prompting the user and giving up.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is still initializing, or initialization failed.
    #[error("field store is not ready ({0})")]
    NotReady(Readiness),

    /// Initialization hit a fatal I/O error. Only `reload` can recover.
    #[error("field store initialization failed: {0}")]
    InitFailed(String),

    /// The field breaks a validation rule.
    #[error("invalid field: {0}")]
    Validation(#[from] FieldError),

    /// A field with the same name (ignoring case) already exists.
    #[error("field already exists: {name}")]
    DuplicateName { name: String },

    /// No field with this exact name exists.
    #[error("field not found: {name}")]
    NotFound { name: String },

    /// Reading or writing the log failed.
    #[error("log error: {0}")]
    Io(#[from] LogError),

    /// A field could not be encoded for the log.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A store task panicked before finishing.
    #[error("store task failed: {0}")]
    Task(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
