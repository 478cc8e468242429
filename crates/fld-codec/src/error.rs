use fld_types::FieldError;
use thiserror::Error;

/// A log line could not be turned into a field (or back).
#[derive(Debug, Error)]
pub enum CodecError {
    /// The line is not a JSON record of the expected shape.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// The line parsed but the record breaks a field rule.
    #[error("invalid record: {0}")]
    Invalid(#[from] FieldError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
