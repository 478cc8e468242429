use std::io;
use std::path::PathBuf;

/// Errors produced by log storage backends.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// I/O error while creating, reading or writing the log.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The log path exists but is not a regular file.
    #[error("log path is not a regular file: {0}")]
    NotAFile(PathBuf),

    /// A line handed to a writer contains a line terminator.
    #[error("line {index} contains an embedded line terminator")]
    EmbeddedNewline { index: usize },

    /// The backend refuses writes.
    #[error("log is read-only")]
    ReadOnly,

    /// The log was read before it was created.
    #[error("log storage has not been prepared")]
    NotPrepared,
}

impl LogError {
    /// Returns `true` for errors raised by the operating system.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Convenience alias used throughout the log crate.
pub type LogResult<T> = std::result::Result<T, LogError>;
