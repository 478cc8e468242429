//! The [`LineLog`] trait defining the log storage interface.

use crate::error::{LogError, LogResult};

/// Whether [`LineLog::ensure_ready`] found existing storage or created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageState {
    /// The log was just created and is empty.
    Created,
    /// The log already existed and may hold lines.
    Existing,
}

/// Storage backend holding an ordered sequence of text lines.
///
/// Implementations must be thread-safe (`Send + Sync`). Callers that need
/// multi-step consistency (read, then rewrite) serialize access themselves;
/// a backend only guarantees that each individual call is complete.
pub trait LineLog: Send + Sync {
    /// Create the log (and anything it lives in) if missing.
    ///
    /// Idempotent. Reports whether the log already existed.
    fn ensure_ready(&self) -> LogResult<StorageState>;

    /// Read every line in order, blank lines included.
    fn read_all_lines(&self) -> LogResult<Vec<String>>;

    /// Append one line. A line terminator is added by the backend.
    fn append_line(&self, line: &str) -> LogResult<()>;

    /// Replace the whole log with `lines`, in order.
    fn rewrite_all(&self, lines: &[String]) -> LogResult<()>;

    /// Human-readable location, used in log messages.
    fn location(&self) -> String;
}

/// Reject a line that would split into several on read.
pub(crate) fn check_line(index: usize, line: &str) -> LogResult<()> {
    if line.contains(['\n', '\r']) {
        return Err(LogError::EmbeddedNewline { index });
    }
    Ok(())
}
