use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::error::{LogError, LogResult};
use crate::traits::{check_line, LineLog, StorageState};

/// In-memory line log.
///
/// Intended for tests and embedding. Starts out "missing" (like a file that
/// does not exist yet) unless built with [`InMemoryLog::with_lines`]. Can be
/// switched to read-only to simulate a disk that stops accepting writes.
pub struct InMemoryLog {
    lines: RwLock<Option<Vec<String>>>,
    read_only: AtomicBool,
}

impl InMemoryLog {
    /// Create a log that does not exist yet.
    pub fn new() -> Self {
        Self {
            lines: RwLock::new(None),
            read_only: AtomicBool::new(false),
        }
    }

    /// Create a log that already holds `lines`.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: RwLock::new(Some(lines.into_iter().map(Into::into).collect())),
            read_only: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail with [`LogError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Copy of the current content; empty if the log does not exist.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .read()
            .expect("lock poisoned")
            .clone()
            .unwrap_or_default()
    }

    fn check_writable(&self) -> LogResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(LogError::ReadOnly);
        }
        Ok(())
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl LineLog for InMemoryLog {
    fn ensure_ready(&self) -> LogResult<StorageState> {
        let mut lines = self.lines.write().expect("lock poisoned");
        if lines.is_some() {
            return Ok(StorageState::Existing);
        }
        self.check_writable()?;
        *lines = Some(Vec::new());
        Ok(StorageState::Created)
    }

    fn read_all_lines(&self) -> LogResult<Vec<String>> {
        self.lines
            .read()
            .expect("lock poisoned")
            .clone()
            .ok_or(LogError::NotPrepared)
    }

    fn append_line(&self, line: &str) -> LogResult<()> {
        check_line(0, line)?;
        self.check_writable()?;
        let mut lines = self.lines.write().expect("lock poisoned");
        let lines = lines.as_mut().ok_or(LogError::NotPrepared)?;
        lines.push(line.to_string());
        Ok(())
    }

    fn rewrite_all(&self, new_lines: &[String]) -> LogResult<()> {
        for (index, line) in new_lines.iter().enumerate() {
            check_line(index, line)?;
        }
        self.check_writable()?;
        let mut lines = self.lines.write().expect("lock poisoned");
        if lines.is_none() {
            return Err(LogError::NotPrepared);
        }
        *lines = Some(new_lines.to_vec());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

impl std::fmt::Debug for InMemoryLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLog")
            .field("line_count", &self.lines().len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}
