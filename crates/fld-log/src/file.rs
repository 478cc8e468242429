use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LogError, LogResult};
use crate::traits::{check_line, LineLog, StorageState};

/// Byte order mark written by some editors (and older versions of the file
/// format) at the start of UTF-8 files.
const BOM: char = '\u{feff}';

/// Flush/sync strategy for log writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append and rewrite (safest, highest latency).
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering (fastest, least durable).
    OsDefault,
}

/// Configuration for a [`FileLog`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Sync strategy.
    pub sync_mode: SyncMode,
}

/// Line log backed by a single UTF-8 text file.
///
/// Every call opens the file, does its work and closes it again; no handle is
/// held between calls. Appends use `O_APPEND` and write the line and its
/// terminator in one `write_all`. Rewrites go through a temporary file in the
/// same directory that is renamed over the log, so a crash mid-rewrite leaves
/// the previous content intact.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    config: LogConfig,
}

impl FileLog {
    /// Create a log handle for `path`. Nothing is touched on disk until
    /// [`LineLog::ensure_ready`] is called.
    pub fn new(path: impl Into<PathBuf>, config: LogConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn syncs(&self) -> bool {
        matches!(self.config.sync_mode, SyncMode::EveryWrite)
    }

    /// Directory holding the log; `.` for a bare file name.
    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Make a completed rename durable.
    #[cfg(unix)]
    fn sync_parent_dir(&self) -> io::Result<()> {
        File::open(self.parent_dir())?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> io::Result<()> {
        Ok(())
    }
}

/// `true` for an empty file or one whose last byte is `\n`.
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl LineLog for FileLog {
    fn ensure_ready(&self) -> LogResult<StorageState> {
        let dir = self.parent_dir();
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            debug!(dir = %dir.display(), "created log directory");
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => {
                if self.syncs() {
                    file.sync_all()?;
                    drop(file);
                    self.sync_parent_dir()?;
                }
                debug!(path = %self.path.display(), "created log file");
                Ok(StorageState::Created)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if !fs::metadata(&self.path)?.is_file() {
                    return Err(LogError::NotAFile(self.path.clone()));
                }
                Ok(StorageState::Existing)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn read_all_lines(&self) -> LogResult<Vec<String>> {
        let content = fs::read_to_string(&self.path)?;
        let content = content.strip_prefix(BOM).unwrap_or(&content);
        let lines: Vec<String> = content.lines().map(str::to_owned).collect();
        debug!(path = %self.path.display(), lines = lines.len(), "log read");
        Ok(lines)
    }

    fn append_line(&self, line: &str) -> LogResult<()> {
        check_line(0, line)?;

        // No `create`: a log deleted behind our back must not be silently
        // recreated with only the newest line in it.
        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)?;

        let mut buf = String::with_capacity(line.len() + 2);
        // A hand-edited file may end without a terminator; never glue onto it.
        if !ends_with_newline(&mut file)? {
            buf.push('\n');
        }
        buf.push_str(line);
        buf.push('\n');
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        if self.syncs() {
            file.sync_data()?;
        }

        debug!(path = %self.path.display(), len = buf.len(), "log append");
        Ok(())
    }

    fn rewrite_all(&self, lines: &[String]) -> LogResult<()> {
        for (index, line) in lines.iter().enumerate() {
            check_line(index, line)?;
        }

        let mut tmp = tempfile::Builder::new()
            .prefix(".fields-")
            .suffix(".tmp")
            .tempfile_in(self.parent_dir())?;

        // Keep the permissions of the file being replaced.
        if let Ok(meta) = fs::metadata(&self.path) {
            fs::set_permissions(tmp.path(), meta.permissions())?;
        }

        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for line in lines {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        if self.syncs() {
            tmp.as_file().sync_all()?;
        }

        tmp.persist(&self.path).map_err(|e| LogError::Io(e.error))?;
        if self.syncs() {
            self.sync_parent_dir()?;
        }

        debug!(path = %self.path.display(), lines = lines.len(), "log rewritten");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
