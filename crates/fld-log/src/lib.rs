//! Line-oriented log storage for the Field Store.
//!
//! The store keeps its records in a plain text file, one record per line.
//! This crate owns everything that touches that file: creating it, reading
//! it back, appending a line, and replacing the whole content.
//!
//! # Backends
//!
//! All backends implement the [`LineLog`] trait:
//!
//! - [`FileLog`] -- the on-disk log
//! - [`InMemoryLog`] -- `Vec`-backed log for tests and embedding
//!
//! # Design Rules
//!
//! 1. A line never contains `\n` or `\r`; writers reject such lines.
//! 2. Appends never truncate existing content.
//! 3. A rewrite replaces the file in one rename, so readers see either the
//!    old content or the new content.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{LogError, LogResult};
pub use file::{FileLog, LogConfig, SyncMode};
pub use memory::InMemoryLog;
pub use traits::{LineLog, StorageState};
