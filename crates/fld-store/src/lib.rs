//! Durable field store for named key/value/comment records.
//!
//! A [`FieldStore`] keeps an ordered in-memory copy of every record and a
//! log file on disk that can rebuild it. Records are appended to the log as
//! they are added; removals rewrite the whole file.
//!
//! # Lifecycle
//!
//! Opening a store is non-blocking: it spawns initialization (create the
//! directory and file if needed, load and decode every line) and returns a
//! handle immediately. Until initialization resolves, every operation fails
//! with [`StoreError::NotReady`]. Callers that want to wait use
//! [`FieldStore::await_ready`].
//!
//! # Guarantees
//!
//! 1. Names are unique, compared case-insensitively.
//! 2. Memory is only changed after the log write it depends on succeeded.
//! 3. All mutations go through one lock; no two writes interleave.
//! 4. A mutation that has started runs to completion even if the caller
//!    stops waiting for it.
//! 5. Corrupt log lines are skipped and reported, never fatal.

pub mod config;
pub mod error;
pub mod gate;
pub mod logger;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use gate::{Readiness, ReadinessGate};
pub use logger::{LogLevel, NoopLogger, StoreLogger, TracingLogger};
pub use store::{FieldStore, LoadReport};

pub use fld_log::{FileLog, InMemoryLog, LineLog, SyncMode};
pub use fld_types::Field;
