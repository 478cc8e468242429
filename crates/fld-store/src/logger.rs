//! Logging sink the store reports to.
//!
//! The store never depends on a global logger. It holds an
//! `Arc<dyn StoreLogger>` and calls it at well-defined points; with
//! [`NoopLogger`] it works the same, only silently.

use std::error::Error;

/// Severity of a store log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Leveled logging sink.
///
/// Implementations must never panic and must serialize their own output.
/// Anything that goes wrong while logging stays inside the logger.
pub trait StoreLogger: Send + Sync {
    /// Record one message, optionally with the error that caused it.
    fn log(&self, level: LogLevel, message: &str, error: Option<&dyn Error>);

    fn debug(&self, message: &str, error: Option<&dyn Error>) {
        self.log(LogLevel::Debug, message, error);
    }

    fn info(&self, message: &str, error: Option<&dyn Error>) {
        self.log(LogLevel::Info, message, error);
    }

    fn warning(&self, message: &str, error: Option<&dyn Error>) {
        self.log(LogLevel::Warning, message, error);
    }

    fn error(&self, message: &str, error: Option<&dyn Error>) {
        self.log(LogLevel::Error, message, error);
    }

    fn critical(&self, message: &str, error: Option<&dyn Error>) {
        self.log(LogLevel::Critical, message, error);
    }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl StoreLogger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str, _error: Option<&dyn Error>) {}
}

/// Forwards to `tracing`. `Critical` is emitted at `ERROR` with
/// `critical = true`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl StoreLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, error: Option<&dyn Error>) {
        match (level, error) {
            (LogLevel::Debug, None) => tracing::debug!("{message}"),
            (LogLevel::Debug, Some(e)) => tracing::debug!(error = %e, "{message}"),
            (LogLevel::Info, None) => tracing::info!("{message}"),
            (LogLevel::Info, Some(e)) => tracing::info!(error = %e, "{message}"),
            (LogLevel::Warning, None) => tracing::warn!("{message}"),
            (LogLevel::Warning, Some(e)) => tracing::warn!(error = %e, "{message}"),
            (LogLevel::Error, None) => tracing::error!("{message}"),
            (LogLevel::Error, Some(e)) => tracing::error!(error = %e, "{message}"),
            (LogLevel::Critical, None) => tracing::error!(critical = true, "{message}"),
            (LogLevel::Critical, Some(e)) => {
                tracing::error!(critical = true, error = %e, "{message}")
            }
        }
    }
}
