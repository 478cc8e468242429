use serde::{Deserialize, Serialize};

use fld_log::{LogConfig, SyncMode};
use fld_types::DEFAULT_MAX_NAME_LEN;

/// Configuration for a [`FieldStore`](crate::FieldStore).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// When log writes are flushed to stable storage.
    pub sync_mode: SyncMode,
    /// Longest accepted field name, in characters. Only checked on `add`;
    /// records already in the log load regardless.
    pub max_name_len: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::EveryWrite,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }
}

impl StoreConfig {
    /// Settings for the file backend.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            sync_mode: self.sync_mode,
        }
    }
}
