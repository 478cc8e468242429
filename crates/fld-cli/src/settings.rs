use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use fld_store::StoreConfig;

/// Log file used when neither `--file` nor the settings file names one.
pub const DEFAULT_FILE: &str = "fields.jsonl";

/// Contents of the optional TOML settings file.
///
/// ```toml
/// path = "/var/lib/fielder/fields.jsonl"
///
/// [store]
/// sync_mode = "every_write"
/// max_name_len = 100
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub path: Option<PathBuf>,
    pub store: StoreConfig,
}

impl Settings {
    /// Read settings from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing settings in {}", path.display()))
    }

    /// The log path: command line first, then settings, then the default.
    pub fn log_path(&self, cli_override: Option<PathBuf>) -> PathBuf {
        cli_override
            .or_else(|| self.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE))
    }
}
