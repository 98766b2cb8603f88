use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::history::HistoryConfig;
use self::scan::ScanConfig;
use self::ui::UiConfig;

pub mod history;
pub mod scan;
pub mod ui;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub scan: ScanConfig,
    pub ui: UiConfig,
}

impl Config {
    /// Build the config from environment variables, falling back to defaults
    pub fn new() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load a JSON config file. Missing sections and fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub(crate) fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        Config {
            history: HistoryConfig::from_vars(&get),
            scan: ScanConfig::from_vars(&get),
            ui: UiConfig::from_vars(&get),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(|_| None)
    }
}

/// Parse `key` from the lookup, ignoring values that fail to parse
pub(crate) fn var_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

pub(crate) fn var_opt<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|v| v.trim().parse().ok())
}
