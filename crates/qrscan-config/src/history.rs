use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::var_or;

fn default_path() -> PathBuf {
    PathBuf::from("history/scans.txt")
}

fn default_limit() -> usize {
    30
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    /// Append-only scan log
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// How many lines the history views return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl HistoryConfig {
    pub(crate) fn from_vars(get: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            path: get("HISTORY_PATH").map(PathBuf::from).unwrap_or_else(default_path),
            limit: var_or(get, "HISTORY_LIMIT", default_limit()),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            limit: default_limit(),
        }
    }
}
