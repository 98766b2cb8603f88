use qrscan_types::Region;
use serde::{Deserialize, Serialize};

use crate::{var_opt, var_or};

fn default_tick_interval_ms() -> u64 {
    30
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ScanConfig {
    /// Delay between continuous scan ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Screen region used as the continuous source, whole primary monitor if unset
    pub capture_region: Option<Region>,
}

impl ScanConfig {
    pub(crate) fn from_vars(get: &impl Fn(&str) -> Option<String>) -> Self {
        let capture_region = match (
            var_opt(get, "CAPTURE_X"),
            var_opt(get, "CAPTURE_Y"),
            var_opt(get, "CAPTURE_WIDTH"),
            var_opt(get, "CAPTURE_HEIGHT"),
        ) {
            (Some(x), Some(y), Some(width), Some(height)) => Some(Region {
                x,
                y,
                width,
                height,
            }),
            _ => None,
        };

        Self {
            tick_interval_ms: var_or(get, "TICK_INTERVAL_MS", default_tick_interval_ms()),
            capture_region,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            capture_region: None,
        }
    }
}
