use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum AppEvent {
    // Front-end -> app
    StartCamera,
    StopCamera,
    ScanImage(PathBuf),
    SaveScan(String),
    ShowHistory { limit: usize },

    // App -> front-end
    ScanFound(DecodeEvent),
    NoSymbolFound,
    ScanFailed(String),
    /// Sent before `ScanFound` when the result could not be recorded
    HistoryWriteFailed(String),
    HistoryLines(Vec<String>),
    ScanStatusUpdate { status: String, scanning: bool },
    BackendReady,
}

/// Axis-aligned bounding rectangle of a symbol, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Smallest region enclosing all the given corner points
    pub fn bounding(points: &[(i32, i32)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min_x, mut min_y) = *first;
        let (mut max_x, mut max_y) = *first;
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x.abs_diff(min_x),
            height: max_y.abs_diff(min_y),
        })
    }
}

/// A single successful decode, produced once per scan session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeEvent {
    pub session_id: Uuid,
    pub payload: String,
    pub timestamp: DateTime<Local>,
    pub source_region: Option<Region>,
}

impl DecodeEvent {
    pub fn new(session_id: Uuid, payload: String, source_region: Option<Region>) -> Self {
        Self {
            session_id,
            payload,
            timestamp: Local::now(),
            source_region,
        }
    }

    /// Payloads starting with `http` are offered as links
    pub fn looks_like_link(&self) -> bool {
        looks_like_link(&self.payload)
    }
}

pub fn looks_like_link(payload: &str) -> bool {
    payload.starts_with("http")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Continuous,
    SingleShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Active,
    Found,
    Stopped,
}

impl ScanState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanState::Found | ScanState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_bounding_box() {
        let region = Region::bounding(&[(10, 40), (50, 12), (48, 60), (8, 55)]).unwrap();
        assert_eq!(
            region,
            Region {
                x: 8,
                y: 12,
                width: 42,
                height: 48
            }
        );
    }

    #[test]
    fn test_region_bounding_empty() {
        assert!(Region::bounding(&[]).is_none());
    }

    #[test]
    fn test_link_detection_is_prefix_only() {
        assert!(looks_like_link("https://example.com"));
        assert!(looks_like_link("http://a"));
        assert!(!looks_like_link("see https://example.com"));
        assert!(!looks_like_link("WIFI:S:home;;"));
    }

    #[test]
    fn test_scan_state_serializes_snake_case() {
        let json = serde_json::to_string(&ScanMode::SingleShot).unwrap();
        assert_eq!(json, "\"single_shot\"");
        assert!(ScanState::Found.is_terminal());
        assert!(!ScanState::Active.is_terminal());
    }
}
