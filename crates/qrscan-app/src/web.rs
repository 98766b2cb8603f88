//! Handlers behind the web front-end: upload an image, list history, save a
//! payload decoded client-side. Transport agnostic; they take and return the
//! JSON bodies.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use qrscan_core::{Decoder, HistoryStore, ImageScan, ScanError, load_image_bytes, scan_image};
use serde::{Deserialize, Serialize};

pub const NO_FILE: &str = "No file";
pub const NO_SYMBOL: &str = "No QR code detected";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    fn found(data: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub lines: Vec<String>,
    /// Set when the log exists but could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveScanRequest {
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveScanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct WebApi {
    history: HistoryStore,
    decoder: Arc<dyn Decoder>,
    history_limit: usize,
}

impl WebApi {
    pub fn new(history: HistoryStore, decoder: Arc<dyn Decoder>, history_limit: usize) -> Self {
        Self {
            history,
            decoder,
            history_limit,
        }
    }

    /// Decode an uploaded image; `None` when the request carried no file
    pub fn upload(&self, file: Option<&[u8]>) -> UploadResponse {
        let Some(bytes) = file else {
            return UploadResponse::failed(NO_FILE);
        };

        let frame = match load_image_bytes(bytes) {
            Ok(frame) => frame,
            Err(e) => return UploadResponse::failed(e.to_string()),
        };

        match scan_image(frame, self.decoder.clone(), &self.history) {
            Ok(ImageScan::Found(event)) => UploadResponse::found(event.payload),
            Ok(ImageScan::NotFound) => UploadResponse::failed(NO_SYMBOL),
            Err(ScanError::History { event, source }) => {
                // The client still gets its payload
                tracing::error!("upload decoded but not recorded: {source}");
                UploadResponse::found(event.payload)
            }
            Err(e) => UploadResponse::failed(e.to_string()),
        }
    }

    /// Decode an image file from disk. A file that cannot be read is an
    /// error of its own, not a request without a file.
    pub fn upload_file(&self, path: &Path) -> anyhow::Result<UploadResponse> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok(self.upload(Some(bytes.as_slice())))
    }

    /// Most recent raw history lines, newest first. A missing log is empty;
    /// an unreadable one is reported.
    pub fn history(&self) -> HistoryResponse {
        match self.history.recent_lines(self.history_limit) {
            Ok(lines) => HistoryResponse { lines, error: None },
            Err(e) => {
                tracing::error!("failed to read history: {e}");
                HistoryResponse {
                    lines: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Empty payloads are accepted and ignored
    pub fn save_scan(&self, request: SaveScanRequest) -> SaveScanResponse {
        if request.data.is_empty() {
            return SaveScanResponse {
                success: true,
                error: None,
            };
        }

        match self.history.append(&request.data) {
            Ok(_) => SaveScanResponse {
                success: true,
                error: None,
            },
            Err(e) => {
                tracing::error!("failed to save scan: {e}");
                SaveScanResponse {
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
