use std::path::PathBuf;

use qrscan_types::DecodeEvent;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history log {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("capture device {0} is unavailable: {1}")]
    Unavailable(String, String),

    #[error("capture device {0} is already in use")]
    Busy(String),

    #[error("cannot open {requested}: capture device {active} is already active")]
    AnotherActive { requested: String, active: String },

    #[error("capture device {0} disconnected")]
    Disconnected(String),
}

/// Input could not be read as an image. "No symbol" is never an error.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unreadable image: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decoder failure: {0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The payload was found but could not be written to history
    #[error("found '{}' but could not record it: {source}", .event.payload)]
    History {
        event: Box<DecodeEvent>,
        #[source]
        source: HistoryError,
    },

    #[error("session {0} cannot be started from its current state")]
    InvalidState(uuid::Uuid),
}
