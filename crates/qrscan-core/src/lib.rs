pub mod decoder;
pub mod device;
pub mod error;
pub mod frame;
pub mod history;
pub mod session;

#[cfg(test)]
mod testing;

pub use decoder::{Decoder, Frame, Symbol, load_image_bytes, load_image_file};
pub use device::{CaptureDevice, DeviceLease};
pub use error::{DecodeError, DeviceError, HistoryError, ScanError};
pub use frame::{ContinuousFrameSource, FrameSource, SingleShotFrameSource};
pub use history::{HistoryRecord, HistoryStore};
pub use session::{ImageScan, ScanSession, StopHandle, TickOutcome, scan_image};
