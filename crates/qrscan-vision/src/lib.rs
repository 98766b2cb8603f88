mod capture;
mod decode;

pub use capture::{ScreenCaptureDevice, list_monitors};
pub use decode::QrDecoder;
