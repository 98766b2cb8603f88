use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use qrscan_types::Region;

use crate::error::DecodeError;

/// A captured or loaded color image
pub type Frame = DynamicImage;

/// One decoded QR symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub payload: String,
    pub region: Option<Region>,
}

impl Symbol {
    pub fn new(payload: impl Into<String>, region: Option<Region>) -> Self {
        Self {
            payload: payload.into(),
            region,
        }
    }
}

/// Symbol detection backend.
///
/// An empty vector means the frame was readable but held no symbol.
/// `Err` is reserved for frames the backend could not process at all.
pub trait Decoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, DecodeError>;
}

impl<D: Decoder + ?Sized> Decoder for Arc<D> {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, DecodeError> {
        (**self).decode(frame)
    }
}

impl<D: Decoder + ?Sized> Decoder for &D {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, DecodeError> {
        (**self).decode(frame)
    }
}

/// Decode encoded image data (PNG, JPEG, ...) into a frame
pub fn load_image_bytes(bytes: &[u8]) -> Result<Frame, DecodeError> {
    Ok(image::load_from_memory(bytes)?)
}

pub fn load_image_file(path: impl AsRef<Path>) -> Result<Frame, DecodeError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_image_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(4, 3))
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_load_valid_png() {
        let frame = load_image_bytes(&png_bytes()).unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 3));
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        let err = load_image_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DecodeError::Image(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_image_file(dir.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        fs::write(&path, png_bytes()).unwrap();

        let frame = load_image_file(&path).unwrap();
        assert_eq!(frame.width(), 4);
    }
}
