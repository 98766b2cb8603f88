//! Scripted backends for driving the app loop without a screen or a real decoder.

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use qrscan_config::Config;
use qrscan_core::{CaptureDevice, DecodeError, Decoder, DeviceError, Frame, Symbol};
use uuid::Uuid;

use crate::state::AppState;

fn marked_frame(marker: u8) -> Frame {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([marker, 0, 0])))
}

/// PNG bytes of a frame tagged with `marker`
pub fn marked_png(marker: u8) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    marked_frame(marker)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// Decodes a frame to the payload registered for its marker
#[derive(Default)]
pub struct ScriptedDecoder {
    script: HashMap<u8, String>,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, marker: u8, payload: &str) -> Self {
        self.script.insert(marker, payload.to_string());
        self
    }
}

impl Decoder for ScriptedDecoder {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, DecodeError> {
        let marker = frame.to_rgb8().get_pixel(0, 0).0[0];
        Ok(self
            .script
            .get(&marker)
            .map(|payload| vec![Symbol::new(payload.clone(), None)])
            .unwrap_or_default())
    }
}

/// Yields the scripted markers, then blank frames forever
pub struct ScriptedDevice {
    id: String,
    markers: VecDeque<u8>,
}

impl ScriptedDevice {
    pub fn new(markers: &[u8]) -> Self {
        Self {
            id: format!("scripted:{}", Uuid::new_v4()),
            markers: markers.iter().copied().collect(),
        }
    }
}

impl CaptureDevice for ScriptedDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn acquire(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        Ok(marked_frame(self.markers.pop_front().unwrap_or(0)))
    }

    fn release(&mut self) {}
}

/// App state over a history file in `dir`, ticking every millisecond
pub fn test_state(dir: &Path, decoder: ScriptedDecoder, markers: &[u8]) -> Arc<AppState> {
    let mut config = Config::default();
    config.history.path = dir.join("history/scans.txt");
    config.scan.tick_interval_ms = 1;

    let markers = markers.to_vec();
    Arc::new(AppState::with_backends(
        config,
        Arc::new(decoder),
        Arc::new(move || Box::new(ScriptedDevice::new(&markers)) as Box<dyn CaptureDevice>),
    ))
}
