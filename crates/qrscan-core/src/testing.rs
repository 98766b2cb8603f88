//! Scripted devices and decoders shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{DynamicImage, Rgb, RgbImage};

use crate::decoder::{Decoder, Frame, Symbol};
use crate::device::CaptureDevice;
use crate::error::{DecodeError, DeviceError};

/// Marker value that makes `ScriptedDecoder` fail instead of decoding
pub const UNREADABLE: u8 = 255;

/// Tiny frame tagged with `marker` in its first pixel
pub fn marked_frame(marker: u8) -> Frame {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([marker, 0, 0])))
}

pub fn blank_frame() -> Frame {
    marked_frame(0)
}

#[derive(Default)]
pub struct DeviceCounters {
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
    pub reads: AtomicUsize,
}

pub struct MockDevice {
    id: String,
    frames: VecDeque<Result<Frame, DeviceError>>,
    unavailable: bool,
    counters: Arc<DeviceCounters>,
}

impl MockDevice {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            frames: VecDeque::new(),
            unavailable: false,
            counters: Arc::default(),
        }
    }

    pub fn with_frames(mut self, count: usize) -> Self {
        self.frames.extend((0..count).map(|_| Ok(blank_frame())));
        self
    }

    pub fn with_markers(mut self, markers: &[u8]) -> Self {
        self.frames.extend(markers.iter().map(|&m| Ok(marked_frame(m))));
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.frames.push_back(Err(DeviceError::Disconnected(self.id.clone())));
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn counters(&self) -> Arc<DeviceCounters> {
        self.counters.clone()
    }
}

impl CaptureDevice for MockDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn acquire(&mut self) -> Result<(), DeviceError> {
        if self.unavailable {
            return Err(DeviceError::Unavailable(self.id.clone(), "no such device".into()));
        }
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        self.frames
            .pop_front()
            .unwrap_or_else(|| Err(DeviceError::Disconnected(self.id.clone())))
    }

    fn release(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Maps frame markers to canned decode results
#[derive(Default)]
pub struct ScriptedDecoder {
    script: HashMap<u8, Vec<Symbol>>,
    calls: AtomicUsize,
}

impl ScriptedDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, marker: u8, payloads: &[&str]) -> Self {
        self.script.insert(
            marker,
            payloads.iter().map(|p| Symbol::new(*p, None)).collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Decoder for ScriptedDecoder {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let marker = frame.to_rgb8().get_pixel(0, 0).0[0];
        if marker == UNREADABLE {
            return Err(DecodeError::Backend("scripted failure".into()));
        }
        Ok(self.script.get(&marker).cloned().unwrap_or_default())
    }
}
