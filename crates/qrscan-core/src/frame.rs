use qrscan_types::ScanMode;

use crate::decoder::Frame;
use crate::device::{CaptureDevice, DeviceLease};
use crate::error::DeviceError;

/// Where a scan session pulls its frames from.
///
/// `next_frame` returning `None` means "nothing this tick": end of stream for
/// single-shot sources, a transient miss for continuous ones.
pub trait FrameSource: Send {
    fn mode(&self) -> ScanMode;

    fn open(&mut self) -> Result<(), DeviceError>;

    fn next_frame(&mut self) -> Option<Frame>;

    /// Idempotent, also safe on a source that was never opened
    fn close(&mut self);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn mode(&self) -> ScanMode {
        (**self).mode()
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        (**self).open()
    }

    fn next_frame(&mut self) -> Option<Frame> {
        (**self).next_frame()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Polls a capture device for as long as it is open
pub struct ContinuousFrameSource<D: CaptureDevice> {
    device: D,
    lease: Option<DeviceLease>,
}

impl<D: CaptureDevice> ContinuousFrameSource<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            lease: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.lease.is_some()
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: CaptureDevice> FrameSource for ContinuousFrameSource<D> {
    fn mode(&self) -> ScanMode {
        ScanMode::Continuous
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        if self.lease.is_some() {
            return Ok(());
        }

        let lease = DeviceLease::acquire(self.device.id())?;
        // On failure the lease drops here and the device is free again
        self.device.acquire()?;
        self.lease = Some(lease);

        tracing::info!(device_id = self.device.id(), "capture device opened");
        Ok(())
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.lease.is_none() {
            return None;
        }

        match self.device.read_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                tracing::debug!(device_id = self.device.id(), "frame skipped: {e}");
                None
            }
        }
    }

    fn close(&mut self) {
        if let Some(lease) = self.lease.take() {
            self.device.release();
            drop(lease);
            tracing::info!(device_id = self.device.id(), "capture device closed");
        }
    }
}

impl<D: CaptureDevice> Drop for ContinuousFrameSource<D> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Yields one already-loaded image, then end of stream
pub struct SingleShotFrameSource {
    frame: Option<Frame>,
}

impl SingleShotFrameSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame: Some(frame) }
    }
}

impl FrameSource for SingleShotFrameSource {
    fn mode(&self) -> ScanMode {
        ScanMode::SingleShot
    }

    fn open(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.frame.take()
    }

    fn close(&mut self) {}
}
