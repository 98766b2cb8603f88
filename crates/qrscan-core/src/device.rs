use std::sync::{Mutex, PoisonError};

use crate::decoder::Frame;
use crate::error::DeviceError;

/// Physical frame producer behind a continuous source (camera, screen region)
pub trait CaptureDevice: Send {
    /// Stable identifier, used for process-wide exclusivity
    fn id(&self) -> &str;

    fn acquire(&mut self) -> Result<(), DeviceError>;

    /// Next frame. Errors are transient unless the device reports otherwise
    /// on the following `acquire`.
    fn read_frame(&mut self) -> Result<Frame, DeviceError>;

    fn release(&mut self);
}

impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn acquire(&mut self) -> Result<(), DeviceError> {
        (**self).acquire()
    }

    fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        (**self).read_frame()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Device behind the one continuous source allowed per process
static ACTIVE_DEVICE: Mutex<Option<String>> = Mutex::new(None);

/// Process-wide claim on the capture pipeline, released on drop.
///
/// Only one device can be leased at a time. Asking again for the leased
/// device is `Busy`; asking for any other device is `AnotherActive`.
#[derive(Debug)]
pub struct DeviceLease {
    device_id: String,
}

impl DeviceLease {
    pub fn acquire(device_id: &str) -> Result<Self, DeviceError> {
        let mut active = ACTIVE_DEVICE.lock().unwrap_or_else(PoisonError::into_inner);
        match active.as_deref() {
            Some(held) if held == device_id => {
                tracing::warn!(device_id, "capture device already leased");
                Err(DeviceError::Busy(device_id.to_string()))
            }
            Some(held) => {
                tracing::warn!(device_id, active = held, "another capture device is active");
                Err(DeviceError::AnotherActive {
                    requested: device_id.to_string(),
                    active: held.to_string(),
                })
            }
            None => {
                *active = Some(device_id.to_string());
                tracing::debug!(device_id, "capture device leased");
                Ok(Self {
                    device_id: device_id.to_string(),
                })
            }
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn is_held(device_id: &str) -> bool {
        Self::active().is_some_and(|held| held == device_id)
    }

    /// Id of the currently leased device, if any
    pub fn active() -> Option<String> {
        ACTIVE_DEVICE
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        let mut active = ACTIVE_DEVICE.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_deref() == Some(self.device_id.as_str()) {
            *active = None;
        }
        tracing::debug!(device_id = %self.device_id, "capture device lease released");
    }
}
