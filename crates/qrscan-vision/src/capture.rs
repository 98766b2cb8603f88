use anyhow::{Context, Result};
use image::{DynamicImage, RgbaImage};
use qrscan_core::{CaptureDevice, DeviceError, Frame};
use qrscan_types::Region;
use xcap::Monitor;

/// List all monitors with their ids and names
pub fn list_monitors() -> Result<Vec<(u32, String)>> {
    let monitors = Monitor::all().context("Failed to enumerate monitors")?;
    Ok(monitors
        .into_iter()
        .map(|m| (m.id(), m.name().to_string()))
        .collect())
}

/// Whether `region` lies fully inside the monitor rectangle. Computed in i64
/// so oversized regions from config cannot overflow.
fn contains(region: &Region, x: i32, y: i32, width: u32, height: u32) -> bool {
    let (rx, ry) = (i64::from(region.x), i64::from(region.y));
    let (mx, my) = (i64::from(x), i64::from(y));
    rx >= mx
        && ry >= my
        && rx + i64::from(region.width) <= mx + i64::from(width)
        && ry + i64::from(region.height) <= my + i64::from(height)
}

/// Continuous frames grabbed from a screen region.
///
/// Stands in for a camera on the desktop: point the region at a preview
/// window or any on-screen code.
pub struct ScreenCaptureDevice {
    id: String,
    region: Option<Region>,
    monitor_id: Option<u32>,
}

impl ScreenCaptureDevice {
    /// Capture `region`, or the whole primary monitor when `None`
    pub fn new(region: Option<Region>) -> Self {
        let id = match region {
            Some(r) => format!("screen:{},{}:{}x{}", r.x, r.y, r.width, r.height),
            None => "screen:primary".to_string(),
        };

        Self {
            id,
            region,
            monitor_id: None,
        }
    }

    fn unavailable(&self, reason: impl ToString) -> DeviceError {
        DeviceError::Unavailable(self.id.clone(), reason.to_string())
    }

    fn find_monitor(&self, monitors: Vec<Monitor>) -> Option<Monitor> {
        match self.region {
            Some(region) => {
                let mut fallback = None;
                for m in monitors {
                    if contains(&region, m.x(), m.y(), m.width(), m.height()) {
                        return Some(m);
                    }
                    fallback.get_or_insert(m);
                }
                fallback
            }
            None => {
                let mut fallback = None;
                for m in monitors {
                    if m.is_primary() {
                        return Some(m);
                    }
                    fallback.get_or_insert(m);
                }
                fallback
            }
        }
    }

    fn capture(&self, monitor_id: u32) -> Result<Frame> {
        let monitor = Monitor::all()
            .context("Failed to enumerate monitors")?
            .into_iter()
            .find(|m| m.id() == monitor_id)
            .context("Monitor disappeared")?;

        let image = monitor.capture_image().context("Failed to capture screen")?;
        let image = match self.region {
            Some(region) => xcap::image::imageops::crop_imm(
                &image,
                region.x.saturating_sub(monitor.x()).max(0) as u32,
                region.y.saturating_sub(monitor.y()).max(0) as u32,
                region.width,
                region.height,
            )
            .to_image(),
            None => image,
        };

        let (width, height) = (image.width(), image.height());
        let rgba = RgbaImage::from_raw(width, height, image.into_raw())
            .context("Captured buffer does not match its dimensions")?;
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}

impl CaptureDevice for ScreenCaptureDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn acquire(&mut self) -> Result<(), DeviceError> {
        let monitors = Monitor::all().map_err(|e| self.unavailable(e))?;
        let monitor = self
            .find_monitor(monitors)
            .ok_or_else(|| self.unavailable("no monitor found"))?;

        tracing::debug!(device_id = %self.id, monitor = monitor.name(), "screen capture acquired");
        self.monitor_id = Some(monitor.id());
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, DeviceError> {
        let monitor_id = self
            .monitor_id
            .ok_or_else(|| DeviceError::Disconnected(self.id.clone()))?;

        self.capture(monitor_id).map_err(|e| {
            tracing::debug!(device_id = %self.id, "screen capture failed: {e:#}");
            DeviceError::Disconnected(self.id.clone())
        })
    }

    fn release(&mut self) {
        self.monitor_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_ids_follow_region() {
        let whole = ScreenCaptureDevice::new(None);
        assert_eq!(whole.id(), "screen:primary");

        let region = ScreenCaptureDevice::new(Some(Region {
            x: 10,
            y: 20,
            width: 300,
            height: 200,
        }));
        assert_eq!(region.id(), "screen:10,20:300x200");
    }

    #[test]
    fn test_containment_handles_oversized_regions() {
        let region = |x, y, width, height| Region {
            x,
            y,
            width,
            height,
        };

        assert!(contains(&region(10, 10, 100, 100), 0, 0, 1920, 1080));
        assert!(!contains(&region(1900, 10, 100, 100), 0, 0, 1920, 1080));
        assert!(!contains(&region(-5, 0, 10, 10), 0, 0, 1920, 1080));
        assert!(!contains(&region(i32::MAX, 0, u32::MAX, 1), 0, 0, 1920, 1080));
        assert!(!contains(&region(0, 0, u32::MAX, u32::MAX), i32::MAX, i32::MAX, u32::MAX, u32::MAX));
    }

    #[test]
    fn test_read_before_acquire_is_transient_failure() {
        let mut device = ScreenCaptureDevice::new(None);
        assert!(matches!(device.read_frame(), Err(DeviceError::Disconnected(_))));
    }
}
