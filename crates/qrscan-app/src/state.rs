use std::sync::{Arc, Mutex, PoisonError};

use qrscan_config::Config;
use qrscan_core::{CaptureDevice, Decoder, HistoryStore, StopHandle};
use qrscan_vision::{QrDecoder, ScreenCaptureDevice};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Builds the device behind each continuous scan
pub type DeviceFactory = Arc<dyn Fn() -> Box<dyn CaptureDevice> + Send + Sync>;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub history: HistoryStore,
    pub decoder: Arc<dyn Decoder>,
    pub device_factory: DeviceFactory,
    /// Stop handle of the running continuous scan, if any
    active_scan: Mutex<Option<StopHandle>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let region = config.scan.capture_region;
        Self::with_backends(
            config,
            Arc::new(QrDecoder::new()),
            Arc::new(move || Box::new(ScreenCaptureDevice::new(region)) as Box<dyn CaptureDevice>),
        )
    }

    pub fn with_backends(config: Config, decoder: Arc<dyn Decoder>, device_factory: DeviceFactory) -> Self {
        Self {
            history: HistoryStore::new(config.history.path.clone()),
            config: Arc::new(RwLock::new(config)),
            decoder,
            device_factory,
            active_scan: Mutex::new(None),
        }
    }

    pub fn set_active_scan(&self, handle: Option<StopHandle>) {
        *self.active_scan.lock().unwrap_or_else(PoisonError::into_inner) = handle;
    }

    pub fn take_active_scan(&self) -> Option<StopHandle> {
        self.active_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Clear the slot only if it still belongs to `session_id`
    pub fn clear_active_scan(&self, session_id: Uuid) {
        let mut active = self.active_scan.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|h| h.session_id() == session_id) {
            *active = None;
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.active_scan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
