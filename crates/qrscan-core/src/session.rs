use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use qrscan_types::{DecodeEvent, ScanMode, ScanState};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::decoder::{Decoder, Frame};
use crate::error::ScanError;
use crate::frame::{FrameSource, SingleShotFrameSource};
use crate::history::HistoryStore;

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Still scanning, nothing found on this frame
    Pending,
    /// This tick found a symbol; the session is now `Found`
    Found(DecodeEvent),
    /// The session is not active (not started, finished or stopped)
    Inactive(ScanState),
}

/// Outcome of scanning a single still image
#[derive(Debug, Clone, PartialEq)]
pub enum ImageScan {
    Found(DecodeEvent),
    NotFound,
}

struct Inner<S> {
    state: ScanState,
    source: S,
    last_frame: Option<Frame>,
}

struct Shared<S> {
    id: Uuid,
    inner: Mutex<Inner<S>>,
    cancel: CancellationToken,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

trait Stop: Send + Sync {
    fn stop(&self);
    fn is_stopping(&self) -> bool;
}

impl<S: FrameSource> Stop for Shared<S> {
    fn stop(&self) {
        // Raised before taking the lock so an in-flight tick bails out
        self.cancel.cancel();

        let mut inner = self.lock();
        match inner.state {
            ScanState::Idle | ScanState::Active => {
                inner.state = ScanState::Stopped;
                inner.source.close();
                tracing::info!(session_id = %self.id, "scan session stopped");
            }
            ScanState::Found | ScanState::Stopped => {}
        }
    }

    fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Stops a session from another task or thread
#[derive(Clone)]
pub struct StopHandle {
    session_id: Uuid,
    shared: Arc<dyn Stop>,
}

impl StopHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Returns once no further decode or history write can happen for the session
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn is_stopping(&self) -> bool {
        self.shared.is_stopping()
    }
}

/// One scan attempt: `Idle -> Active -> Found | Stopped`.
///
/// The first decoded symbol wins. It is appended to history once, the source
/// is closed and no further frames are pulled. Ticks are driven by the caller.
pub struct ScanSession<S: FrameSource, D: Decoder> {
    shared: Arc<Shared<S>>,
    mode: ScanMode,
    decoder: D,
    history: HistoryStore,
}

impl<S: FrameSource + 'static, D: Decoder> ScanSession<S, D> {
    pub fn new(source: S, decoder: D, history: HistoryStore) -> Self {
        let mode = source.mode();
        Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                inner: Mutex::new(Inner {
                    state: ScanState::Idle,
                    source,
                    last_frame: None,
                }),
                cancel: CancellationToken::new(),
            }),
            mode,
            decoder,
            history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn state(&self) -> ScanState {
        self.shared.lock().state
    }

    /// Last frame handed to the decoder, for preview rendering
    pub fn last_frame(&self) -> Option<Frame> {
        self.shared.lock().last_frame.clone()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            session_id: self.shared.id,
            shared: self.shared.clone(),
        }
    }

    /// Open the source and begin scanning. The session stays `Idle` if the
    /// source cannot be opened.
    pub fn start(&self) -> Result<(), ScanError> {
        let mut inner = self.shared.lock();
        if inner.state != ScanState::Idle {
            return Err(ScanError::InvalidState(self.shared.id));
        }

        inner.source.open()?;
        inner.state = ScanState::Active;
        tracing::info!(session_id = %self.shared.id, mode = ?self.mode, "scan session started");
        Ok(())
    }

    /// Pull one frame and try to decode it
    pub fn tick(&self) -> Result<TickOutcome, ScanError> {
        let mut inner = self.shared.lock();
        if inner.state != ScanState::Active {
            return Ok(TickOutcome::Inactive(inner.state));
        }
        if self.cancelled() {
            return Ok(TickOutcome::Inactive(ScanState::Stopped));
        }

        let frame = inner.source.next_frame();
        if self.cancelled() {
            return Ok(TickOutcome::Inactive(ScanState::Stopped));
        }

        let Some(frame) = frame else {
            if self.mode == ScanMode::SingleShot {
                self.finish(&mut inner, ScanState::Stopped);
                return Ok(TickOutcome::Inactive(ScanState::Stopped));
            }
            return Ok(TickOutcome::Pending);
        };

        let decoded = self.decoder.decode(&frame);
        inner.last_frame = Some(frame);
        if self.cancelled() {
            return Ok(TickOutcome::Inactive(ScanState::Stopped));
        }

        let symbols = match decoded {
            Ok(symbols) => symbols,
            Err(e) => {
                tracing::warn!(session_id = %self.shared.id, "frame could not be decoded: {e}");
                if self.mode == ScanMode::SingleShot {
                    self.finish(&mut inner, ScanState::Stopped);
                }
                return Err(e.into());
            }
        };

        let Some(symbol) = symbols.into_iter().next() else {
            if self.mode == ScanMode::SingleShot {
                // The only frame is spent
                self.finish(&mut inner, ScanState::Stopped);
                return Ok(TickOutcome::Inactive(ScanState::Stopped));
            }
            return Ok(TickOutcome::Pending);
        };

        let event = DecodeEvent::new(self.shared.id, symbol.payload, symbol.region);
        self.finish(&mut inner, ScanState::Found);
        tracing::info!(
            session_id = %self.shared.id,
            payload_len = event.payload.len(),
            "symbol found"
        );

        if let Err(source) = self.history.append(&event.payload) {
            tracing::error!(session_id = %self.shared.id, "failed to record scan: {source}");
            return Err(ScanError::History {
                event: Box::new(event),
                source,
            });
        }

        Ok(TickOutcome::Found(event))
    }

    /// Cancel the session. Waits for an in-flight tick, which will discard its frame.
    pub fn stop(&self) {
        self.shared.stop();
    }

    fn cancelled(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    fn finish(&self, inner: &mut Inner<S>, state: ScanState) {
        inner.state = state;
        inner.source.close();
    }
}

/// Run a single-shot session over `frame` to completion
pub fn scan_image<D: Decoder>(
    frame: Frame,
    decoder: D,
    history: &HistoryStore,
) -> Result<ImageScan, ScanError> {
    let session = ScanSession::new(SingleShotFrameSource::new(frame), decoder, history.clone());
    session.start()?;

    loop {
        match session.tick()? {
            TickOutcome::Pending => continue,
            TickOutcome::Found(event) => return Ok(ImageScan::Found(event)),
            TickOutcome::Inactive(_) => return Ok(ImageScan::NotFound),
        }
    }
}
