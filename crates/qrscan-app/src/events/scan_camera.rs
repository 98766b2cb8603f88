use std::sync::Arc;
use std::time::Duration;

use kanal::AsyncSender;
use qrscan_core::{CaptureDevice, ContinuousFrameSource, Decoder, ScanError, ScanSession, TickOutcome};
use qrscan_types::AppEvent;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

type CameraSession = ScanSession<ContinuousFrameSource<Box<dyn CaptureDevice>>, Arc<dyn Decoder>>;

pub async fn handle_start_camera(
    state: &Arc<AppState>,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    cancel: &CancellationToken,
    scans: &mut JoinSet<()>,
) -> anyhow::Result<()> {
    // Don't start again if already running
    if state.is_scanning() {
        let _ = app_to_ui_tx
            .send(AppEvent::ScanStatusUpdate {
                status: "Already scanning".to_string(),
                scanning: true,
            })
            .await;
        return Ok(());
    }

    let tick_interval = {
        let config = state.config.read().await;
        Duration::from_millis(config.scan.tick_interval_ms.max(1))
    };

    let session: Arc<CameraSession> = Arc::new(ScanSession::new(
        ContinuousFrameSource::new((state.device_factory)()),
        state.decoder.clone(),
        state.history.clone(),
    ));

    let started = {
        let session = session.clone();
        tokio::task::spawn_blocking(move || session.start()).await?
    };
    if let Err(e) = started {
        tracing::error!(">>> [SCAN] Failed to start camera: {e}");
        let _ = app_to_ui_tx.send(AppEvent::ScanFailed(e.to_string())).await;
        return Ok(());
    }

    state.set_active_scan(Some(session.stop_handle()));
    let _ = app_to_ui_tx
        .send(AppEvent::ScanStatusUpdate {
            status: "Scanning".to_string(),
            scanning: true,
        })
        .await;

    scans.spawn(tick_loop(
        state.clone(),
        session,
        tick_interval,
        app_to_ui_tx.clone(),
        cancel.child_token(),
    ));
    Ok(())
}

pub async fn handle_stop_camera(
    state: &Arc<AppState>,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    match state.take_active_scan() {
        Some(handle) => {
            // Blocks until an in-flight tick is done; the tick loop reports the stop
            tokio::task::spawn_blocking(move || handle.stop()).await?;
        }
        None => {
            let _ = app_to_ui_tx
                .send(AppEvent::ScanStatusUpdate {
                    status: "Not scanning".to_string(),
                    scanning: false,
                })
                .await;
        }
    }
    Ok(())
}

/// Drives one continuous session until it finds something or is stopped
async fn tick_loop(
    state: Arc<AppState>,
    session: Arc<CameraSession>,
    tick_interval: Duration,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures = 0u64;

    let status = loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => {
                let session = session.clone();
                let _ = tokio::task::spawn_blocking(move || session.stop()).await;
                break "Stopped";
            }
        }

        let result = {
            let session = session.clone();
            tokio::task::spawn_blocking(move || session.tick()).await
        };

        match result {
            Ok(Ok(TickOutcome::Pending)) => {}
            Ok(Ok(TickOutcome::Found(event))) => {
                tracing::info!(">>> [SCAN] Found {} chars", event.payload.len());
                let _ = app_to_ui_tx.send(AppEvent::ScanFound(event)).await;
                break "Found";
            }
            Ok(Ok(TickOutcome::Inactive(scan_state))) => {
                tracing::debug!(">>> [SCAN] Session inactive: {scan_state:?}");
                break "Stopped";
            }
            Ok(Err(ScanError::History { event, source })) => {
                let _ = app_to_ui_tx
                    .send(AppEvent::HistoryWriteFailed(source.to_string()))
                    .await;
                let _ = app_to_ui_tx.send(AppEvent::ScanFound(*event)).await;
                break "Found";
            }
            Ok(Err(e)) => {
                // Continuous mode polls again on the next tick
                failures += 1;
                tracing::debug!(">>> [SCAN] Tick failed ({failures} so far): {e}");
            }
            Err(e) => {
                tracing::error!(">>> [SCAN] Tick task error: {e}");
                let session = session.clone();
                let _ = tokio::task::spawn_blocking(move || session.stop()).await;
                let _ = app_to_ui_tx.send(AppEvent::ScanFailed(e.to_string())).await;
                break "Error";
            }
        }
    };

    state.clear_active_scan(session.id());

    let _ = app_to_ui_tx
        .send(AppEvent::ScanStatusUpdate {
            status: status.to_string(),
            scanning: false,
        })
        .await;
}
