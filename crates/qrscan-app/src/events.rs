use std::sync::Arc;

use kanal::{AsyncReceiver, AsyncSender};
use qrscan_types::AppEvent;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub mod history;
pub mod scan_camera;
pub mod scan_image;

use history::{handle_save_scan, handle_show_history};
use scan_camera::{handle_start_camera, handle_stop_camera};
use scan_image::handle_scan_image;

/// App's main loop
pub async fn event_loop(
    state: Arc<AppState>,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    app_to_ui_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut scans = JoinSet::new();

    let _ = app_to_ui_tx.send(AppEvent::BackendReady).await;
    tracing::info!("[EVENT_LOOP] Starting main loop, waiting for events");

    loop {
        let event = tokio::select! {
            event = ui_to_app_rx.recv() => event?,
            _ = cancel.cancelled() => break,
        };

        tracing::debug!("[EVENT_LOOP] event received: {:?}", std::mem::discriminant(&event));
        handle_events(&state, &app_to_ui_tx, &cancel, &mut scans, event).await?;
    }

    // Running scans see the same token and stop their sessions
    while let Some(result) = scans.join_next().await {
        if let Err(e) = result {
            tracing::error!("scan task panicked: {e}");
        }
    }
    tracing::info!("[EVENT_LOOP] stopped");
    Ok(())
}

async fn handle_events(
    state: &Arc<AppState>,
    app_to_ui_tx: &AsyncSender<AppEvent>,
    cancel: &CancellationToken,
    scans: &mut JoinSet<()>,
    event: AppEvent,
) -> anyhow::Result<()> {
    match event {
        AppEvent::StartCamera => {
            handle_start_camera(state, app_to_ui_tx, cancel, scans).await?;
        }
        AppEvent::StopCamera => {
            handle_stop_camera(state, app_to_ui_tx).await?;
        }
        AppEvent::ScanImage(path) => {
            handle_scan_image(state, path, app_to_ui_tx).await?;
        }
        AppEvent::SaveScan(payload) => {
            handle_save_scan(state, payload, app_to_ui_tx).await?;
        }
        AppEvent::ShowHistory { limit } => {
            handle_show_history(state, limit, app_to_ui_tx).await?;
        }
        AppEvent::ScanFound(_)
        | AppEvent::NoSymbolFound
        | AppEvent::ScanFailed(_)
        | AppEvent::HistoryWriteFailed(_)
        | AppEvent::HistoryLines(_)
        | AppEvent::ScanStatusUpdate { .. }
        | AppEvent::BackendReady => {
            // UI-only events, ignore in backend
        }
    }

    Ok(())
}
