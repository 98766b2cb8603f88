use std::path::PathBuf;
use std::sync::Arc;

use kanal::AsyncSender;
use qrscan_core::{ImageScan, ScanError, load_image_file, scan_image};
use qrscan_types::AppEvent;

use crate::state::AppState;

pub async fn handle_scan_image(
    state: &Arc<AppState>,
    path: PathBuf,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    tracing::debug!(">>> [IMAGE] Scanning {}", path.display());

    let state_clone = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        let frame = load_image_file(&path)?;
        scan_image(frame, state_clone.decoder.clone(), &state_clone.history)
    })
    .await;

    match result {
        Ok(Ok(ImageScan::Found(event))) => {
            tracing::debug!(">>> [IMAGE] Got payload: {} chars", event.payload.len());
            let _ = app_to_ui_tx.send(AppEvent::ScanFound(event)).await;
        }
        Ok(Ok(ImageScan::NotFound)) => {
            tracing::debug!(">>> [IMAGE] No symbol");
            let _ = app_to_ui_tx.send(AppEvent::NoSymbolFound).await;
        }
        Ok(Err(ScanError::History { event, source })) => {
            tracing::error!(">>> [IMAGE] Found but not recorded: {source}");
            let _ = app_to_ui_tx
                .send(AppEvent::HistoryWriteFailed(source.to_string()))
                .await;
            let _ = app_to_ui_tx.send(AppEvent::ScanFound(*event)).await;
        }
        Ok(Err(e)) => {
            tracing::error!(">>> [IMAGE] Failed: {e}");
            let _ = app_to_ui_tx.send(AppEvent::ScanFailed(e.to_string())).await;
        }
        Err(e) => {
            tracing::error!(">>> [IMAGE] Task error: {e}");
            let _ = app_to_ui_tx.send(AppEvent::ScanFailed("Error".to_string())).await;
        }
    }

    Ok(())
}
