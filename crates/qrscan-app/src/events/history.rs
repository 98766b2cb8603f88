use std::sync::Arc;

use kanal::AsyncSender;
use qrscan_types::AppEvent;

use crate::state::AppState;

/// Record a payload decoded elsewhere (e.g. in the browser)
pub async fn handle_save_scan(
    state: &Arc<AppState>,
    payload: String,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    if payload.is_empty() {
        let _ = app_to_ui_tx
            .send(AppEvent::ScanStatusUpdate {
                status: "Nothing to save".to_string(),
                scanning: false,
            })
            .await;
        return Ok(());
    }

    let history = state.history.clone();
    let result = tokio::task::spawn_blocking(move || history.append(&payload)).await?;

    let event = match result {
        Ok(_) => AppEvent::ScanStatusUpdate {
            status: "Saved".to_string(),
            scanning: false,
        },
        Err(e) => {
            tracing::error!("failed to save scan: {e}");
            AppEvent::HistoryWriteFailed(e.to_string())
        }
    };
    let _ = app_to_ui_tx.send(event).await;
    Ok(())
}

pub async fn handle_show_history(
    state: &Arc<AppState>,
    limit: usize,
    app_to_ui_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let history = state.history.clone();
    let result = tokio::task::spawn_blocking(move || history.recent_lines(limit)).await?;

    let event = match result {
        Ok(lines) => AppEvent::HistoryLines(lines),
        Err(e) => {
            tracing::error!("failed to read history: {e}");
            AppEvent::ScanFailed(e.to_string())
        }
    };
    let _ = app_to_ui_tx.send(event).await;
    Ok(())
}
