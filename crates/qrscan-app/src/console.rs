//! Terminal front-end. Sends one command to the app loop and renders what
//! comes back on stdout.

use anyhow::bail;
use kanal::{AsyncReceiver, AsyncSender};
use qrscan_types::{AppEvent, DecodeEvent};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOptions {
    pub copy: bool,
    pub open: bool,
    pub json: bool,
}

/// Drive a single command to completion
pub async fn run(
    command: AppEvent,
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    ui_to_app_tx: AsyncSender<AppEvent>,
    options: ConsoleOptions,
) -> anyhow::Result<()> {
    let saving = matches!(command, AppEvent::SaveScan(_));
    ui_to_app_tx.send(command).await?;

    loop {
        match app_to_ui_rx.recv().await? {
            AppEvent::ScanFound(event) => {
                present(&event, options).await?;
                return Ok(());
            }
            AppEvent::NoSymbolFound => bail!("No QR code detected"),
            AppEvent::ScanFailed(reason) => bail!("scan failed: {reason}"),
            AppEvent::HistoryWriteFailed(reason) => {
                if saving {
                    bail!("could not save: {reason}");
                }
                tracing::warn!("scan not recorded in history: {reason}");
            }
            AppEvent::HistoryLines(lines) => {
                if options.json {
                    println!("{}", serde_json::json!({ "lines": lines }));
                } else {
                    for line in lines {
                        println!("{line}");
                    }
                }
                return Ok(());
            }
            AppEvent::ScanStatusUpdate { status, scanning } => {
                tracing::info!(status = %status, scanning, "status");
                if !scanning {
                    return Ok(());
                }
            }
            AppEvent::BackendReady => {
                tracing::debug!("backend ready");
            }
            AppEvent::StartCamera
            | AppEvent::StopCamera
            | AppEvent::ScanImage(_)
            | AppEvent::SaveScan(_)
            | AppEvent::ShowHistory { .. } => {
                // Commands only travel the other way
            }
        }
    }
}

async fn present(event: &DecodeEvent, options: ConsoleOptions) -> anyhow::Result<()> {
    if options.json {
        println!("{}", serde_json::to_string(event)?);
    } else {
        println!("{}", event.payload);
    }

    if options.copy {
        let payload = event.payload.clone();
        match tokio::task::spawn_blocking(move || qrscan_io::clipboard::copy_to_clipboard(&payload))
            .await?
        {
            Ok(()) => tracing::info!("Copied to clipboard"),
            Err(e) => tracing::warn!("clipboard unavailable: {e:#}"),
        }
    }

    if options.open && event.looks_like_link() {
        if let Err(e) = qrscan_io::browser::open_link(&event.payload) {
            tracing::warn!("could not open link: {e:#}");
        }
    }

    Ok(())
}
