use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use qrscan_config::Config;
use qrscan_types::AppEvent;
use tokio::signal;

use crate::console::ConsoleOptions;
use crate::controller::AppController;
use crate::state::AppState;
use crate::web::WebApi;

mod console;
mod controller;
mod events;
mod logging;
mod state;
mod web;

#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(name = "qrscan")]
#[command(about = "Scan QR codes from the screen or image files and keep a history")]
struct Cli {
    /// JSON config file; environment variables are used when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the history file location
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a single image file
    Image {
        path: PathBuf,
        #[arg(long)]
        copy: bool,
        #[arg(long)]
        open: bool,
    },
    /// Poll the capture device until a code is found (Ctrl+C stops)
    Watch {
        #[arg(long)]
        copy: bool,
        #[arg(long)]
        open: bool,
        /// Tick interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Print the most recent history lines, newest first
    History {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Record a payload decoded elsewhere
    Save { payload: String },
    /// Run the upload handler on a file and print its JSON response
    Upload { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    logging::init_tracing(json_logs);

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };
    if let Some(history) = cli.history {
        config.history.path = history;
    }
    if let Command::Watch {
        interval_ms: Some(ms),
        ..
    } = cli.command
    {
        config.scan.tick_interval_ms = ms;
    }

    let ui = config.ui.clone();
    let history_limit = config.history.limit;
    let state = Arc::new(AppState::new(config));

    let (command, options) = match cli.command {
        Command::Upload { path } => {
            let api = WebApi::new(state.history.clone(), state.decoder.clone(), history_limit);
            let response = tokio::task::spawn_blocking(move || api.upload_file(&path)).await??;
            println!("{}", serde_json::to_string(&response)?);
            return Ok(());
        }
        Command::Image { path, copy, open } => (
            AppEvent::ScanImage(path),
            ConsoleOptions {
                copy: copy || ui.auto_copy,
                open: open || ui.open_links,
                json: false,
            },
        ),
        Command::Watch { copy, open, .. } => (
            AppEvent::StartCamera,
            ConsoleOptions {
                copy: copy || ui.auto_copy,
                open: open || ui.open_links,
                json: false,
            },
        ),
        Command::History { limit, json } => (
            AppEvent::ShowHistory {
                limit: limit.unwrap_or(history_limit),
            },
            ConsoleOptions {
                json,
                ..ConsoleOptions::default()
            },
        ),
        Command::Save { payload } => (AppEvent::SaveScan(payload), ConsoleOptions::default()),
    };

    let controller = AppController::new(state);
    let mut tasks = controller.spawn_tasks();
    let (app_to_ui_rx, ui_to_app_tx) = controller.ui_handle();

    let outcome = tokio::select! {
        result = console::run(command, app_to_ui_rx, ui_to_app_tx, options) => result,
        _ = signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
            Ok(())
        }
    };

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task exited with error: {e:#}"),
            Err(e) => tracing::error!("task panicked: {e}"),
        }
    }

    outcome
}
