use anyhow::Context;
use arboard::Clipboard;

/// Put a scanned payload on the system clipboard
pub fn copy_to_clipboard(text: &str) -> Result<(), anyhow::Error> {
    let mut clipboard = Clipboard::new().context("Failed to open clipboard")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to write clipboard")?;

    tracing::debug!("copied {} chars to clipboard", text.chars().count());
    Ok(())
}
