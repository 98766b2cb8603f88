use anyhow::{Context, bail};
use qrscan_types::looks_like_link;

/// Open a payload in the default browser. Only link-looking payloads are
/// opened, and they are handed to the OS launcher directly, never to a shell.
pub fn open_link(payload: &str) -> Result<(), anyhow::Error> {
    check_link(payload)?;

    open::that_detached(payload).context("Failed to launch browser")?;

    tracing::info!("opened link in browser");
    Ok(())
}

fn check_link(payload: &str) -> Result<(), anyhow::Error> {
    if !looks_like_link(payload) {
        bail!("payload is not a link");
    }
    if payload.chars().any(|c| c.is_control() || c.is_whitespace()) {
        bail!("link contains whitespace or control characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_refused() {
        let err = open_link("just some text").unwrap_err();
        assert!(err.to_string().contains("not a link"));
    }

    #[test]
    fn test_control_characters_are_refused() {
        for payload in ["http://x\r\ncalc", "http://x\0", "http://x\tcalc", "http://x calc"] {
            let err = open_link(payload).unwrap_err();
            assert!(err.to_string().contains("control characters"), "{payload:?}");
        }
    }

    #[test]
    fn test_plain_links_pass_the_check() {
        assert!(check_link("https://example.com/a?b=1&c=2").is_ok());
    }
}
