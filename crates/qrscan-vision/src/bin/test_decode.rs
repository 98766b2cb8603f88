//! Decode QR codes from an image file or one screen grab:
//! cargo run -p qrscan-vision --bin test_decode -- [IMAGE]

use anyhow::{Context, Result};
use qrscan_core::{CaptureDevice, Decoder, load_image_file};
use qrscan_vision::{QrDecoder, ScreenCaptureDevice, list_monitors};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("debug").init();
    tracing::info!("=== Decode Test ===");

    let frame = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!("Loading {path}");
            load_image_file(&path).with_context(|| format!("Failed to load {path}"))?
        }
        None => {
            for (id, name) in list_monitors()? {
                tracing::info!("   monitor [{id}] {name}");
            }

            let mut device = ScreenCaptureDevice::new(None);
            device.acquire()?;
            let start = std::time::Instant::now();
            let frame = device.read_frame()?;
            device.release();
            tracing::info!("Captured {}x{} in {:?}", frame.width(), frame.height(), start.elapsed());
            frame
        }
    };

    let start = std::time::Instant::now();
    let symbols = QrDecoder::new().decode(&frame)?;
    tracing::info!("Decoded {} symbol(s) in {:?}", symbols.len(), start.elapsed());
    for symbol in &symbols {
        tracing::info!("   > {:?} at {:?}", symbol.payload, symbol.region);
    }

    tracing::info!("=== Done ===");
    Ok(())
}
