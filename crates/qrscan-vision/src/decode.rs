use qrscan_core::{DecodeError, Decoder, Frame, Symbol};
use qrscan_types::Region;

/// QR detection backed by `rqrr`
#[derive(Debug, Clone, Copy, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    fn decode(&self, frame: &Frame) -> Result<Vec<Symbol>, DecodeError> {
        let luma = frame.to_luma8();
        if luma.width() == 0 || luma.height() == 0 {
            return Err(DecodeError::Backend("empty frame".to_string()));
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32).0[0],
        );

        let symbols = prepared
            .detect_grids()
            .into_iter()
            .filter_map(|grid| {
                let corners: Vec<(i32, i32)> = grid.bounds.iter().map(|p| (p.x, p.y)).collect();
                match grid.decode() {
                    Ok((_meta, content)) => Some(Symbol::new(content, Region::bounding(&corners))),
                    Err(e) => {
                        // Partially visible codes are common in a live feed
                        tracing::debug!("skipping undecodable grid: {e:?}");
                        None
                    }
                }
            })
            .collect();

        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, GrayImage, Luma};
    use qrcode::{Color, QrCode};

    use super::*;

    const SCALE: u32 = 8;
    const QUIET: u32 = 4;

    fn render(payload: &str, offset: u32) -> DynamicImage {
        let code = QrCode::new(payload.as_bytes()).unwrap();
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let side = (modules + QUIET * 2) * SCALE + offset;

        let mut img = GrayImage::from_pixel(side, side, Luma([255]));
        for (i, color) in colors.iter().enumerate() {
            if *color != Color::Dark {
                continue;
            }
            let mx = i as u32 % modules;
            let my = i as u32 / modules;
            for dy in 0..SCALE {
                for dx in 0..SCALE {
                    let x = offset + (mx + QUIET) * SCALE + dx;
                    let y = offset + (my + QUIET) * SCALE + dy;
                    if x < side && y < side {
                        img.put_pixel(x, y, Luma([0]));
                    }
                }
            }
        }
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_decodes_rendered_code() {
        let symbols = QrDecoder::new().decode(&render("https://example.com/qr", 0)).unwrap();

        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].payload, "https://example.com/qr");
        let region = symbols[0].region.unwrap();
        assert!(region.width > 0 && region.height > 0);
        assert!(region.x >= (QUIET * SCALE) as i32 - SCALE as i32);
    }

    #[test]
    fn test_blank_frame_has_no_symbols() {
        let blank = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255])));
        assert!(QrDecoder::new().decode(&blank).unwrap().is_empty());
    }

    #[test]
    fn test_color_frames_are_accepted() {
        let rgb = DynamicImage::ImageRgb8(render("hello", 3).to_rgb8());
        let symbols = QrDecoder::new().decode(&rgb).unwrap();
        assert_eq!(symbols.first().map(|s| s.payload.as_str()), Some("hello"));
    }

    #[test]
    fn test_empty_frame_is_an_error() {
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(QrDecoder::new().decode(&empty), Err(DecodeError::Backend(_))));
    }
}
