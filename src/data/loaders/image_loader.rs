//! Decoder for standard image formats (PNG, TIFF, JPEG, BMP, WebP).
//!
//! A raw frame holds a single channel, so color images are reduced to 8-bit
//! luma.

use crate::data::RawFrame;
use crate::data::loader::{DecodeError, FrameDecoder};

/// Decoder for standard image formats.
pub struct ImageDecoder;

impl FrameDecoder for ImageDecoder {
    fn id(&self) -> &'static str {
        "image"
    }

    fn display_name(&self) -> &'static str {
        "Standard Image (grayscale)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        if data.len() < 8 {
            return false;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return true;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return true;
        }

        // BMP: 42 4D (BM)
        if data.starts_with(&[0x42, 0x4D]) {
            return true;
        }

        // TIFF: little or big endian
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return true;
        }

        // WebP: RIFF....WEBP
        data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP"
    }

    fn decode(&self, data: &[u8]) -> Result<RawFrame, DecodeError> {
        let img = image::load_from_memory(data)
            .map_err(|e| {
                DecodeError::new(format!("failed to decode image: {}", e)).with_decoder(self.id())
            })?
            .to_luma8();

        let (width, height) = img.dimensions();
        let pixels = img.pixels().map(|p| f32::from(p[0])).collect();

        log::trace!("ImageDecoder: decoded {}x{} luma frame", width, height);

        RawFrame::new(width, height, pixels).map_err(|e| e.with_decoder(self.id()))
    }
}
