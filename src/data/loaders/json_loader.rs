//! Decoder for the frame service's JSON payloads.
//!
//! The service answers a raw-frame request with the channel's pixels as a
//! JSON array of rows. A shaped object form is accepted as well, for sources
//! that store frames flat.

use serde::Deserialize;

use crate::data::loader::{DecodeError, FrameDecoder};
use crate::data::RawFrame;

/// Accepted JSON layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonFrame {
    /// `[[r0c0, r0c1, ...], [r1c0, ...], ...]`
    Rows(Vec<Vec<f32>>),
    /// `{"width": W, "height": H, "data": [...]}`
    Shaped {
        width: u32,
        height: u32,
        data: Vec<f32>,
    },
}

/// Decoder for JSON-encoded frames.
pub struct JsonDecoder;

impl FrameDecoder for JsonDecoder {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "JSON Pixel Array"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        matches!(
            data.iter().find(|b| !b.is_ascii_whitespace()),
            Some(b'[') | Some(b'{')
        )
    }

    fn decode(&self, data: &[u8]) -> Result<RawFrame, DecodeError> {
        let parsed: JsonFrame = serde_json::from_slice(data)
            .map_err(|e| DecodeError::new(format!("invalid JSON frame: {}", e)).with_decoder(self.id()))?;

        let frame = match parsed {
            JsonFrame::Rows(rows) => RawFrame::from_rows(rows),
            JsonFrame::Shaped {
                width,
                height,
                data,
            } => RawFrame::new(width, height, data),
        }
        .map_err(|e| e.with_decoder(self.id()))?;

        log::trace!(
            "JsonDecoder: decoded {}x{} frame",
            frame.width(),
            frame.height()
        );
        Ok(frame)
    }

    fn priority(&self) -> i32 {
        5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection() {
        let decoder = JsonDecoder;
        assert!(decoder.can_load(b"  [[0]]"));
        assert!(decoder.can_load(b"\n{\"width\": 1}"));
        assert!(!decoder.can_load(b"\x93NUMPY"));
        assert!(!decoder.can_load(b""));
    }

    #[test]
    fn test_decode_rows() {
        let frame = JsonDecoder.decode(b"[[0, 12, 255], [3, 4.5, 6]]").unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.pixels(), &[0.0, 12.0, 255.0, 3.0, 4.5, 6.0]);
    }

    #[test]
    fn test_decode_shaped() {
        let frame = JsonDecoder
            .decode(br#"{"width": 2, "height": 1, "data": [7, 8]}"#)
            .unwrap();
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.pixels(), &[7.0, 8.0]);
    }

    #[test]
    fn test_decode_errors_carry_decoder_id() {
        let ragged = JsonDecoder.decode(b"[[1, 2], [3]]").unwrap_err();
        assert_eq!(ragged.decoder_id, Some("json"));

        let mismatched = JsonDecoder
            .decode(br#"{"width": 2, "height": 2, "data": [1]}"#)
            .unwrap_err();
        assert_eq!(mismatched.decoder_id, Some("json"));

        assert!(JsonDecoder.decode(b"[[1, \"a\"]]").is_err());
    }
}
