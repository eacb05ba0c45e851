//! Trait-based frame decoding.
//!
//! Frames reach the viewer as raw bytes, either from the frame service
//! (JSON) or from files on disk. New formats are added by implementing
//! `FrameDecoder` and registering the decoder in `DecoderRegistry`.
//!
//! ## Supported Formats
//!
//! - **JSON**: 2D arrays of numbers, the frame service wire format
//! - **NumPy Arrays**: 2D `.npy` files (or 3D with a singleton axis)
//! - **Standard Images**: PNG, TIFF, JPEG, BMP, WebP (converted to 8-bit luma)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cellview::data::DecoderRegistry;
//!
//! let registry = DecoderRegistry::new();
//! let frame = registry.decode(&bytes, Some("3.npy"))?;
//! ```

use crate::data::RawFrame;

/// Error type for decoder operations.
#[derive(Debug, Clone)]
pub struct DecodeError {
    /// Human-readable error message.
    pub message: String,
    /// The decoder that produced this error (if known).
    pub decoder_id: Option<&'static str>,
}

impl DecodeError {
    /// Create a new decode error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            decoder_id: None,
        }
    }

    /// Attach decoder context.
    pub fn with_decoder(mut self, decoder_id: &'static str) -> Self {
        self.decoder_id = Some(decoder_id);
        self
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(decoder) = self.decoder_id {
            write!(f, "[{}] {}", decoder, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for DecodeError {}

/// Trait for frame format decoders.
pub trait FrameDecoder: Send + Sync {
    /// Unique identifier for this decoder (e.g., "json", "npy", "image").
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str;

    /// File extensions this decoder handles (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Check if this decoder can likely handle the given bytes.
    ///
    /// Used for format detection when the extension is unknown.
    fn can_load(&self, data: &[u8]) -> bool;

    /// Decode raw bytes into a frame.
    fn decode(&self, data: &[u8]) -> Result<RawFrame, DecodeError>;

    /// Priority for format detection (higher = checked first).
    fn priority(&self) -> i32 {
        0
    }
}

/// Registry of available frame decoders.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn FrameDecoder>>,
}

impl DecoderRegistry {
    /// Create a registry with all built-in decoders.
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: Vec::new(),
        };

        registry.register(Box::new(super::loaders::ImageDecoder));
        registry.register(Box::new(super::loaders::JsonDecoder));
        registry.register(Box::new(super::loaders::NpyDecoder));

        registry
    }

    /// Register a decoder, keeping the list sorted by priority.
    pub fn register(&mut self, decoder: Box<dyn FrameDecoder>) {
        self.decoders.push(decoder);
        self.decoders
            .sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// All supported file extensions, sorted and deduplicated.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = self
            .decoders
            .iter()
            .flat_map(|d| d.extensions().iter().copied())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    fn decoders_for_extension(&self, ext: &str) -> impl Iterator<Item = &dyn FrameDecoder> {
        let ext_lower = ext.to_lowercase();
        self.decoders
            .iter()
            .filter(move |d| d.extensions().iter().any(|e| *e == ext_lower))
            .map(|d| d.as_ref())
    }

    fn detect_decoder(&self, data: &[u8]) -> Option<&dyn FrameDecoder> {
        self.decoders
            .iter()
            .find(|d| d.can_load(data))
            .map(|d| d.as_ref())
    }

    /// Decode bytes, auto-detecting the format.
    ///
    /// Tries decoders in this order:
    /// 1. By file extension (if filename provided)
    /// 2. By magic byte detection
    /// 3. All decoders as fallback
    pub fn decode(&self, data: &[u8], filename: Option<&str>) -> Result<RawFrame, DecodeError> {
        let extension = filename
            .and_then(|f| f.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase());

        if let Some(ext) = extension.as_deref() {
            for decoder in self.decoders_for_extension(ext) {
                match decoder.decode(data) {
                    Ok(frame) => {
                        log::trace!("Decoded with {} (by extension)", decoder.id());
                        return Ok(frame);
                    }
                    Err(e) => log::trace!("Decoder {} failed: {}", decoder.id(), e),
                }
            }
        }

        if let Some(decoder) = self.detect_decoder(data) {
            match decoder.decode(data) {
                Ok(frame) => {
                    log::trace!("Decoded with {} (by detection)", decoder.id());
                    return Ok(frame);
                }
                Err(e) => log::trace!("Detected decoder {} failed: {}", decoder.id(), e),
            }
        }

        for decoder in &self.decoders {
            if let Ok(frame) = decoder.decode(data) {
                log::debug!("Decoded with {} (fallback)", decoder.id());
                return Ok(frame);
            }
        }

        Err(DecodeError::new(format!(
            "No decoder could handle the data{}",
            filename
                .map(|f| format!(" (file: {})", f))
                .unwrap_or_default()
        )))
    }

    /// Registered decoders, highest priority first.
    pub fn decoders(&self) -> &[Box<dyn FrameDecoder>] {
        &self.decoders
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_decoders() {
        let registry = DecoderRegistry::new();
        assert_eq!(registry.decoders().len(), 3);
        // npy is the most specific format and is tried first
        assert_eq!(registry.decoders()[0].id(), "npy");
    }

    #[test]
    fn test_supported_extensions() {
        let registry = DecoderRegistry::new();
        let extensions = registry.supported_extensions();

        assert!(extensions.contains(&"png"));
        assert!(extensions.contains(&"tif"));
        assert!(extensions.contains(&"npy"));
        assert!(extensions.contains(&"json"));
    }

    #[test]
    fn test_decode_by_extension_and_detection() {
        let registry = DecoderRegistry::new();
        let bytes = b"[[1, 2], [3, 4]]";

        let by_ext = registry.decode(bytes, Some("0.json")).unwrap();
        let detected = registry.decode(bytes, None).unwrap();

        assert_eq!(by_ext, detected);
        assert_eq!(by_ext.pixels(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_decode_garbage_names_file() {
        let registry = DecoderRegistry::new();
        let err = registry.decode(b"\x00\x01garbage", Some("7.bin")).unwrap_err();
        assert!(err.to_string().contains("7.bin"));
    }
}
