//! Raw frame data and the decoders that produce it.
//!
//! This module provides:
//! - `RawFrame`: one channel's pixel samples for one frame
//! - `DecoderRegistry`: picks a decoder by extension or magic bytes
//! - Built-in decoders for the JSON wire format, NumPy (.npy) files and
//!   standard images
//!
//! ## Adding New Formats
//!
//! 1. Create a decoder in `loaders/` implementing `FrameDecoder`
//! 2. Register it in `DecoderRegistry::new()`
//!
//! ```rust,ignore
//! use cellview::data::{DecodeError, FrameDecoder, RawFrame};
//!
//! pub struct MyFormatDecoder;
//!
//! impl FrameDecoder for MyFormatDecoder {
//!     fn id(&self) -> &'static str { "myformat" }
//!     fn display_name(&self) -> &'static str { "My Format" }
//!     fn extensions(&self) -> &'static [&'static str] { &["myf"] }
//!     fn can_load(&self, data: &[u8]) -> bool { /* check magic bytes */ }
//!     fn decode(&self, data: &[u8]) -> Result<RawFrame, DecodeError> { /* ... */ }
//! }
//! ```

mod frame;
mod loader;
pub mod loaders;

pub use frame::RawFrame;
pub use loader::{DecodeError, DecoderRegistry, FrameDecoder};
