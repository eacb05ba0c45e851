//! Built-in frame decoders.

mod image_loader;
mod json_loader;
mod npy_loader;

pub use image_loader::ImageDecoder;
pub use json_loader::JsonDecoder;
pub use npy_loader::NpyDecoder;
