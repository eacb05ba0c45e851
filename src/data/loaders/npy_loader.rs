//! Decoder for NumPy `.npy` frames.
//!
//! Exported microscopy frames are usually stored one file per channel and
//! frame, as a 2D array. Values keep their raw scale so that 8-bit data maps
//! directly onto the 0-255 display range.

use std::io::Cursor;

use ndarray::ArrayD;
use ndarray_npy::ReadNpyExt;

use crate::data::RawFrame;
use crate::data::frame::to_dimension;
use crate::data::loader::{DecodeError, FrameDecoder};

/// Decoder for NumPy `.npy` files.
///
/// **Expected array shapes** (row-major):
/// - 2D `(H, W)`
/// - 3D `(1, H, W)` or `(H, W, 1)`: a single-channel stack, squeezed to 2D
///
/// Supported data types: `f32`, `f64`, `u8`, `u16`, `i16`, `i32`.
pub struct NpyDecoder;

impl NpyDecoder {
    /// NumPy magic bytes: \x93NUMPY
    const MAGIC: &'static [u8] = &[0x93, b'N', b'U', b'M', b'P', b'Y'];

    fn array_to_frame<T>(array: ArrayD<T>) -> Result<RawFrame, DecodeError>
    where
        T: Sample + Copy,
    {
        let shape = array.shape().to_vec();
        log::trace!("NpyDecoder: array shape = {:?}", shape);

        let (height, width) = match shape.as_slice() {
            [h, w] => (*h, *w),
            [1, h, w] => (*h, *w),
            [h, w, 1] => (*h, *w),
            _ => {
                return Err(DecodeError::new(format!(
                    "unsupported array shape {:?} (expected (H, W) or a single-channel stack)",
                    shape
                )));
            }
        };

        // iter() walks in logical (row-major) order regardless of memory layout
        let pixels: Vec<f32> = array.iter().map(|&v| v.to_sample()).collect();
        RawFrame::new(to_dimension(width)?, to_dimension(height)?, pixels)
    }
}

impl FrameDecoder for NpyDecoder {
    fn id(&self) -> &'static str {
        "npy"
    }

    fn display_name(&self) -> &'static str {
        "NumPy Array (.npy)"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["npy"]
    }

    fn can_load(&self, data: &[u8]) -> bool {
        data.starts_with(Self::MAGIC)
    }

    fn decode(&self, data: &[u8]) -> Result<RawFrame, DecodeError> {
        let mut cursor = Cursor::new(data);

        // u8 first: frames exported for display are almost always 8-bit
        if let Ok(array) = ArrayD::<u8>::read_npy(&mut cursor) {
            return Self::array_to_frame(array).map_err(|e| e.with_decoder(self.id()));
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<f32>::read_npy(&mut cursor) {
            return Self::array_to_frame(array).map_err(|e| e.with_decoder(self.id()));
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<f64>::read_npy(&mut cursor) {
            return Self::array_to_frame(array).map_err(|e| e.with_decoder(self.id()));
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<u16>::read_npy(&mut cursor) {
            return Self::array_to_frame(array).map_err(|e| e.with_decoder(self.id()));
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<i16>::read_npy(&mut cursor) {
            return Self::array_to_frame(array).map_err(|e| e.with_decoder(self.id()));
        }

        cursor.set_position(0);
        if let Ok(array) = ArrayD::<i32>::read_npy(&mut cursor) {
            return Self::array_to_frame(array).map_err(|e| e.with_decoder(self.id()));
        }

        Err(
            DecodeError::new("failed to read NumPy array: unsupported dtype or invalid format")
                .with_decoder(self.id()),
        )
    }

    fn priority(&self) -> i32 {
        10
    }
}

/// Conversion of NumPy element types into raw-scale samples.
trait Sample {
    fn to_sample(self) -> f32;
}

impl Sample for f32 {
    fn to_sample(self) -> f32 {
        self
    }
}

impl Sample for f64 {
    fn to_sample(self) -> f32 {
        self as f32
    }
}

impl Sample for u8 {
    fn to_sample(self) -> f32 {
        f32::from(self)
    }
}

impl Sample for u16 {
    fn to_sample(self) -> f32 {
        f32::from(self)
    }
}

impl Sample for i16 {
    fn to_sample(self) -> f32 {
        f32::from(self)
    }
}

impl Sample for i32 {
    fn to_sample(self) -> f32 {
        self as f32
    }
}
