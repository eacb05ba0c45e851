//! Raw per-channel frame data.

use crate::data::DecodeError;

/// Pixel samples of one channel at one frame.
///
/// Samples are stored row-major in raw display scale: 8-bit sources keep
/// their 0-255 values, float sources are passed through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    pixels: Vec<f32>,
}

impl RawFrame {
    /// Create a frame from row-major samples.
    ///
    /// Fails if `pixels.len()` is not `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<f32>) -> Result<Self, DecodeError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(DecodeError::new(format!(
                "frame has {} samples, expected {}x{} = {}",
                pixels.len(),
                width,
                height,
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Create a frame from rows of samples. All rows must have equal length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, DecodeError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(DecodeError::new(format!(
                "row {} has {} samples, expected {}",
                index,
                row.len(),
                width
            )));
        }

        let pixels = rows.into_iter().flatten().collect();
        Self::new(to_dimension(width)?, to_dimension(height)?, pixels)
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major sample data.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the frame has no samples.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Sample at `(x, y)`, if inside the frame.
    pub fn sample(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Convert an array extent to a frame dimension.
pub(crate) fn to_dimension(extent: usize) -> Result<u32, DecodeError> {
    u32::try_from(extent)
        .map_err(|_| DecodeError::new(format!("dimension {} exceeds u32", extent)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_sample_count() {
        assert!(RawFrame::new(2, 2, vec![0.0; 4]).is_ok());
        assert!(RawFrame::new(2, 2, vec![0.0; 3]).is_err());
    }

    #[test]
    fn test_from_rows_is_row_major() {
        let frame = RawFrame::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.pixels(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(frame.sample(0, 1), Some(4.0));
        assert_eq!(frame.sample(2, 0), Some(3.0));
        assert_eq!(frame.sample(3, 0), None);
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let err = RawFrame::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_from_rows_empty() {
        let frame = RawFrame::from_rows(Vec::new()).unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.width(), 0);
        assert_eq!(frame.height(), 0);
    }
}
