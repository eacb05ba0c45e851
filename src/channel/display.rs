//! Display adjustments of a single channel.

use crate::constants::{ADJUSTMENT_MAX, ADJUSTMENT_MIN, INTENSITY_MAX, INTENSITY_MIN};

/// Window of raw intensities mapped onto the display range.
///
/// Always ordered (`lo <= hi`) and within 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntensityRange {
    lo: u8,
    hi: u8,
}

impl IntensityRange {
    /// The whole 0-255 range.
    pub const FULL: Self = Self { lo: 0, hi: 255 };

    /// Build a range, clamping each bound to 0-255.
    ///
    /// Bounds given in the wrong order are swapped.
    pub fn clamped(lo: i32, hi: i32) -> Self {
        let lo = clamp_intensity(lo);
        let hi = clamp_intensity(hi);
        if lo <= hi {
            Self { lo, hi }
        } else {
            Self { lo: hi, hi: lo }
        }
    }

    /// Lower bound.
    pub fn lo(&self) -> u8 {
        self.lo
    }

    /// Upper bound.
    pub fn hi(&self) -> u8 {
        self.hi
    }

    /// Bounds as a `(lo, hi)` pair.
    pub fn as_tuple(&self) -> (u8, u8) {
        (self.lo, self.hi)
    }
}

impl Default for IntensityRange {
    fn default() -> Self {
        Self::FULL
    }
}

fn clamp_intensity(value: i32) -> u8 {
    // lossless after the clamp
    value.clamp(INTENSITY_MIN, INTENSITY_MAX) as u8
}

fn clamp_adjustment(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(ADJUSTMENT_MIN, ADJUSTMENT_MAX)
}

/// Grayscale display settings of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplaySettings {
    invert: bool,
    range: IntensityRange,
    brightness: f32,
    contrast: f32,
}

impl DisplaySettings {
    /// Whether the channel is shown inverted.
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Current intensity window.
    pub fn range(&self) -> IntensityRange {
        self.range
    }

    /// Brightness offset in `[-1, 1]`.
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Contrast adjustment in `[-1, 1]`.
    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    /// Flip inversion.
    pub fn toggle_invert(&mut self) {
        self.invert = !self.invert;
    }

    /// Set the intensity window, clamped to 0-255.
    pub fn set_range(&mut self, lo: i32, hi: i32) {
        self.range = IntensityRange::clamped(lo, hi);
    }

    /// Set brightness, clamped to `[-1, 1]`. NaN resets to 0.
    pub fn set_brightness(&mut self, brightness: f32) {
        self.brightness = clamp_adjustment(brightness);
    }

    /// Set contrast, clamped to `[-1, 1]`. NaN resets to 0.
    pub fn set_contrast(&mut self, contrast: f32) {
        self.contrast = clamp_adjustment(contrast);
    }

    /// Restore the full range and neutral brightness/contrast.
    ///
    /// Inversion is left as is.
    pub fn reset(&mut self) {
        self.range = IntensityRange::FULL;
        self.brightness = 0.0;
        self.contrast = 0.0;
    }
}
