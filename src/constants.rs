//! Global constants for cellview

/// Lowest displayable intensity value.
pub const INTENSITY_MIN: i32 = 0;

/// Highest displayable intensity value.
pub const INTENSITY_MAX: i32 = 255;

/// Lower bound for brightness and contrast adjustments.
pub const ADJUSTMENT_MIN: f32 = -1.0;

/// Upper bound for brightness and contrast adjustments.
pub const ADJUSTMENT_MAX: f32 = 1.0;

/// Fraction of foreground samples cut from each end when deriving an auto range.
pub const DEFAULT_AUTO_RANGE_CUTOFF: f64 = 0.01;

/// Name of the per-project manifest file inside a project directory.
pub const PROJECT_MANIFEST_FILE: &str = "project.json";

/// Directory name used under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "cellview";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Layer color used when a project has a single channel.
pub const SINGLE_CHANNEL_COLOR: [u8; 3] = [255, 255, 255];
