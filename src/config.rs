//! Configuration file support.
//!
//! Settings are stored as JSON, by default under the platform config
//! directory. A missing file means defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_AUTO_RANGE_CUTOFF};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Directory containing one folder per project
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    /// User preferences
    #[serde(default)]
    pub preferences: ViewerPreferences,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Fraction of foreground samples cut from each end by auto range.
    /// Must lie in `[0, 0.5)`.
    #[serde(default = "default_auto_range_cutoff")]
    pub auto_range_cutoff: f64,

    /// Load every frame of every channel when a project opens
    #[serde(default = "default_preload_on_open")]
    pub preload_on_open: bool,
}

fn default_auto_range_cutoff() -> f64 {
    DEFAULT_AUTO_RANGE_CUTOFF
}

fn default_preload_on_open() -> bool {
    true
}

impl Default for ViewerPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            auto_range_cutoff: default_auto_range_cutoff(),
            preload_on_open: default_preload_on_open(),
        }
    }
}

impl ViewerPreferences {
    /// The configured cutoff, or the default if it is out of range.
    pub fn effective_auto_range_cutoff(&self) -> f64 {
        if (0.0..0.5).contains(&self.auto_range_cutoff) {
            self.auto_range_cutoff
        } else {
            log::warn!(
                "auto_range_cutoff {} outside [0, 0.5), using {}",
                self.auto_range_cutoff,
                DEFAULT_AUTO_RANGE_CUTOFF
            );
            DEFAULT_AUTO_RANGE_CUTOFF
        }
    }
}

impl ViewerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            data_root: default_data_root(),
            preferences: ViewerPreferences::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Default config file path, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join(CONFIG_DIR_NAME)
                    .join(CONFIG_FILE_NAME)
            })
        }
    }

    /// Load configuration from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file found at {:?}, using defaults", path);
            return Ok(Self::new());
        }

        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load from `path` if given, else from the default path, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::new()),
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        /// Version found in the file
        file_version: u32,
        /// Newest version this build understands
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
