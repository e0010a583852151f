//! Error types for Boreas.
//!
//! The control core itself never fails; degraded sensing and unmet goals are
//! reported through outcomes and log lines. Only loading configuration from
//! the SD card can produce an error.

use thiserror::Error;

/// Configuration loading error.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read (missing SD card, missing file, ...).
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file was read but is not valid configuration JSON.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
