//! Filesystem utilities for the V5 Brain.
//!
//! # Logging
//!
//! The `logger` submodule provides a file-based logger that writes to
//! `nav_log.txt` on the SD card. Every component of the navigation core
//! reports through the [`log`] facade, so installing this logger is all it
//! takes to capture sensor dropouts, vision corrections and motion outcomes.
//!
//! # Example
//!
//! ```ignore
//! use boreas::fs::logger;
//! use log::{info, LevelFilter};
//!
//! // Initialize the logger at program start
//! logger::init(LevelFilter::Debug).expect("Failed to initialize logger");
//!
//! info!("Robot initialized successfully");
//! ```

/// File-based logging for the V5 Brain.
///
/// Provides a logger implementation that writes to both the console
/// and a file on the SD card.
pub mod logger;
