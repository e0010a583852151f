//! File-based logger for navigation telemetry.
//!
//! This module implements the [`log`] crate's logging facade. Every record
//! is printed to the console and appended to `nav_log.txt` on the SD card,
//! so a run can be reviewed after the robot is back in the pits.
//!
//! # Usage
//!
//! Initialize the logger once at the start of your program:
//!
//! ```ignore
//! use boreas::fs::logger;
//! use log::LevelFilter;
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     logger::init(LevelFilter::Debug).expect("Logger init failed");
//! }
//! ```
//!
//! # Log Output
//!
//! ```text
//! INFO [12s 40ms] boreas::motion::chassis - drive_to_pose (1.000, 0.000, 0.000)
//! WARN [12s 860ms] boreas::motion::vision::localizer - Vision correction rejected: 0.412 m >= max 0.300 m
//! INFO [14s 230ms] boreas::motion::chassis - drive_to_pose settled in 2.19s at (0.998, 0.001, 0.000)
//! ```

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    sync::{Mutex, OnceLock},
    time::Duration,
};

use humantime::{FormattedDuration, format_duration};
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use vexide::time::user_uptime;

/// Name of the log file in the SD card root.
pub const LOG_FILE: &str = "nav_log.txt";

/// A dual-output logger.
///
/// The file is truncated when the logger is created. Without an SD card only
/// the console receives output.
pub struct NavLogger {
    file_writer: Mutex<Option<BufWriter<File>>>,
}

impl NavLogger {
    fn new() -> Self {
        let file_writer = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(LOG_FILE)
            .ok()
            .map(BufWriter::new);

        Self {
            file_writer: Mutex::new(file_writer),
        }
    }
}

impl log::Log for NavLogger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(record, get_time());
        print!("{}", line);

        if let Ok(mut guard) = self.file_writer.lock() {
            if let Some(writer) = guard.as_mut() {
                let _ = writer.write_all(line.as_bytes());
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.file_writer.lock() {
            if let Some(writer) = guard.as_mut() {
                let _ = writer.flush();
            }
        }
    }
}

static LOGGER: OnceLock<NavLogger> = OnceLock::new();

/// Installs the logger.
///
/// Call once before any logging macros are used.
///
/// # Arguments
///
/// * `level` - The most verbose level to record. [`LevelFilter::Debug`]
///   includes every vision correction; [`LevelFilter::Trace`] also includes
///   each discarded detection.
///
/// # Errors
///
/// Returns [`SetLoggerError`] if a logger has already been set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.get_or_init(NavLogger::new);
    log::set_logger(logger).map(|()| log::set_max_level(level))
}

fn format_line(record: &Record, time: FormattedDuration) -> String {
    format!("{} [{}] {} - {}\n", record.level(), time, record.target(), record.args())
}

/// Time since the user program started.
///
/// Off the brain (host tests) there is no uptime, so a fixed placeholder is
/// used.
fn get_time() -> FormattedDuration {
    let uptime = if cfg!(target_os = "vexos") {
        user_uptime()
    } else {
        Duration::from_millis(123_432)
    };
    format_duration(uptime)
}
