//! Tunable parameters for the navigation core.
//!
//! Every parameter lives here; nothing else in the crate hard-codes a gain,
//! tolerance or geometry constant. The defaults are the competition values.
//! A JSON file on the SD card can override any subset of them:
//!
//! ```text
//! {
//!     "motion": { "turn": { "kp": 2.4 }, "boomerang_lead": 0.5 },
//!     "vision": { "max_correction": 0.25 }
//! }
//! ```
//!
//! Missing sections and fields keep their default values.
//!
//! # Tuning
//!
//! Set Ki and Kd to zero and raise Kp until the robot oscillates around the
//! target. Raise Kd to damp the oscillation. Only add Ki if there is a
//! persistent steady-state error, and always give it an integral limit.

use std::{path::Path, time::Duration};

use log::{info, warn};
use serde::Deserialize;

use crate::{error::Result, motion::vision::field::FieldMap};

/// Gains and limits for one PID controller.
///
/// A limit of `0.0` disables the corresponding feature.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PidGains {
    /// Proportional gain.
    pub kp:                f64,
    /// Integral gain.
    pub ki:                f64,
    /// Derivative gain.
    pub kd:                f64,
    /// Symmetric clamp on the accumulated integral (anti-windup).
    pub integral_limit:    f64,
    /// Exponential smoothing coefficient for the derivative, in `[0, 1)`.
    pub derivative_filter: f64,
    /// Symmetric clamp on the controller output.
    pub output_limit:      f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp:                2.0,
            ki:                0.0,
            kd:                0.1,
            integral_limit:    1.0,
            derivative_filter: 0.5,
            output_limit:      12.0,
        }
    }
}

/// Motion command parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Gains for turning in place.
    pub turn:                 PidGains,
    /// Gains for the heading correction while driving to a pose.
    pub drive:                PidGains,
    /// Distance between the left and right wheels in meters.
    pub track_width:          f64,
    /// Heading tolerance for a turn, in radians.
    pub heading_tolerance:    f64,
    /// Position tolerance for drive-to-pose, in meters.
    pub position_tolerance:   f64,
    /// Time a turn must stay within tolerance before it is done.
    pub turn_settle_ms:       u64,
    /// Time a drive must stay within tolerance before it is done.
    pub drive_settle_ms:      u64,
    /// Maximum duration of a turn.
    pub turn_timeout_ms:      u64,
    /// Maximum duration of a drive.
    pub drive_timeout_ms:     u64,
    /// Cruise velocity cap in m/s.
    pub max_velocity:         f64,
    /// Acceleration limit in m/s².
    pub max_acceleration:     f64,
    /// Carrot lead factor in `[0, 1]`. Larger values produce wider arcs.
    pub boomerang_lead:       f64,
    /// Motion command loop period.
    pub loop_period_ms:       u64,
    /// Pose estimator update period.
    pub odom_period_ms:       u64,
    /// Fiducial localizer update period.
    pub vision_period_ms:     u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            turn:               PidGains::default(),
            drive:              PidGains::default(),
            track_width:        0.381,
            heading_tolerance:  0.035,
            position_tolerance: 0.02,
            turn_settle_ms:     200,
            drive_settle_ms:    200,
            turn_timeout_ms:    2000,
            drive_timeout_ms:   5000,
            max_velocity:       0.8,
            max_acceleration:   1.5,
            boomerang_lead:     0.6,
            loop_period_ms:     10,
            odom_period_ms:     10,
            vision_period_ms:   50,
        }
    }
}

impl MotionConfig {
    /// Period of the motion command loop.
    pub fn loop_period(&self) -> Duration { Duration::from_millis(self.loop_period_ms) }

    /// Period of the pose estimator background task.
    pub fn odom_period(&self) -> Duration { Duration::from_millis(self.odom_period_ms) }

    /// Period of the fiducial localizer background task.
    pub fn vision_period(&self) -> Duration { Duration::from_millis(self.vision_period_ms) }

    /// Dwell time for a turn to count as settled.
    pub fn turn_settle_time(&self) -> Duration { Duration::from_millis(self.turn_settle_ms) }

    /// Dwell time for a drive to count as settled.
    pub fn drive_settle_time(&self) -> Duration { Duration::from_millis(self.drive_settle_ms) }

    /// Turn timeout.
    pub fn turn_timeout(&self) -> Duration { Duration::from_millis(self.turn_timeout_ms) }

    /// Drive timeout.
    pub fn drive_timeout(&self) -> Duration { Duration::from_millis(self.drive_timeout_ms) }
}

/// Tracking wheel geometry.
///
/// Offsets are signed arc radii: the distance a wheel reports per radian of
/// counter-clockwise rotation about the tracking center.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct OdomConfig {
    /// Arc radius of the forward (parallel) tracking wheel, in meters.
    pub forward_wheel_offset: f64,
    /// Arc radius of the lateral (perpendicular) tracking wheel, in meters.
    pub lateral_wheel_offset: f64,
    /// Tracking wheel diameter, in meters. Both trackers share it.
    pub wheel_diameter:       f64,
}

impl Default for OdomConfig {
    fn default() -> Self {
        Self {
            forward_wheel_offset: 0.0,
            lateral_wheel_offset: -0.0635,
            wheel_diameter:       0.06985,
        }
    }
}

/// Camera optics, confidence model and fusion gains for the fiducial localizer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Physical edge length of a marker, in meters.
    pub tag_size:           f64,
    /// Focal length in pixels.
    pub focal_length_px:    f64,
    /// Image width in pixels.
    pub image_width_px:     f64,
    /// Camera yaw relative to the robot's forward axis, in radians.
    pub camera_angle:       f64,
    /// Camera position ahead of the rotation center, in meters.
    pub camera_offset_x:    f64,
    /// Camera position left of the rotation center, in meters.
    pub camera_offset_y:    f64,
    /// Detections smaller than this are too far away to trust.
    pub min_tag_pixels:     f64,
    /// Range at which confidence reaches zero, in meters.
    pub max_range:          f64,
    /// Pixel size above which the size factor saturates at 1.0.
    pub size_saturation_px: f64,
    /// Estimates below this confidence are not fused.
    pub min_confidence:     f64,
    /// Blend factor at confidence 1.0.
    pub base_alpha:         f64,
    /// Upper bound on the blend factor of a single frame.
    pub max_alpha:          f64,
    /// Corrections moving the pose farther than this (meters) are rejected.
    pub max_correction:     f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            tag_size:           0.1016,
            focal_length_px:    212.0,
            image_width_px:     320.0,
            camera_angle:       0.0,
            camera_offset_x:    0.15,
            camera_offset_y:    0.0,
            min_tag_pixels:     10.0,
            max_range:          3.0,
            size_saturation_px: 100.0,
            min_confidence:     0.1,
            base_alpha:         0.4,
            max_alpha:          0.3,
            max_correction:     0.30,
        }
    }
}

/// The complete configuration of the navigation core.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Motion command parameters.
    pub motion: MotionConfig,
    /// Tracking wheel geometry.
    pub odom:   OdomConfig,
    /// Fiducial localizer parameters.
    pub vision: VisionConfig,
    /// Known marker placements.
    pub field:  FieldMap,
}

impl NavConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`](crate::error::ConfigError::Parse) if the
    /// text is not valid configuration JSON.
    pub fn from_json(text: &str) -> Result<Self> { Ok(serde_json::from_str(text)?) }

    /// Loads a configuration file from the SD card.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the JSON file, relative to the SD card root.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error::ConfigError) if the file cannot
    /// be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Loads a configuration file, falling back to the defaults.
    ///
    /// A missing or malformed file is logged as a warning rather than
    /// stopping the robot.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = NavConfig::load_or_default("nav_config.json");
    /// ```
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using default config", e);
                Self::default()
            }
        }
    }
}
