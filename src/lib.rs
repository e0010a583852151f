//! # Boreas
//!
//! Boreas is the closed-loop navigation core of a VEX V5 robot, built on top of
//! [Vexide](https://vexide.dev). It keeps a field-frame pose estimate up to date
//! and drives the robot to commanded headings and poses, giving up on any
//! command that runs past its timeout:
//!
//! - **Pose Estimation**: Two perpendicular tracking wheels plus an inertial
//!   sensor, with arc compensation for off-center wheels.
//! - **Fiducial Localization**: Back-solves the robot position from visual
//!   marker detections and blends it into the estimate with a bounded,
//!   confidence-weighted correction.
//! - **Control**: A PID controller with anti-windup, derivative filtering and
//!   output clamping, plus a trapezoidal velocity planner.
//! - **Motion Commands**: Turn-to-heading and a Boomerang (carrot point)
//!   drive-to-pose controller, each a polled state machine.
//! - **Logging**: A file-based logger for debugging and telemetry.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::rc::Rc;
//! use boreas::{
//!     config::NavConfig,
//!     motion::{Pose, chassis::{BrainClock, Chassis}, odom::tracker::Odometry},
//! };
//! use vexide::prelude::*;
//!
//! #[vexide::main]
//! async fn main(peripherals: Peripherals) {
//!     let config = NavConfig::load_or_default("nav_config.json");
//!     let odom = Rc::new(Odometry::new(forward, lateral, imu, config.odom));
//!     odom.spawn(config.motion.odom_period());
//!
//!     let mut chassis = Chassis::new(drivetrain, odom.clone(), BrainClock, config.motion);
//!     chassis.drive_to_pose(Pose::new(1.0, 0.5, 0.0), false).await;
//! }
//! ```
//!
//! ## Modules
//!
//! - [`motion`]: Pose estimation, localization, control and motion commands.
//! - [`drivetrain`]: Differential drivetrain output.
//! - [`config`]: Tunable parameters and SD card loading.
//! - [`fs`]: Filesystem utilities including logging.

/// Configuration for every tunable parameter of the navigation core.
///
/// Contains gains, tolerances, timeouts, tracking wheel geometry, vision
/// fusion parameters and the static field marker map. Values can be loaded
/// from a JSON file on the SD card.
pub mod config;

/// Differential drivetrain output.
///
/// Provides the [`Differential`](drivetrain::Differential) struct which
/// applies left/right voltage commands to two motor groups.
pub mod drivetrain;

/// Error types for the fallible edges of the crate.
pub mod error;

/// Filesystem utilities module.
///
/// Contains logging functionality for recording robot telemetry and debug
/// information to files on the V5 Brain's SD card.
pub mod fs;

/// Autonomous motion control module.
///
/// Provides the estimation and control stack used during the autonomous
/// period:
///
/// - **Odometry**: Pose tracking using tracking wheels and an inertial sensor.
/// - **Vision**: Absolute position corrections from field markers.
/// - **PID / Profile**: Control primitives.
/// - **Commands**: Turn-to-heading and drive-to-pose.
pub mod motion;
