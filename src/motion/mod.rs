//! Autonomous motion control.
//!
//! This module provides tools for precise robot movement during autonomous
//! periods. It includes:
//!
//! - **Odometry**: Position tracking using tracking wheels and an inertial sensor.
//! - **Vision**: Bounded absolute corrections from field markers.
//! - **PID Control**: A general-purpose PID controller.
//! - **Motion Profile**: A trapezoidal velocity envelope.
//! - **Commands**: Turn-to-heading and Boomerang drive-to-pose.
//!
//! # Architecture
//!
//! Odometry (about 100 Hz) and the vision localizer (about 20 Hz) run as
//! independent background tasks sharing one pose. Motion commands run in the
//! foreground: awaiting one blocks the autonomous routine until it settles or
//! times out, while the background tasks keep the pose current.
//!
//! # Example
//!
//! ```ignore
//! use boreas::motion::{chassis::Chassis, odom::devices::Pose};
//!
//! odom.spawn(config.motion.odom_period());
//! vision.spawn(camera, config.motion.vision_period());
//!
//! let mut chassis = Chassis::new(drivetrain, odom, BrainClock, config.motion);
//! chassis.turn_to_heading(std::f64::consts::FRAC_PI_2).await;
//! chassis.drive_to_pose(Pose::new(1.0, 0.5, 0.0), false).await;
//! ```

/// Motion command runner.
///
/// Provides [`Chassis`](chassis::Chassis), which owns the drivetrain and runs
/// one command at a time.
pub mod chassis;

/// Motion commands as polled state machines.
pub mod command;

/// Odometry tracking for position estimation.
///
/// Provides the [`Odometry`](odom::tracker::Odometry) struct for tracking
/// the robot's global position using tracking wheels and an inertial sensor.
pub mod odom;

/// PID control.
pub mod pid;

/// Trapezoidal velocity planning.
pub mod profile;

/// Fiducial marker localization.
pub mod vision;

pub use command::normalize_angle;
pub use odom::devices::Pose;
