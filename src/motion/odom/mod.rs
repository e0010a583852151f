//! Odometry tracking for robot position estimation.
//!
//! This module provides odometry tracking using perpendicular tracking wheels
//! and an inertial sensor to estimate the robot's global position on the field.
//!
//! # Module Structure
//!
//! - **[`devices`]**: Sensor traits, vexide sensor adapters and [`Pose`].
//! - **[`tracker`]**: The [`Odometry`] tracker and its background loop.
//!
//! # How It Works
//!
//! Every tick, the tracker reads how far each tracking wheel has rolled and
//! how far the IMU has turned since the previous tick. Wheels mounted away
//! from the rotation center roll along an arc when the robot turns, so that
//! share is subtracted first. The remaining travel is rotated into the field
//! frame at the average heading of the tick and added to the pose.
//!
//! # Hardware Requirements
//!
//! - **Forward tracking wheel**: Measures forward/backward movement.
//! - **Lateral tracking wheel**: Measures sideways movement.
//! - **Inertial sensor (IMU)**: The only source of heading.
//!
//! [`Pose`]: devices::Pose
//! [`Odometry`]: tracker::Odometry

mod algorithm;

/// Tracking devices and position types.
pub mod devices;

/// Main odometry tracking controller.
pub mod tracker;
