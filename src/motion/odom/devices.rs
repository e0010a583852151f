//! Tracking devices and position types for odometry.
//!
//! This module provides the sensor boundary used by the odometry tracking
//! system. It includes:
//!
//! - **TrackingWheel / YawSensor**: The traits odometry reads through. Any
//!   device (or a simulated one in tests) can sit behind them.
//! - **TrackingSensor**: An abstraction over the encoder types a tracking
//!   wheel can use.
//! - **Tracker**: A tracking wheel with its diameter and gear ratio.
//! - **Pose**: A 2D position with heading.
//!
//! # Example
//!
//! ```ignore
//! use boreas::motion::odom::devices::{TrackingSensor, Tracker};
//! use vexide::prelude::*;
//!
//! // Create a tracking sensor from a rotation sensor
//! let sensor = TrackingSensor::RotationSensor(
//!     RotationSensor::new(peripherals.port_5, Direction::Forward)
//! );
//!
//! // 2.75" (0.06985 m) wheel, 1:1 gear ratio
//! let tracker = Tracker::new(sensor, 0.06985, 1.0, 1.0);
//! ```

use vexide::{
    adi::encoder::AdiOpticalEncoder,
    math::Angle,
    smart::{imu::InertialSensor, rotation::RotationSensor},
};

/// A source of cumulative tracking wheel travel.
pub trait TrackingWheel {
    /// Total distance the wheel has rolled, in meters.
    ///
    /// Forward and left are positive. Returns `None` when the device cannot
    /// be read this tick.
    fn distance(&self) -> Option<f64>;
}

/// A source of cumulative robot yaw.
pub trait YawSensor {
    /// Total counter-clockwise rotation since calibration, in radians.
    ///
    /// The value is unbounded, not wrapped to one turn. Returns `None` when
    /// the device cannot be read this tick.
    fn cumulative_rotation(&self) -> Option<f64>;
}

/// An abstraction over different encoder types used for tracking.
///
/// # Variants
///
/// - `AdiOpticalEncoder`: A 3-wire optical shaft encoder.
/// - `RotationSensor`: A V5 rotation sensor (high resolution).
pub enum TrackingSensor {
    /// An ADI (3-wire) optical shaft encoder.
    AdiOpticalEncoder(AdiOpticalEncoder),
    /// A V5 rotation sensor (high-resolution encoder).
    RotationSensor(RotationSensor),
}

impl TrackingSensor {
    /// Returns the current rotational position of the sensor, or `None` if
    /// the device reported an error.
    pub fn position(&self) -> Option<Angle> {
        match self {
            TrackingSensor::AdiOpticalEncoder(encoder) => encoder.position().ok(),
            TrackingSensor::RotationSensor(encoder) => encoder.position().ok(),
        }
    }
}

/// A tracking wheel.
///
/// A tracking wheel is an unpowered wheel with an encoder used to measure
/// how far the robot has traveled. This struct combines the sensor with
/// physical wheel properties and gear ratios.
///
/// # Example
///
/// ```ignore
/// use boreas::motion::odom::devices::{TrackingSensor, Tracker};
/// use vexide::prelude::*;
///
/// let sensor = TrackingSensor::AdiOpticalEncoder(
///     AdiOpticalEncoder::new(peripherals.adi_a, peripherals.adi_b)
/// );
///
/// // 0.06985 m wheel, 36-tooth wheel gear driven by a 12-tooth encoder gear
/// let tracker = Tracker::new(sensor, 0.06985, 36.0, 12.0);
/// ```
pub struct Tracker {
    /// The sensor measuring wheel rotation.
    pub sensor:         TrackingSensor,
    /// The diameter of the tracking wheel in meters.
    pub wheel_diameter: f64,
    /// The number of teeth on the driven (wheel-side) gear.
    pub driven_gear:    f64,
    /// The number of teeth on the driving (encoder-side) gear.
    pub driving_gear:   f64,
}

impl Tracker {
    /// Creates a new Tracker.
    ///
    /// # Arguments
    ///
    /// * `sensor` - The tracking sensor to use.
    /// * `wheel_diameter` - The diameter of the tracking wheel in meters.
    /// * `driven_gear` - The number of teeth on the driven (wheel-side) gear.
    /// * `driving_gear` - The number of teeth on the driving (encoder-side) gear.
    pub fn new(
        sensor: TrackingSensor,
        wheel_diameter: f64,
        driven_gear: f64,
        driving_gear: f64,
    ) -> Self {
        Self {
            sensor,
            wheel_diameter,
            driven_gear,
            driving_gear,
        }
    }

    /// Converts a sensor angle into wheel travel in meters.
    pub fn angle_to_distance(&self, angle: Angle) -> f64 {
        let gear_ratio = self.driving_gear / self.driven_gear;
        angle.as_radians() * gear_ratio * (self.wheel_diameter / 2.0)
    }
}

impl TrackingWheel for Tracker {
    fn distance(&self) -> Option<f64> {
        self.sensor.position().map(|angle| self.angle_to_distance(angle))
    }
}

impl YawSensor for InertialSensor {
    // The IMU reports clockwise-positive rotation.
    fn cumulative_rotation(&self) -> Option<f64> {
        self.rotation().ok().map(|angle| -angle.as_radians())
    }
}

/// A 2D position with heading.
///
/// Represents the robot's position on the field frame: `x` forward at the
/// start of the run, `y` to the left. `theta` is counter-clockwise positive
/// and is not wrapped, so it keeps counting past a full turn.
///
/// # Example
///
/// ```ignore
/// use boreas::motion::odom::devices::Pose;
///
/// // Start at origin facing forward
/// let pose = Pose::origin();
///
/// // Create a custom pose facing left
/// let pose = Pose::new(0.6, 0.3, std::f64::consts::FRAC_PI_2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    /// The x-coordinate in meters.
    pub x:     f64,
    /// The y-coordinate in meters.
    pub y:     f64,
    /// The heading in radians.
    pub theta: f64,
}

impl Pose {
    /// Creates a new Pose with the specified position and heading.
    ///
    /// # Arguments
    ///
    /// * `x` - The x-coordinate in meters.
    /// * `y` - The y-coordinate in meters.
    /// * `theta` - The heading in radians.
    pub fn new(x: f64, y: f64, theta: f64) -> Self { Self { x, y, theta } }

    /// Creates a Pose at the origin (0, 0) with heading 0.
    pub fn origin() -> Self { Self::default() }

    /// Straight-line distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose) -> f64 { (other.x - self.x).hypot(other.y - self.y) }
}
