//! Trapezoidal velocity planning.
//!
//! The profile has no explicit phases. The target velocity is the smallest of
//! three bounds, which traces the accelerate / cruise / decelerate shape on
//! its own:
//!
//! ```text
//! v(t, d) = min(a·t, sqrt(2·a·|d|), v_max)
//! ```
//!
//! The middle term is the fastest speed from which the robot can still stop
//! within the remaining distance `d`.

/// A trapezoidal velocity envelope.
///
/// # Example
///
/// ```ignore
/// use boreas::motion::profile::MotionProfile;
///
/// let profile = MotionProfile::new(0.8, 1.5);
/// let v = profile.target_velocity(elapsed_secs, distance_to_go);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    /// Cruise velocity cap in m/s.
    pub max_velocity:     f64,
    /// Acceleration and deceleration limit in m/s².
    pub max_acceleration: f64,
}

impl MotionProfile {
    /// Creates a profile from its velocity cap and acceleration limit.
    pub fn new(max_velocity: f64, max_acceleration: f64) -> Self {
        Self {
            max_velocity,
            max_acceleration,
        }
    }

    /// Returns the target velocity for the given point in the motion.
    ///
    /// # Arguments
    ///
    /// * `time_elapsed` - Seconds since the motion started.
    /// * `distance_to_go` - Remaining distance in meters. Only its magnitude is used.
    ///
    /// # Returns
    ///
    /// A non-negative velocity in m/s.
    pub fn target_velocity(&self, time_elapsed: f64, distance_to_go: f64) -> f64 {
        let accel = self.max_acceleration * time_elapsed.max(0.0);
        accel.min(self.speed_limit(distance_to_go)).max(0.0)
    }

    /// The cruise cap, lowered near the end so the robot can still stop
    /// within `distance_to_go` while braking at the acceleration limit.
    pub fn speed_limit(&self, distance_to_go: f64) -> f64 {
        (2.0 * self.max_acceleration * distance_to_go.abs()).sqrt().min(self.max_velocity)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn never_exceeds_cruise_cap() {
        let profile = MotionProfile::new(0.8, 1.5);
        for t in 0..50 {
            for d in 0..50 {
                let v = profile.target_velocity(t as f64 * 0.1, d as f64 * 0.1);
                assert!(v <= 0.8 + 1e-12);
                assert!(v >= 0.0);
            }
        }
    }

    #[test]
    fn zero_at_target() {
        let profile = MotionProfile::new(0.8, 1.5);
        assert_eq!(profile.target_velocity(3.0, 0.0), 0.0);
    }

    #[test]
    fn ramps_with_acceleration_at_start() {
        let profile = MotionProfile::new(0.8, 1.5);
        assert_abs_diff_eq!(profile.target_velocity(0.1, 2.0), 0.15, epsilon = 1e-9);
    }

    #[test]
    fn decelerates_near_target() {
        let profile = MotionProfile::new(0.8, 1.5);
        assert_abs_diff_eq!(profile.target_velocity(5.0, 0.03), 0.3, epsilon = 1e-9);
        // Overshoot is treated by magnitude.
        assert_abs_diff_eq!(profile.target_velocity(5.0, -0.03), 0.3, epsilon = 1e-9);
    }

    #[test]
    fn speed_limit_ignores_elapsed_time() {
        let profile = MotionProfile::new(0.8, 1.5);
        assert_abs_diff_eq!(profile.speed_limit(2.0), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(profile.speed_limit(0.03), 0.3, epsilon = 1e-9);
    }
}
