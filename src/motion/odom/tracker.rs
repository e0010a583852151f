//! Odometry tracking controller.
//!
//! This module provides the [`Odometry`] struct which owns the robot's
//! authoritative pose and keeps it up to date from two tracking wheels and an
//! inertial sensor.
//!
//! The pose, the sensor baselines and the sensor health flags live together
//! behind one lock. Every read returns a copy, and every write (a tick, a
//! start-pose reset or a vision correction) is exclusive with the others.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use boreas::motion::odom::{devices::Pose, tracker::Odometry};
//!
//! let odom = Rc::new(Odometry::new(forward_tracker, lateral_tracker, imu, config.odom));
//! odom.set_pose(Pose::new(0.4, 0.3, 0.0));
//! odom.spawn(config.motion.odom_period());
//!
//! // Read current position
//! let pose = odom.pose();
//! println!("Position: ({}, {})", pose.x, pose.y);
//! ```

use std::{
    rc::Rc,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use log::{info, warn};
use vexide::{task::spawn, time::sleep};

use super::{
    algorithm::{OdomDelta, integrate},
    devices::{Pose, TrackingWheel, YawSensor},
};
use crate::config::OdomConfig;

/// Last-seen cumulative sensor readings.
#[derive(Debug, Clone, Copy, Default)]
struct SensorBaseline {
    forward:  f64,
    lateral:  f64,
    rotation: f64,
}

/// Whether each sensor produced a reading on the last tick.
#[derive(Debug, Clone, Copy)]
struct SensorHealth {
    forward: bool,
    lateral: bool,
    imu:     bool,
}

struct OdomState {
    pose:     Pose,
    baseline: SensorBaseline,
    health:   SensorHealth,
}

/// Odometry position tracker.
///
/// Integrates per-tick deltas from a forward tracking wheel, a lateral
/// tracking wheel and an IMU. Heading is taken from the IMU only.
///
/// A sensor that cannot be read is held at its last reading, so it
/// contributes no travel until it comes back, and is re-baselined on its
/// first reading after that. The transition is logged once rather than
/// every tick.
pub struct Odometry {
    forward: Box<dyn TrackingWheel>,
    lateral: Box<dyn TrackingWheel>,
    imu:     Box<dyn YawSensor>,
    config:  OdomConfig,
    state:   Mutex<OdomState>,
}

impl Odometry {
    /// Creates a new tracker at the origin, baselined on the current sensor
    /// readings.
    ///
    /// # Arguments
    ///
    /// * `forward` - Tracking wheel parallel to the robot's forward axis.
    /// * `lateral` - Tracking wheel perpendicular to it, left positive.
    /// * `imu` - Yaw source, counter-clockwise positive.
    /// * `config` - Tracking wheel mounting offsets.
    pub fn new(
        forward: impl TrackingWheel + 'static,
        lateral: impl TrackingWheel + 'static,
        imu: impl YawSensor + 'static,
        config: OdomConfig,
    ) -> Self {
        let odom = Self {
            forward: Box::new(forward),
            lateral: Box::new(lateral),
            imu: Box::new(imu),
            config,
            state: Mutex::new(OdomState {
                pose:     Pose::origin(),
                baseline: SensorBaseline::default(),
                health:   SensorHealth {
                    forward: true,
                    lateral: true,
                    imu:     true,
                },
            }),
        };
        {
            let mut state = odom.state();
            state.baseline = odom.read(&mut state);
        }
        odom
    }

    /// Starts the background tracking loop.
    ///
    /// Spawns a task that calls [`update`](Self::update) every `period` for
    /// the rest of the program.
    ///
    /// vexide runs every task on one thread, so the tracker is shared through
    /// an [`Rc`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// let odom = Rc::new(Odometry::new(forward, lateral, imu, config.odom));
    /// odom.spawn(Duration::from_millis(10));  // 100 Hz
    /// ```
    pub fn spawn(self: &Rc<Self>, period: Duration) {
        let odom = self.clone();
        spawn(async move {
            info!("Odometry loop started ({:?} period)", period);
            loop {
                odom.update();
                sleep(period).await;
            }
        })
        .detach();
    }

    /// Runs one tracking tick.
    pub fn update(&self) {
        let mut state = self.state();
        let readings = self.read(&mut state);
        let delta = OdomDelta {
            forward:  readings.forward - state.baseline.forward,
            lateral:  readings.lateral - state.baseline.lateral,
            rotation: readings.rotation - state.baseline.rotation,
        };
        state.baseline = readings;
        state.pose = integrate(state.pose, delta, &self.config);
    }

    /// Returns a snapshot of the current pose.
    pub fn pose(&self) -> Pose { self.state().pose }

    /// Overwrites the pose and re-baselines every sensor on its current
    /// reading.
    ///
    /// Use this once per run to establish the start pose. Travel is measured
    /// from this point on.
    pub fn set_pose(&self, pose: Pose) {
        let mut state = self.state();
        state.baseline = self.read(&mut state);
        state.pose = pose;
        info!("Pose set to ({:.3}, {:.3}, {:.3})", pose.x, pose.y, pose.theta);
    }

    /// Overwrites only the pose value, leaving the sensor baselines alone.
    ///
    /// Absolute corrections go through here so that the next tick's deltas
    /// are not disturbed.
    pub fn set_pose_no_reset(&self, pose: Pose) { self.state().pose = pose; }

    /// Runs `f` with exclusive access to the pose value.
    ///
    /// Like [`set_pose_no_reset`](Self::set_pose_no_reset), the baselines are
    /// untouched. No tick can land between reading the pose and writing it
    /// back.
    pub fn with_pose<R>(&self, f: impl FnOnce(&mut Pose) -> R) -> R { f(&mut self.state().pose) }

    /// Whether both tracking wheels and the IMU were readable on the last
    /// tick.
    pub fn sensors_connected(&self) -> bool {
        let health = self.state().health;
        health.forward && health.lateral && health.imu
    }

    fn state(&self) -> MutexGuard<'_, OdomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads every sensor, holding unreadable ones at their baseline.
    ///
    /// A sensor that has just come back is re-baselined on its new reading,
    /// so the travel it missed while away is not counted in one tick.
    fn read(&self, state: &mut OdomState) -> SensorBaseline {
        let OdomState {
            baseline, health, ..
        } = state;
        SensorBaseline {
            forward:  hold_last(
                self.forward.distance(),
                &mut baseline.forward,
                &mut health.forward,
                "Forward tracking wheel",
            ),
            lateral:  hold_last(
                self.lateral.distance(),
                &mut baseline.lateral,
                &mut health.lateral,
                "Lateral tracking wheel",
            ),
            rotation: hold_last(
                self.imu.cumulative_rotation(),
                &mut baseline.rotation,
                &mut health.imu,
                "IMU",
            ),
        }
    }
}

fn hold_last(reading: Option<f64>, baseline: &mut f64, healthy: &mut bool, name: &str) -> f64 {
    match reading {
        Some(value) => {
            if !*healthy {
                info!("{} reconnected", name);
                *healthy = true;
                *baseline = value;
            }
            value
        }
        None => {
            if *healthy {
                warn!("{} unavailable; holding last reading", name);
                *healthy = false;
            }
            *baseline
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        f64::consts::{FRAC_PI_2, PI},
        rc::Rc,
    };

    use approx::assert_abs_diff_eq;

    use super::*;

    #[derive(Clone, Default)]
    struct FakeSensor(Rc<Cell<Option<f64>>>);

    impl FakeSensor {
        fn new() -> Self { Self(Rc::new(Cell::new(Some(0.0)))) }

        fn set(&self, value: f64) { self.0.set(Some(value)); }

        fn add(&self, value: f64) { self.set(self.0.get().unwrap_or_default() + value); }

        fn disconnect(&self) { self.0.set(None); }
    }

    impl TrackingWheel for FakeSensor {
        fn distance(&self) -> Option<f64> { self.0.get() }
    }

    impl YawSensor for FakeSensor {
        fn cumulative_rotation(&self) -> Option<f64> { self.0.get() }
    }

    fn rig(config: OdomConfig) -> (Odometry, FakeSensor, FakeSensor, FakeSensor) {
        let (forward, lateral, imu) = (FakeSensor::new(), FakeSensor::new(), FakeSensor::new());
        let odom = Odometry::new(forward.clone(), lateral.clone(), imu.clone(), config);
        (odom, forward, lateral, imu)
    }

    fn centered() -> OdomConfig {
        OdomConfig {
            forward_wheel_offset: 0.0,
            lateral_wheel_offset: 0.0,
            ..OdomConfig::default()
        }
    }

    #[test]
    fn split_ticks_match_single_tick() {
        let (single, forward, _, _) = rig(centered());
        forward.add(1.0);
        single.update();

        let (split, forward, _, _) = rig(centered());
        forward.add(0.5);
        split.update();
        forward.add(0.5);
        split.update();

        assert_abs_diff_eq!(single.pose().x, split.pose().x, epsilon = 0.02);
        assert_abs_diff_eq!(single.pose().y, split.pose().y, epsilon = 0.02);
        assert_abs_diff_eq!(split.pose().x, 1.0, epsilon = 0.02);
    }

    #[test]
    fn lateral_travel_changes_only_y() {
        let (odom, _, lateral, _) = rig(centered());
        lateral.add(0.3);
        odom.update();
        let pose = odom.pose();
        assert_abs_diff_eq!(pose.x, 0.0, epsilon = 0.02);
        assert_abs_diff_eq!(pose.y, 0.3, epsilon = 0.02);
        assert_abs_diff_eq!(pose.theta, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn pure_rotation_with_offset_wheels_stays_in_place() {
        let config = OdomConfig {
            forward_wheel_offset: 0.05,
            lateral_wheel_offset: -0.0635,
            ..OdomConfig::default()
        };
        let (odom, forward, lateral, imu) = rig(config);
        forward.add(0.05 * FRAC_PI_2);
        lateral.add(-0.0635 * FRAC_PI_2);
        imu.add(FRAC_PI_2);
        odom.update();
        let pose = odom.pose();
        assert_abs_diff_eq!(pose.x, 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(pose.y, 0.0, epsilon = 0.05);
        assert_abs_diff_eq!(pose.theta, FRAC_PI_2, epsilon = 0.05);
    }

    #[test]
    fn backward_travel_after_turning_around() {
        let (odom, forward, _, imu) = rig(centered());
        imu.add(PI);
        odom.update();
        forward.add(-0.5);
        odom.update();
        let pose = odom.pose();
        assert_abs_diff_eq!(pose.x, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(pose.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn set_pose_rebaselines_sensors() {
        let (odom, forward, _, imu) = rig(centered());
        forward.set(5.0);
        imu.set(1.0);
        let start = Pose::new(0.4, 0.3, FRAC_PI_2);
        odom.set_pose(start);
        odom.update();
        assert_eq!(odom.pose(), start);

        forward.add(0.2);
        odom.update();
        assert_abs_diff_eq!(odom.pose().x, 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(odom.pose().y, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn correction_does_not_disturb_pending_travel() {
        let (odom, forward, _, _) = rig(centered());
        forward.add(0.25);
        odom.set_pose_no_reset(Pose::new(1.0, 1.0, 0.0));
        odom.update();
        // The travel before the correction is still applied on top of it.
        assert_abs_diff_eq!(odom.pose().x, 1.25, epsilon = 1e-9);
        assert_abs_diff_eq!(odom.pose().y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn unreadable_wheel_holds_last_value() {
        let (odom, forward, _, _) = rig(centered());
        forward.add(0.3);
        odom.update();
        assert!(odom.sensors_connected());

        forward.disconnect();
        odom.update();
        odom.update();
        assert!(!odom.sensors_connected());
        assert_abs_diff_eq!(odom.pose().x, 0.3, epsilon = 1e-9);

        // Comes back at an unrelated position. Nothing is counted for the gap.
        forward.set(1.7);
        odom.update();
        assert!(odom.sensors_connected());
        assert_abs_diff_eq!(odom.pose().x, 0.3, epsilon = 1e-9);

        forward.add(0.1);
        odom.update();
        assert_abs_diff_eq!(odom.pose().x, 0.4, epsilon = 1e-9);
    }

    #[test]
    fn wheel_unreadable_at_startup_is_baselined_on_first_reading() {
        let (forward, lateral, imu) = (FakeSensor::new(), FakeSensor::new(), FakeSensor::new());
        forward.disconnect();
        let odom = Odometry::new(forward.clone(), lateral, imu, centered());
        assert!(!odom.sensors_connected());

        forward.set(2.5);
        odom.update();
        assert!(odom.sensors_connected());
        assert_eq!(odom.pose(), Pose::origin());

        forward.add(0.2);
        odom.update();
        assert_abs_diff_eq!(odom.pose().x, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn imu_reconnect_does_not_spin_the_pose() {
        let (odom, _, _, imu) = rig(centered());
        imu.add(0.5);
        odom.update();
        imu.disconnect();
        odom.update();
        imu.set(4.0);
        odom.update();
        assert_abs_diff_eq!(odom.pose().theta, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn unreadable_imu_freezes_heading() {
        let (odom, _, _, imu) = rig(centered());
        imu.add(0.5);
        odom.update();
        imu.disconnect();
        odom.update();
        assert!(!odom.sensors_connected());
        assert_abs_diff_eq!(odom.pose().theta, 0.5, epsilon = 1e-12);
    }
}
