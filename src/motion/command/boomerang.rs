//! Boomerang drive-to-pose.
//!
//! Instead of aiming straight at the target, the robot chases a "carrot"
//! point set back from the target along the target's own heading:
//!
//! ```text
//! carrot = target.xy - lead * dist * (cos θ_target, sin θ_target)
//! ```
//!
//! The set-back shrinks with the remaining distance, so the carrot slides onto
//! the target as the robot closes in and the final approach lines up with
//! `θ_target`. A lead of zero aims straight at the target; larger leads swing
//! wider arcs.
//!
//! Forward speed is the motion profile's braking-limited cruise speed, scaled
//! down by the cosine of the heading error so the robot turns before it
//! drives, and slew limited to the acceleration limit.

use std::{f64::consts::PI, time::Duration};

use super::{MotionCommand, MotionOutcome, MotionStep, SettleTimer, differential, normalize_angle, timed_out};
use crate::{
    config::MotionConfig,
    motion::{odom::devices::Pose, pid::Pid, profile::MotionProfile},
};

/// Drives a curved path onto a target pose, optionally backwards.
#[derive(Debug, Clone)]
pub struct DriveToPose {
    target:        Pose,
    reverse:       bool,
    pid:           Pid,
    settle:        SettleTimer,
    profile:       MotionProfile,
    lead:          f64,
    track_width:   f64,
    max_step:      f64,
    last_velocity: f64,
    aligning:      bool,
    timeout:       Duration,
    started:       Duration,
}

impl DriveToPose {
    /// Starts a drive to `target`, resetting the heading PID at `now`.
    ///
    /// # Arguments
    ///
    /// * `target` - The final pose. Its heading shapes the approach.
    /// * `reverse` - Drive backwards, leading with the rear of the robot.
    /// * `config` - Gains, limits and tolerances.
    /// * `now` - Start time.
    pub fn new(target: Pose, reverse: bool, config: &MotionConfig, now: Duration) -> Self {
        let mut pid = Pid::from_gains(&config.drive);
        pid.reset(now);
        Self {
            target,
            reverse,
            pid,
            settle: SettleTimer::new(config.position_tolerance, config.drive_settle_time()),
            profile: MotionProfile::new(config.max_velocity, config.max_acceleration),
            lead: config.boomerang_lead,
            track_width: config.track_width,
            max_step: config.max_acceleration * config.loop_period().as_secs_f64(),
            last_velocity: 0.0,
            aligning: false,
            timeout: config.drive_timeout(),
            started: now,
        }
    }

    /// The carrot point for the given remaining distance.
    pub fn carrot(&self, dist: f64) -> (f64, f64) {
        let (sin, cos) = self.target.theta.sin_cos();
        (
            self.target.x - self.lead * dist * cos,
            self.target.y - self.lead * dist * sin,
        )
    }

    /// Limits the change in commanded velocity to one tick of acceleration.
    fn slew(&mut self, velocity: f64) -> f64 {
        let velocity = velocity.clamp(
            self.last_velocity - self.max_step,
            self.last_velocity + self.max_step,
        );
        self.last_velocity = velocity;
        velocity
    }
}

impl MotionCommand for DriveToPose {
    fn step(&mut self, pose: &Pose, now: Duration) -> MotionStep {
        if timed_out(self.started, now, self.timeout) {
            return MotionStep::Finished(MotionOutcome::TimedOut);
        }

        let dist = pose.distance_to(&self.target);
        if self.settle.update(dist, now) {
            return MotionStep::Finished(MotionOutcome::Settled);
        }

        // Inside tolerance the bearing to the carrot is meaningless. Stop
        // translating and square up to the target heading instead.
        let arrived = dist < self.settle.tolerance;

        let desired = if arrived {
            self.target.theta
        } else {
            let (cx, cy) = self.carrot(dist);
            let bearing = (cy - pose.y).atan2(cx - pose.x);
            if self.reverse { bearing + PI } else { bearing }
        };
        let heading_error = normalize_angle(desired - pose.theta);
        // The heading reference jumps when switching between the carrot and
        // the final heading.
        if arrived != self.aligning {
            self.aligning = arrived;
            self.pid.reset_to(heading_error, now);
        }

        let speed = if arrived {
            0.0
        } else {
            let speed = self.profile.speed_limit(dist) * heading_error.cos().max(0.0);
            if self.reverse { -speed } else { speed }
        };
        let velocity = self.slew(speed);

        let omega = self.pid.calculate(heading_error, 0.0, now);
        differential(velocity, omega, self.track_width)
    }
}
