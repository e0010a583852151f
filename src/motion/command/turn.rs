use std::time::Duration;

use super::{MotionCommand, MotionOutcome, MotionStep, SettleTimer, differential, normalize_angle, timed_out};
use crate::{
    config::MotionConfig,
    motion::{odom::devices::Pose, pid::Pid},
};

/// Rotates the robot in place to a field heading.
///
/// The heading error is wrapped to `[-π, π]` every tick, so the robot always
/// turns the short way. The turn PID output is an angular rate, split evenly
/// and oppositely across the two sides.
///
/// # Example
///
/// ```ignore
/// let mut turn = TurnToHeading::new(FRAC_PI_2, &config, clock.now());
/// loop {
///     match turn.step(&odom.pose(), clock.now()) {
///         MotionStep::Drive { left, right } => drive.set_voltages(left, right),
///         MotionStep::Finished(_) => break,
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TurnToHeading {
    target:      f64,
    pid:         Pid,
    settle:      SettleTimer,
    track_width: f64,
    timeout:     Duration,
    started:     Duration,
}

impl TurnToHeading {
    /// Starts a turn to `target` radians, resetting the turn PID at `now`.
    pub fn new(target: f64, config: &MotionConfig, now: Duration) -> Self {
        let mut pid = Pid::from_gains(&config.turn);
        pid.reset(now);
        Self {
            target,
            pid,
            settle: SettleTimer::new(config.heading_tolerance, config.turn_settle_time()),
            track_width: config.track_width,
            timeout: config.turn_timeout(),
            started: now,
        }
    }
}

impl MotionCommand for TurnToHeading {
    fn step(&mut self, pose: &Pose, now: Duration) -> MotionStep {
        if timed_out(self.started, now, self.timeout) {
            return MotionStep::Finished(MotionOutcome::TimedOut);
        }

        let error = normalize_angle(self.target - pose.theta);
        if self.settle.update(error, now) {
            return MotionStep::Finished(MotionOutcome::Settled);
        }

        let omega = self.pid.calculate(error, 0.0, now);
        differential(0.0, omega, self.track_width)
    }
}
