//! Motion commands.
//!
//! A motion command is a state machine that is stepped once per control loop
//! tick with the latest pose and the current time. Each step either asks for
//! a pair of wheel commands or reports that the command has finished.
//! Commands never touch hardware; [`Chassis`](crate::motion::chassis::Chassis)
//! runs them against the drivetrain.
//!
//! - [`turn::TurnToHeading`]: Rotate in place to a field heading.
//! - [`boomerang::DriveToPose`]: Drive a curved path onto a full pose.
//!
//! Both give up after their configured timeout. A timeout is an unmet goal,
//! not an error: the robot stops and the routine carries on.

use std::time::Duration;

use super::odom::devices::Pose;

/// Boomerang drive-to-pose.
pub mod boomerang;

/// Turn-to-heading.
pub mod turn;

/// How a motion command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionOutcome {
    /// The error stayed inside tolerance for the full settle time.
    Settled,
    /// The command ran out of time.
    TimedOut,
}

/// The result of one motion command tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionStep {
    /// Apply these wheel commands until the next tick.
    Drive {
        /// Left side command.
        left:  f64,
        /// Right side command.
        right: f64,
    },
    /// The command is over. The drivetrain should be braked.
    Finished(MotionOutcome),
}

/// A polled motion command.
pub trait MotionCommand {
    /// Advances the command by one tick.
    ///
    /// # Arguments
    ///
    /// * `pose` - The latest pose snapshot.
    /// * `now` - The current time on the same clock the command started on.
    fn step(&mut self, pose: &Pose, now: Duration) -> MotionStep;
}

/// Tracks how long an error has stayed inside its tolerance.
///
/// Leaving the tolerance resets the dwell, so passing through the target
/// once does not count as settling.
#[derive(Debug, Clone, Copy)]
pub struct SettleTimer {
    /// Largest absolute error that counts as settled.
    pub tolerance: f64,
    /// How long the error must stay inside tolerance.
    pub dwell:     Duration,
    entered:       Option<Duration>,
}

impl SettleTimer {
    /// Creates a timer that is not yet settling.
    pub fn new(tolerance: f64, dwell: Duration) -> Self {
        Self {
            tolerance,
            dwell,
            entered: None,
        }
    }

    /// Feeds the latest error. Returns `true` once it has been inside
    /// tolerance for the whole dwell time.
    pub fn update(&mut self, error: f64, now: Duration) -> bool {
        if error.abs() < self.tolerance {
            let entered = *self.entered.get_or_insert(now);
            now.saturating_sub(entered) >= self.dwell
        } else {
            self.entered = None;
            false
        }
    }

    /// Whether the error is currently inside tolerance.
    pub fn is_settling(&self) -> bool { self.entered.is_some() }
}

/// Wraps an angle into `[-π, π]`.
///
/// Used on heading errors so the robot always turns the short way.
pub fn normalize_angle(angle: f64) -> f64 { angle.sin().atan2(angle.cos()) }

/// Elapsed time since `start` has passed `timeout`.
fn timed_out(start: Duration, now: Duration, timeout: Duration) -> bool {
    now.saturating_sub(start) > timeout
}

/// Splits linear and angular commands into left/right wheel commands.
fn differential(linear: f64, angular: f64, track_width: f64) -> MotionStep {
    let turn = angular * track_width / 2.0;
    MotionStep::Drive {
        left:  linear - turn,
        right: linear + turn,
    }
}
