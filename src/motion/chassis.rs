//! The motion command runner.
//!
//! [`Chassis`] ties a drivetrain to the shared odometry and runs one motion
//! command at a time. The command methods take `&mut self`, so the borrow
//! checker rules out two commands driving the motors at once. Background
//! tasks (odometry, vision) keep running underneath while a command is
//! awaited.
//!
//! # Example
//!
//! ```ignore
//! use boreas::motion::{chassis::{BrainClock, Chassis}, command::MotionOutcome};
//!
//! let mut chassis = Chassis::new(drivetrain, odom.clone(), BrainClock, config.motion);
//!
//! chassis.turn_to_heading(FRAC_PI_2).await;
//! if chassis.drive_to_pose(Pose::new(1.2, 0.6, 0.0), false).await == MotionOutcome::TimedOut {
//!     // Fall back to a safer routine.
//! }
//! ```

use std::{rc::Rc, time::Duration};

use log::{info, warn};
use vexide::time::{sleep, user_uptime};

use super::{
    command::{
        MotionCommand, MotionOutcome, MotionStep, boomerang::DriveToPose, turn::TurnToHeading,
    },
    odom::{devices::Pose, tracker::Odometry},
};
use crate::{config::MotionConfig, drivetrain::DriveOutput};

/// A monotonic time source.
pub trait Clock {
    /// Time since an arbitrary fixed start.
    fn now(&self) -> Duration;
}

/// The brain's user program uptime.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrainClock;

impl Clock for BrainClock {
    fn now(&self) -> Duration { user_uptime() }
}

/// Runs motion commands against a drivetrain.
pub struct Chassis<D: DriveOutput, C: Clock> {
    drive:  D,
    odom:   Rc<Odometry>,
    clock:  C,
    config: MotionConfig,
}

impl<D: DriveOutput, C: Clock> Chassis<D, C> {
    /// Creates a runner.
    ///
    /// # Arguments
    ///
    /// * `drive` - Where wheel commands go.
    /// * `odom` - The pose source, usually shared with a background task.
    /// * `clock` - Time source for timeouts, settling and PID sampling.
    /// * `config` - Gains, tolerances and timeouts.
    pub fn new(drive: D, odom: Rc<Odometry>, clock: C, config: MotionConfig) -> Self {
        Self {
            drive,
            odom,
            clock,
            config,
        }
    }

    /// The odometry this chassis drives from.
    pub fn odom(&self) -> &Rc<Odometry> { &self.odom }

    /// The motion configuration.
    pub fn config(&self) -> &MotionConfig { &self.config }

    /// The drivetrain output.
    pub fn drive_mut(&mut self) -> &mut D { &mut self.drive }

    /// The clock.
    pub fn clock(&self) -> &C { &self.clock }

    /// Runs one tick of `command`.
    ///
    /// Reads a pose snapshot, steps the command and applies its wheel
    /// commands. When the command finishes the drivetrain is braked and the
    /// outcome returned.
    pub fn poll(&mut self, command: &mut impl MotionCommand) -> Option<MotionOutcome> {
        let pose = self.odom.pose();
        match command.step(&pose, self.clock.now()) {
            MotionStep::Drive { left, right } => {
                self.drive.set_voltages(left, right);
                None
            }
            MotionStep::Finished(outcome) => {
                self.drive.brake();
                Some(outcome)
            }
        }
    }

    /// Rotates in place to a field heading.
    ///
    /// Returns once the heading has settled or the turn timeout has passed.
    ///
    /// # Arguments
    ///
    /// * `target` - Field heading in radians, counter-clockwise positive.
    pub async fn turn_to_heading(&mut self, target: f64) -> MotionOutcome {
        info!("turn_to_heading {:.3} rad", target);
        let mut command = TurnToHeading::new(target, &self.config, self.clock.now());
        self.run("turn_to_heading", &mut command).await
    }

    /// Drives a curved path onto a target pose.
    ///
    /// Returns once the position has settled or the drive timeout has passed.
    ///
    /// # Arguments
    ///
    /// * `target` - The final pose. Its heading shapes the approach.
    /// * `reverse` - Drive backwards.
    pub async fn drive_to_pose(&mut self, target: Pose, reverse: bool) -> MotionOutcome {
        info!(
            "drive_to_pose ({:.3}, {:.3}, {:.3}){}",
            target.x,
            target.y,
            target.theta,
            if reverse { " reversed" } else { "" }
        );
        let mut command = DriveToPose::new(target, reverse, &self.config, self.clock.now());
        self.run("drive_to_pose", &mut command).await
    }

    async fn run(&mut self, name: &str, command: &mut impl MotionCommand) -> MotionOutcome {
        let start = self.clock.now();
        loop {
            if let Some(outcome) = self.poll(command) {
                let elapsed = self.clock.now().saturating_sub(start);
                let pose = self.odom.pose();
                match outcome {
                    MotionOutcome::Settled => info!(
                        "{} settled in {:?} at ({:.3}, {:.3}, {:.3})",
                        name, elapsed, pose.x, pose.y, pose.theta
                    ),
                    MotionOutcome::TimedOut => warn!(
                        "{} timed out after {:?} at ({:.3}, {:.3}, {:.3})",
                        name, elapsed, pose.x, pose.y, pose.theta
                    ),
                }
                return outcome;
            }
            sleep(self.config.loop_period()).await;
        }
    }
}
