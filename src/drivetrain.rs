//! Differential drivetrain output.
//!
//! This module provides the [`DriveOutput`] trait that motion commands are
//! applied through, and the [`Differential`] struct that implements it for
//! robots with separate left and right motor groups ("tank drive").
//!
//! # Example
//!
//! ```ignore
//! use boreas::drivetrain::{Differential, DriveOutput};
//! use vexide::prelude::*;
//!
//! let mut drivetrain = Differential::new(
//!     [
//!         Motor::new(peripherals.port_1, Gearset::Blue, Direction::Forward),
//!         Motor::new(peripherals.port_2, Gearset::Blue, Direction::Forward),
//!     ],
//!     [
//!         Motor::new(peripherals.port_3, Gearset::Blue, Direction::Reverse),
//!         Motor::new(peripherals.port_4, Gearset::Blue, Direction::Reverse),
//!     ],
//! );
//!
//! drivetrain.set_voltages(6.0, 6.0);
//! drivetrain.brake();
//! ```

use std::{cell::RefCell, rc::Rc};

use log::warn;
use vexide::{prelude::Motor, smart::motor::BrakeMode};

/// Highest voltage a V5 motor accepts.
pub const MAX_VOLTAGE: f64 = 12.0;

/// Something that can turn left/right wheel commands into motion.
pub trait DriveOutput {
    /// Applies a voltage to each side of the drivetrain.
    fn set_voltages(&mut self, left: f64, right: f64);

    /// Stops both sides and actively holds them.
    fn brake(&mut self);
}

/// A differential drivetrain.
///
/// The motors are stored in reference-counted cells to allow shared ownership
/// with other systems.
///
/// # Motor Configuration
///
/// Motors on opposite sides of the drivetrain typically need to spin in
/// opposite directions to move the robot forward. Configure motor directions
/// appropriately when creating the motors.
#[derive(Clone)]
pub struct Differential {
    /// The left motor group.
    pub left:  Rc<RefCell<dyn AsMut<[Motor]>>>,
    /// The right motor group.
    pub right: Rc<RefCell<dyn AsMut<[Motor]>>>,
}

impl Differential {
    /// Creates a new drivetrain with the provided left/right motors.
    pub fn new<L: AsMut<[Motor]> + 'static, R: AsMut<[Motor]> + 'static>(
        left: L,
        right: R,
    ) -> Self {
        Self {
            left:  Rc::new(RefCell::new(left)),
            right: Rc::new(RefCell::new(right)),
        }
    }

    /// Creates a new drivetrain with shared ownership of the left/right motors.
    pub fn from_shared<L: AsMut<[Motor]> + 'static, R: AsMut<[Motor]> + 'static>(
        left: Rc<RefCell<L>>,
        right: Rc<RefCell<R>>,
    ) -> Self {
        Self { left, right }
    }

    /// Sets the brake mode for all motors in the drivetrain.
    ///
    /// - [`BrakeMode::Coast`]: Motors spin freely.
    /// - [`BrakeMode::Brake`]: Motors actively resist rotation.
    /// - [`BrakeMode::Hold`]: Motors actively hold their position.
    pub fn set_brakemode(&self, brakemode: BrakeMode) {
        for_each_motor(&self.left, |motor| motor.brake(brakemode).is_ok());
        for_each_motor(&self.right, |motor| motor.brake(brakemode).is_ok());
    }
}

impl DriveOutput for Differential {
    /// Voltages are clamped to `±MAX_VOLTAGE`.
    fn set_voltages(&mut self, left: f64, right: f64) {
        let left = left.clamp(-MAX_VOLTAGE, MAX_VOLTAGE);
        let right = right.clamp(-MAX_VOLTAGE, MAX_VOLTAGE);
        for_each_motor(&self.left, |motor| motor.set_voltage(left).is_ok());
        for_each_motor(&self.right, |motor| motor.set_voltage(right).is_ok());
    }

    fn brake(&mut self) { self.set_brakemode(BrakeMode::Brake); }
}

/// Applies `f` to every motor in a group, warning once per call if any
/// motor rejected the command.
fn for_each_motor(group: &Rc<RefCell<dyn AsMut<[Motor]>>>, mut f: impl FnMut(&mut Motor) -> bool) {
    match group.try_borrow_mut() {
        Ok(mut motors) => {
            let failed = motors.as_mut().iter_mut().map(&mut f).filter(|ok| !ok).count();
            if failed > 0 {
                warn!("{} drivetrain motor(s) did not accept a command", failed);
            }
        }
        Err(e) => warn!("Error Borrowing Motors: {}", e),
    }
}
