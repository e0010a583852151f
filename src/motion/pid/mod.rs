//! PID controller for robot motion control.
//!
//! This module provides the [`Pid`] compute unit used by the motion
//! commands. It is a pure numeric controller: it reads no devices and
//! drives no motors, so it can be reused for headings, distances or
//! mechanisms alike.
//!
//! # How PID Works
//!
//! PID control calculates an output based on the error between a setpoint
//! and the measured process variable:
//!
//! - **P (Proportional)**: Output proportional to the error.
//! - **I (Integral)**: Output proportional to accumulated error over time.
//! - **D (Derivative)**: Output proportional to the rate of error change.
//!
//! The formula is: `output = Kp*error + Ki*integral + Kd*derivative`
//!
//! # Enhancements
//!
//! Each is disabled when its limit is `0.0`:
//!
//! - **Anti-windup**: the integral is clamped to `±integral_limit`.
//! - **Derivative filter**: exponential smoothing of the raw derivative.
//! - **Output clamp**: the output is clamped to `±output_limit`.
//!
//! # Usage
//!
//! ```ignore
//! use boreas::motion::pid::Pid;
//!
//! let mut pid = Pid::new(2.0, 0.0, 0.1);
//! pid.reset(clock.now());  // before every new motion
//! let output = pid.calculate(target, current, clock.now());
//! ```

mod controller;

pub use controller::Pid;
