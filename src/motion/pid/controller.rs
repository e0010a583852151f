use std::time::Duration;

use crate::config::PidGains;

/// Sample period assumed when no usable time has elapsed since the last call.
const MIN_DT: f64 = 0.01;

/// A PID controller with anti-windup, derivative smoothing and output clamping.
///
/// Samples are timestamped by the caller, which keeps the controller free of
/// any clock and lets the same instance run on the brain and in host tests.
///
/// # Example
///
/// ```ignore
/// use boreas::motion::pid::Pid;
///
/// let mut pid = Pid::new(2.0, 0.0, 0.1)
///     .with_integral_limit(1.0)
///     .with_output_limit(12.0);
/// pid.reset(now);
/// let omega = pid.calculate(heading_error, 0.0, now);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pid {
    /// Proportional gain.
    pub kp:                f64,
    /// Integral gain.
    pub ki:                f64,
    /// Derivative gain.
    pub kd:                f64,
    /// Symmetric clamp on the integral accumulator, `0.0` to disable.
    pub integral_limit:    f64,
    /// Derivative smoothing coefficient, `0.0` to disable.
    pub derivative_filter: f64,
    /// Symmetric clamp on the output, `0.0` to disable.
    pub output_limit:      f64,
    integral:              f64,
    prev_error:            f64,
    filtered_derivative:   f64,
    last_sample:           Option<Duration>,
}

impl Pid {
    /// Creates a controller with the given gains and every limit disabled.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            integral_limit: 0.0,
            derivative_filter: 0.0,
            output_limit: 0.0,
            integral: 0.0,
            prev_error: 0.0,
            filtered_derivative: 0.0,
            last_sample: None,
        }
    }

    /// Creates a controller from configured gains and limits.
    pub fn from_gains(gains: &PidGains) -> Self {
        Self::new(gains.kp, gains.ki, gains.kd)
            .with_integral_limit(gains.integral_limit)
            .with_derivative_filter(gains.derivative_filter)
            .with_output_limit(gains.output_limit)
    }

    /// Sets the anti-windup clamp on `|∫error·dt|`.
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = limit;
        self
    }

    /// Sets the derivative smoothing coefficient (0.5 to 0.8 is typical).
    pub fn with_derivative_filter(mut self, alpha: f64) -> Self {
        self.derivative_filter = alpha;
        self
    }

    /// Sets the symmetric output clamp.
    pub fn with_output_limit(mut self, limit: f64) -> Self {
        self.output_limit = limit;
        self
    }

    /// Computes the controller output for one sample.
    ///
    /// # Arguments
    ///
    /// * `setpoint` - The desired value.
    /// * `process_variable` - The measured value.
    /// * `now` - Timestamp of this sample.
    ///
    /// # Returns
    ///
    /// The corrective output, clamped when an output limit is set.
    pub fn calculate(&mut self, setpoint: f64, process_variable: f64, now: Duration) -> f64 {
        let dt = self
            .last_sample
            .and_then(|last| now.checked_sub(last))
            .map(|elapsed| elapsed.as_secs_f64())
            .filter(|dt| *dt > 0.0)
            .unwrap_or(MIN_DT);

        let error = setpoint - process_variable;
        let p = self.kp * error;

        self.integral += error * dt;
        if self.integral_limit > 0.0 {
            self.integral = abscap(self.integral, self.integral_limit);
        }
        let i = self.ki * self.integral;

        let raw_derivative = (error - self.prev_error) / dt;
        let derivative = if self.derivative_filter > 0.0 {
            self.derivative_filter * self.filtered_derivative +
                (1.0 - self.derivative_filter) * raw_derivative
        } else {
            raw_derivative
        };
        let d = self.kd * derivative;

        self.prev_error = error;
        self.filtered_derivative = derivative;
        self.last_sample = Some(now);

        let output = p + i + d;
        if self.output_limit > 0.0 {
            abscap(output, self.output_limit)
        } else {
            output
        }
    }

    /// Clears the integral, previous error and filtered derivative, and
    /// restarts the time base at `now`.
    ///
    /// Call this at the start of every motion command.
    pub fn reset(&mut self, now: Duration) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.filtered_derivative = 0.0;
        self.last_sample = Some(now);
    }

    /// Like [`reset`](Self::reset), but takes `error` as the previous sample.
    ///
    /// Use this when the error is about to jump to a new reference, so the
    /// first derivative after the switch is zero instead of a spike.
    pub fn reset_to(&mut self, error: f64, now: Duration) {
        self.reset(now);
        self.prev_error = error;
    }

    /// The current integral accumulator.
    pub fn integral(&self) -> f64 { self.integral }
}

fn abscap(val: f64, cap: f64) -> f64 { val.clamp(-cap, cap) }

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn ms(millis: u64) -> Duration { Duration::from_millis(millis) }

    #[test]
    fn proportional_only_is_kp_times_error() {
        let mut pid = Pid::new(2.0, 0.0, 0.0);
        pid.reset(ms(1000));
        assert_abs_diff_eq!(pid.calculate(10.0, 5.0, ms(1010)), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pid.calculate(5.0, 10.0, ms(1020)), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_error_gives_zero_output() {
        let mut pid = Pid::new(2.0, 0.0, 0.0);
        pid.reset(ms(1000));
        assert_abs_diff_eq!(pid.calculate(5.0, 5.0, ms(1010)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn integral_output_grows_with_constant_error() {
        let mut pid = Pid::new(0.0, 1.0, 0.0);
        pid.reset(ms(0));
        let mut previous = 0.0;
        for tick in 1..=10 {
            let out = pid.calculate(10.0, 5.0, ms(tick * 10));
            assert!(out > previous);
            previous = out;
        }
        assert_abs_diff_eq!(previous, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn derivative_settles_when_error_is_steady() {
        let mut pid = Pid::new(0.0, 0.0, 1.0);
        pid.reset(ms(0));
        assert!(pid.calculate(10.0, 5.0, ms(10)) > 0.0);
        assert_abs_diff_eq!(pid.calculate(10.0, 5.0, ms(20)), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn non_positive_dt_uses_floor() {
        let mut pid = Pid::new(0.0, 1.0, 0.0);
        pid.reset(ms(500));
        // Same timestamp as the reset: dt falls back to 10 ms.
        assert_abs_diff_eq!(pid.calculate(1.0, 0.0, ms(500)), 0.01, epsilon = 1e-12);
        // Clock went backwards: still no division by zero.
        let out = pid.calculate(1.0, 0.0, ms(400));
        assert!(out.is_finite());
        assert_abs_diff_eq!(out, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn reset_matches_fresh_controller() {
        let mut reused = Pid::new(1.0, 1.0, 0.1);
        reused.reset(ms(0));
        for tick in 1..=10 {
            reused.calculate(10.0, 5.0, ms(tick * 10));
        }
        reused.reset(ms(1000));
        let after_reset = reused.calculate(10.0, 5.0, ms(1010));

        let mut fresh = Pid::new(1.0, 1.0, 0.1);
        fresh.reset(ms(2000));
        let first = fresh.calculate(10.0, 5.0, ms(2010));

        assert_abs_diff_eq!(after_reset, first, epsilon = 1e-9);
    }

    #[test]
    fn reset_clears_filter_and_integral_state() {
        let gains = PidGains {
            kp:                1.0,
            ki:                1.0,
            kd:                1.0,
            integral_limit:    10.0,
            derivative_filter: 0.5,
            output_limit:      50.0,
        };
        let mut reused = Pid::from_gains(&gains);
        reused.reset(ms(0));
        for tick in 1..=20 {
            reused.calculate(10.0, 5.0, ms(tick * 10));
        }
        reused.reset(ms(1000));
        let after_reset = reused.calculate(10.0, 5.0, ms(1010));

        let mut fresh = Pid::from_gains(&gains);
        fresh.reset(ms(2000));
        assert_abs_diff_eq!(after_reset, fresh.calculate(10.0, 5.0, ms(2010)), epsilon = 1e-9);
        assert_abs_diff_eq!(reused.integral(), fresh.integral(), epsilon = 1e-12);
    }

    #[test]
    fn reset_to_has_no_derivative_kick() {
        let mut pid = Pid::new(2.0, 0.0, 1.0);
        pid.reset(ms(0));
        for tick in 1..=5 {
            pid.calculate(0.1, 0.0, ms(tick * 10));
        }
        pid.reset_to(1.5, ms(100));
        assert_abs_diff_eq!(pid.calculate(1.5, 0.0, ms(110)), 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pid.integral(), 0.015, epsilon = 1e-12);

        // A plain reset sees the whole error as a step.
        pid.reset(ms(200));
        assert_abs_diff_eq!(pid.calculate(1.5, 0.0, ms(210)), 3.0 + 150.0, epsilon = 1e-6);
    }

    #[test]
    fn anti_windup_bounds_integral_output() {
        let mut pid = Pid::new(0.0, 1.0, 0.0).with_integral_limit(2.0);
        pid.reset(ms(0));
        let mut out = 0.0;
        for tick in 1..=200 {
            out = pid.calculate(100.0, 0.0, ms(tick * 10));
            assert!(out <= 2.0 + 1e-9);
        }
        // Unclamped the integral would be 200.
        assert_abs_diff_eq!(out, 2.0, epsilon = 1e-9);

        let mut negative = Pid::new(0.0, 1.0, 0.0).with_integral_limit(2.0);
        negative.reset(ms(0));
        for tick in 1..=200 {
            out = negative.calculate(0.0, 100.0, ms(tick * 10));
        }
        assert_abs_diff_eq!(out, -2.0, epsilon = 1e-9);
    }

    #[test]
    fn derivative_filter_smooths_step() {
        let mut raw = Pid::new(0.0, 0.0, 1.0);
        let mut filtered = Pid::new(0.0, 0.0, 1.0).with_derivative_filter(0.7);
        raw.reset(ms(0));
        filtered.reset(ms(0));
        let raw_out = raw.calculate(10.0, 0.0, ms(10));
        let filtered_out = filtered.calculate(10.0, 0.0, ms(10));
        assert!(filtered_out.abs() < raw_out.abs());
        assert_abs_diff_eq!(filtered_out, 0.3 * raw_out, epsilon = 1e-9);
    }

    #[test]
    fn output_clamp_is_exact_and_signed() {
        let mut pid = Pid::new(10.0, 0.0, 0.0).with_output_limit(5.0);
        pid.reset(ms(1000));
        assert_eq!(pid.calculate(100.0, 0.0, ms(1010)), 5.0);
        assert_eq!(pid.calculate(0.0, 100.0, ms(1020)), -5.0);
    }

    #[test]
    fn no_clamp_when_output_limit_disabled() {
        let mut pid = Pid::new(10.0, 0.0, 0.0);
        pid.reset(ms(1000));
        assert_abs_diff_eq!(pid.calculate(100.0, 0.0, ms(1010)), 1000.0, epsilon = 1e-9);
    }
}
