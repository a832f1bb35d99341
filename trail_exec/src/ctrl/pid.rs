//! # PID controller
//!
//! A time-aware PID controller with clamped input and output. The gains live behind a
//! [`GainsHandle`] so that a parameter reload on another thread can replace them, the controller
//! copies them once at the start of every [`PidController::feed`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::Serialize;
use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PidGains {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
}

/// Shared, swappable gains.
#[derive(Debug, Clone)]
pub struct GainsHandle(Arc<RwLock<PidGains>>);

/// A PID controller
#[derive(Debug, Clone, Serialize)]
pub struct PidController {
    #[serde(skip)]
    gains: GainsHandle,

    /// Target value of the input
    setpoint: f64,

    /// Inputs are clamped into this range before use
    input_range: (f64, f64),

    /// Outputs are clamped into this range
    output_range: (f64, f64),

    /// The integral only accumulates while enabled
    enabled: bool,

    /// Previous instant that the input was passed in
    #[serde(skip)]
    prev_time: Option<Instant>,

    /// Previous error
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GainsHandle {
    pub fn new(gains: PidGains) -> Self {
        Self(Arc::new(RwLock::new(gains)))
    }

    /// Copy out the current gains.
    pub fn get(&self) -> PidGains {
        match self.0.read() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Replace all three gains at once.
    pub fn set(&self, gains: PidGains) {
        match self.0.write() {
            Ok(mut g) => *g = gains,
            Err(poisoned) => *poisoned.into_inner() = gains,
        }
    }
}

impl PidController {
    /// Create a new controller with the given gains, a setpoint of zero and the given ranges.
    pub fn new(gains: PidGains, input_range: (f64, f64), output_range: (f64, f64)) -> Self {
        Self {
            gains: GainsHandle::new(gains),
            setpoint: 0.0,
            input_range,
            output_range,
            enabled: true,
            prev_time: None,
            prev_error: None,
            integral: 0.0,
        }
    }

    /// Handle through which the gains can be replaced from another thread.
    pub fn gains_handle(&self) -> GainsHandle {
        self.gains.clone()
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn output_range(&self) -> (f64, f64) {
        self.output_range
    }

    /// Forget the accumulated integral and the previous error and time.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
        self.prev_time = None;
    }

    /// Get the output of the controller for the given input.
    ///
    /// This function is time-aware so there is no need to pass in a delta-time value.
    pub fn feed(&mut self, input: f64) -> f64 {
        self.feed_at(input, Instant::now())
    }

    /// Get the output of the controller for an input measured at the given instant.
    pub fn feed_at(&mut self, input: f64, now: Instant) -> f64 {
        let gains = self.gains.get();

        let input = clamp(input, self.input_range);
        let error = self.setpoint - input;

        // Calculate dt, with no previous feed there is no time difference and neither the
        // integral nor the derivative contribute
        let dt = match self.prev_time {
            Some(t0) => Some(now.saturating_duration_since(t0).as_secs_f64()),
            None => None,
        };

        if self.enabled {
            self.integral += match dt {
                Some(t) => error * t,
                None => 0.0,
            };
        }

        let deriv = match (self.prev_error, dt) {
            (Some(e), Some(t)) if t > 0.0 => (error - e) / t,
            _ => 0.0,
        };

        let out = gains.k_p * error + gains.k_i * self.integral + gains.k_d * deriv;

        self.prev_error = Some(error);
        self.prev_time = Some(now);

        clamp(out, self.output_range)
    }
}
