//! Motor intensity mapping

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::FRAC_PI_2;

use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Maps a heading onto left and right motor intensities.
pub trait MotorIntensityFunction: Send {
    /// `heading` is in radians, positive to the right, and is clamped to `[-pi/2, pi/2]`.
    /// Intensities are in `[-1, 1]`.
    fn intensities(&self, heading: f64) -> (f64, f64);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Speeds one side up and the other down in proportion to the heading.
///
/// At zero heading both sides run at `base`. At a full right heading the left side runs at
/// `base + spread` and the right at `base - spread`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMotorIntensity {
    pub base: f64,
    pub spread: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorIntensityFunction for LinearMotorIntensity {
    fn intensities(&self, heading: f64) -> (f64, f64) {
        let h = clamp(heading, (-FRAC_PI_2, FRAC_PI_2));
        let delta = self.spread * h / FRAC_PI_2;

        (
            clamp(self.base + delta, (-1.0, 1.0)),
            clamp(self.base - delta, (-1.0, 1.0)),
        )
    }
}
