//! # Control law
//!
//! Converts the heading error derived from an [`Instruction`](crate::snapshot::Instruction) into
//! left and right motor intensities.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod motors;
pub mod pid;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use motors::{LinearMotorIntensity, MotorIntensityFunction};
pub use pid::{GainsHandle, PidController, PidGains};
