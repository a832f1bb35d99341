//! # Equipment interface crate.
//!
//! Provides the interfaces between the robot executive and its equipment. The executive only ever
//! talks to its camera, sensors and actuators through the traits defined here, so that the same
//! executive can drive real hardware, a simulation, or a test double.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Interface definitions for the equipment (camera, sensors, actuators)
pub mod eqpt;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use eqpt::{
    act::{ActuatorSink, LightId, ServoId},
    cam::FrameSource,
    sens::{SensorData, SensorSource},
};
