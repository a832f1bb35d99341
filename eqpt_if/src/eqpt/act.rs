//! # Actuator Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the positional servos on the robot
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ServoId {
    /// Tilts the camera between its looking-down and looking-forward positions
    CameraTilt,

    /// Raises and lowers the manipulator arm
    Arm,
}

/// IDs of the lights on the robot
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum LightId {
    /// Lights the ground under the camera
    Backlight,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Sink for actuator demands.
///
/// All demands are fire-and-forget. Retrying, or deciding that a failed write is fatal, is the
/// responsibility of the implementation.
pub trait ActuatorSink: Send {
    /// Set the propulsion motor intensities, each normalised between -1 and +1.
    fn write_motors(&mut self, left: f64, right: f64);

    /// Move a positional servo to the given position (in the servo driver's own units).
    fn write_servo(&mut self, id: ServoId, position: i32);

    /// Switch a light on or off.
    fn set_light(&mut self, id: LightId, on: bool);
}
