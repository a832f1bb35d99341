//! # Sensor Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::cancel::{CancelToken, Interrupted};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sensor readings collected together at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    /// Distance measured by the forward ultrasonic sensor.
    ///
    /// Units: centimeters
    pub ultrasonic_cm: f64,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of sensor readings.
pub trait SensorSource: Send {
    /// Collect one set of sensor readings.
    ///
    /// This call is synchronous and may block while the sensors are read. Implementations must
    /// observe `cancel` while blocked and return `Err(Interrupted)` promptly once it is cancelled.
    fn collect(&mut self, cancel: &CancelToken) -> Result<SensorData, Interrupted>;
}
