//! # Simulated equipment
//!
//! Stand-ins for the camera, sensors and actuators, used when no hardware is available and by the
//! tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use eqpt_if::{ActuatorSink, FrameSource, LightId, SensorData, SensorSource, ServoId};
use image::{Rgb, RgbImage};
use log::trace;
use util::cancel::{CancelToken, Interrupted};

use crate::{params::SimParams, robot::Equipment};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Camera returning the same synthetic trail image every frame.
#[derive(Debug, Clone)]
pub struct SimCamera {
    frame: Option<RgbImage>,
}

/// Sensors returning a fixed ultrasonic distance after a simulated read time.
#[derive(Debug, Clone)]
pub struct SimSensors {
    ultrasonic_cm: f64,
    latency: Duration,
}

/// Actuators which log every demand.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogActuators;

/// Actuators which record every demand, for inspection by tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingActuators {
    commands: Arc<Mutex<Vec<ActuatorCommand>>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A demand received by [`RecordingActuators`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCommand {
    Motors(f64, f64),
    Servo(ServoId, i32),
    Light(LightId, bool),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimCamera {
    pub fn new(params: &SimParams) -> Self {
        Self {
            frame: Some(render_trail(
                params.width,
                params.height,
                params.stripe_width_px,
                params.bend_row,
                params.bend_angle_deg,
            )),
        }
    }

    /// Camera showing a straight vertical trail in the centre of the image.
    pub fn straight(width: u32, height: u32, stripe_width: u32) -> Self {
        Self {
            frame: Some(render_trail(width, height, stripe_width, 0, 0.0)),
        }
    }

    /// Camera which never has a frame available.
    pub fn unavailable() -> Self {
        Self { frame: None }
    }
}

impl FrameSource for SimCamera {
    fn get_frame(&mut self) -> Option<RgbImage> {
        self.frame.clone()
    }
}

impl SimSensors {
    pub fn new(ultrasonic_cm: f64, latency_ms: u64) -> Self {
        Self {
            ultrasonic_cm,
            latency: Duration::from_millis(latency_ms),
        }
    }
}

impl SensorSource for SimSensors {
    fn collect(&mut self, cancel: &CancelToken) -> Result<SensorData, Interrupted> {
        cancel.sleep(self.latency)?;
        Ok(SensorData {
            ultrasonic_cm: self.ultrasonic_cm,
        })
    }
}

impl ActuatorSink for LogActuators {
    fn write_motors(&mut self, left: f64, right: f64) {
        trace!("Motors: left {:.3}, right {:.3}", left, right);
    }

    fn write_servo(&mut self, id: ServoId, position: i32) {
        trace!("Servo {:?} -> {}", id, position);
    }

    fn set_light(&mut self, id: LightId, on: bool) {
        trace!("Light {:?} {}", id, if on { "on" } else { "off" });
    }
}

impl RecordingActuators {
    /// All demands received so far, oldest first.
    pub fn commands(&self) -> Vec<ActuatorCommand> {
        self.lock().clone()
    }

    fn push(&self, cmd: ActuatorCommand) {
        self.lock().push(cmd);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ActuatorCommand>> {
        self.commands
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ActuatorSink for RecordingActuators {
    fn write_motors(&mut self, left: f64, right: f64) {
        self.push(ActuatorCommand::Motors(left, right));
    }

    fn write_servo(&mut self, id: ServoId, position: i32) {
        self.push(ActuatorCommand::Servo(id, position));
    }

    fn set_light(&mut self, id: LightId, on: bool) {
        self.push(ActuatorCommand::Light(id, on));
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build a full set of simulated equipment from the parameters.
pub fn sim_equipment(params: &SimParams) -> Equipment {
    Equipment::new(
        Box::new(SimCamera::new(params)),
        Box::new(SimSensors::new(params.ultrasonic_cm, params.sensor_latency_ms)),
        Box::new(LogActuators),
    )
}

/// Render a white trail on a black background.
///
/// Below `bend_row` the trail runs vertically up the centre of the image. Above it the trail leans
/// `bend_angle_deg` from vertical, positive to the right.
pub fn render_trail(
    width: u32,
    height: u32,
    stripe_width: u32,
    bend_row: u32,
    bend_angle_deg: f64,
) -> RgbImage {
    let lean = bend_angle_deg.to_radians().tan();
    let half = stripe_width as f64 / 2.0;

    RgbImage::from_fn(width, height, |x, y| {
        let centre = match y < bend_row {
            true => width as f64 / 2.0 + (bend_row - y) as f64 * lean,
            false => width as f64 / 2.0,
        };
        let left = (centre - half).round();

        match (x as f64) >= left && (x as f64) < left + stripe_width as f64 {
            true => Rgb([255, 255, 255]),
            false => Rgb([0, 0, 0]),
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_render_straight_trail() {
        let img = render_trail(100, 100, 10, 0, 0.0);

        for y in [0u32, 50, 99].iter() {
            let white: Vec<u32> = (0..100)
                .filter(|x| img.get_pixel(*x, *y)[0] == 255)
                .collect();
            assert_eq!(white, (45..55).collect::<Vec<u32>>());
        }
    }

    #[test]
    fn test_render_bent_trail() {
        let img = render_trail(100, 100, 10, 50, 45.0);

        assert_eq!(img.get_pixel(45, 60)[0], 255);
        assert_eq!(img.get_pixel(45, 40)[0], 0);
        assert_eq!(img.get_pixel(55, 40)[0], 255);
    }

    #[test]
    fn test_slow_sensor_is_interruptible() {
        let mut sensors = SimSensors::new(42.0, 60_000);
        let cancel = CancelToken::new();
        let c = cancel.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            c.cancel();
        });

        let start = Instant::now();
        assert_eq!(sensors.collect(&cancel), Err(Interrupted));
        assert!(start.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();

        cancel.reset();
        let mut fast = SimSensors::new(42.0, 0);
        assert_eq!(fast.collect(&cancel).unwrap().ultrasonic_cm, 42.0);
    }
}
