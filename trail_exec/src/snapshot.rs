//! # Frame snapshots and instructions
//!
//! A [`FrameSnapshot`] pairs one camera image with the sensor readings collected in the same
//! cycle. An [`Instruction`] is what a strategy derives from one snapshot.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eqpt_if::SensorData;
use image::RgbImage;
use nalgebra::Point2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One camera image and the sensor readings taken alongside it.
///
/// Fields are private so that a snapshot cannot be modified once constructed.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    image: RgbImage,
    sensors: SensorData,
    captured_at: DateTime<Utc>,
}

/// The result of evaluating a strategy on one snapshot.
#[derive(Debug, Clone)]
pub struct Instruction {
    /// Point the robot should head towards, in image pixel coordinates, or `None` if no reliable
    /// trail was found. `None` must be treated as "no correction", not as a fault.
    pub destination: Option<Point2<f64>>,

    /// Every trail point discovered in the snapshot, in the order they were found.
    pub trail: Vec<Point2<f64>>,

    /// The snapshot this instruction was derived from.
    pub snapshot: Arc<FrameSnapshot>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameSnapshot {
    /// Create a new snapshot timestamped now.
    pub fn new(image: RgbImage, sensors: SensorData) -> Self {
        Self::with_timestamp(image, sensors, Utc::now())
    }

    /// Create a new snapshot with an explicit capture time.
    pub fn with_timestamp(image: RgbImage, sensors: SensorData, captured_at: DateTime<Utc>) -> Self {
        Self {
            image,
            sensors,
            captured_at,
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn sensors(&self) -> &SensorData {
        &self.sensors
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl Instruction {
    /// Build an instruction from the discovered trail, the destination being the first point
    /// found.
    pub fn from_trail(trail: Vec<Point2<f64>>, snapshot: Arc<FrameSnapshot>) -> Self {
        Self {
            destination: trail.first().copied(),
            trail,
            snapshot,
        }
    }

    /// Horizontal offset of the destination from the image centre, normalised by the image width.
    ///
    /// This lies in `[-0.5, 0.5]` for destinations inside the image, positive to the right.
    /// Returns `0.0` if there is no destination.
    pub fn heading_error(&self) -> f64 {
        match self.destination {
            Some(d) => {
                let width = self.snapshot.width() as f64;
                if width <= 0.0 {
                    return 0.0;
                }
                (d.x - width / 2.0) / width
            }
            None => 0.0,
        }
    }
}
