//! Trail direction estimators

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;

use nalgebra::{Point2, Vector2};

use crate::per::sampling::{angle_of, unit};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Smooths the walking direction over successive steps.
pub trait DirectionEstimator: Send {
    /// Forget all steps and restart from the given direction angle.
    fn reset(&mut self, initial: f64);

    /// Add the vector of the latest step.
    fn push(&mut self, step: Vector2<f64>);

    /// Current smoothed direction as a unit vector.
    fn direction(&self) -> Vector2<f64>;

    /// Distance of one step ahead.
    fn step_px(&self) -> f64;

    /// Current smoothed direction as an angle.
    fn angle(&self) -> f64 {
        angle_of(&self.direction())
    }

    /// The point one step ahead of `from` along the smoothed direction.
    fn expected_point(&self, from: &Point2<f64>) -> Point2<f64> {
        from + self.direction() * self.step_px()
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Weighted moving average of the last `window` step directions.
///
/// Step vectors are normalised before averaging, so long and short steps count the same. The
/// newest step has weight `window`, the oldest weight 1.
#[derive(Debug, Clone)]
pub struct VectorDirectionEstimator {
    step_px: f64,
    window: usize,
    steps: VecDeque<Vector2<f64>>,
    direction: Vector2<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VectorDirectionEstimator {
    /// Create a new estimator pointing up the image.
    pub fn new(step_px: f64, window: usize) -> Self {
        let window = window.max(1);
        Self {
            step_px,
            window,
            steps: VecDeque::with_capacity(window),
            direction: unit(-std::f64::consts::FRAC_PI_2),
        }
    }

    fn recompute(&mut self) {
        let sum = self
            .steps
            .iter()
            .enumerate()
            .fold(Vector2::zeros(), |acc, (i, s)| acc + s * (i + 1) as f64);

        // Opposing steps can cancel out, in which case keep the previous direction
        if let Some(d) = sum.try_normalize(1e-9) {
            self.direction = d;
        }
    }
}

impl DirectionEstimator for VectorDirectionEstimator {
    fn reset(&mut self, initial: f64) {
        self.steps.clear();
        self.direction = unit(initial);
    }

    fn push(&mut self, step: Vector2<f64>) {
        let step = match step.try_normalize(1e-9) {
            Some(s) => s,
            None => return,
        };

        if self.steps.len() == self.window {
            self.steps.pop_front();
        }
        self.steps.push_back(step);
        self.recompute();
    }

    fn direction(&self) -> Vector2<f64> {
        self.direction
    }

    fn step_px(&self) -> f64 {
        self.step_px
    }
}
