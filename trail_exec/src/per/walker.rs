//! # Line walker
//!
//! Iteratively steps along the trail in one frame. [`MomentData`] is the scratch state of one
//! walk, and a [`LineFinder`] advances it by one step at a time until the trail is lost.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Point2;

use super::{
    modules::{AngularTurnHandler, BorderFinder, DirectionEstimator, WidthEstimator},
    sampling::distance,
    BorderPair, TrailMask,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Steps shorter than this are treated as a stall and end the walk.
const MIN_STEP_PX: f64 = 0.5;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Advances a walk by one step.
pub trait LineFinder: Send + Sync {
    /// Find the next trail point, returning `false` once the walk is over.
    fn find_next(&self, d: &mut MomentData) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Working state of a single walk over one trail mask.
///
/// Built fresh for every evaluation and dropped afterwards.
pub struct MomentData<'a> {
    mask: &'a TrailMask,
    current: Point2<f64>,
    borders: Option<BorderPair>,
    trail: Vec<Point2<f64>>,
    width: Box<dyn WidthEstimator>,
    direction: Box<dyn DirectionEstimator>,
}

/// Step with the direction estimator, measure with the border finder and fall back on the turn
/// handler when the measurement fails.
pub struct BasicLineFinder {
    pub border_finder: Box<dyn BorderFinder>,
    pub turn_handler: Box<dyn AngularTurnHandler>,

    /// Upper bound on the number of points in one walk.
    pub max_points: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> MomentData<'a> {
    /// Begin a walk at `start`, heading up the image, with both estimators reset.
    pub fn new(
        mask: &'a TrailMask,
        start: Point2<f64>,
        mut width: Box<dyn WidthEstimator>,
        mut direction: Box<dyn DirectionEstimator>,
    ) -> Self {
        width.reset();
        direction.reset(-std::f64::consts::FRAC_PI_2);

        Self {
            mask,
            current: start,
            borders: None,
            trail: vec![start],
            width,
            direction,
        }
    }

    pub fn mask(&self) -> &TrailMask {
        self.mask
    }

    pub fn current(&self) -> Point2<f64> {
        self.current
    }

    pub fn borders(&self) -> Option<&BorderPair> {
        self.borders.as_ref()
    }

    pub fn trail(&self) -> &[Point2<f64>] {
        &self.trail
    }

    pub fn into_trail(self) -> Vec<Point2<f64>> {
        self.trail
    }

    pub fn width_estimate(&self) -> Option<f64> {
        self.width.estimate()
    }

    pub fn direction_estimator(&self) -> &dyn DirectionEstimator {
        self.direction.as_ref()
    }

    /// Restart the direction estimator from the given angle.
    pub fn redirect(&mut self, angle: f64) {
        self.direction.reset(angle);
    }

    /// Accept newly measured borders as the next step.
    ///
    /// The midpoint of the borders becomes the current point and is appended to the trail, and
    /// both estimators are updated. Returns the length of the step taken.
    pub fn accept(&mut self, borders: BorderPair) -> f64 {
        let next = borders.midpoint();
        let step = next - self.current;

        self.width.push(borders.width());
        self.direction.push(step);
        self.trail.push(next);
        self.current = next;
        self.borders = Some(borders);

        step.norm()
    }
}

impl LineFinder for BasicLineFinder {
    fn find_next(&self, d: &mut MomentData) -> bool {
        if d.trail.len() >= self.max_points {
            trace!("Walk reached the {} point cap", self.max_points);
            return false;
        }

        let direction = d.direction.angle();
        let expected = d.direction.expected_point(&d.current);

        let borders = match self
            .border_finder
            .find_borders(d.mask, &expected, direction, d.width.estimate())
        {
            Some(b) => b,
            None => match self.turn_handler.detect_and_proceed(
                d,
                &expected,
                direction,
                self.border_finder.as_ref(),
            ) {
                Some(situation) => {
                    d.redirect(situation.direction);
                    situation.borders
                }
                None => {
                    trace!(
                        "Trail lost after {} points near ({:.1}, {:.1})",
                        d.trail.len(),
                        expected.x,
                        expected.y
                    );
                    return false;
                }
            },
        };

        // A step which doesn't move means the walk has stalled
        if distance(&d.current, &borders.midpoint()) < MIN_STEP_PX {
            return false;
        }

        d.accept(borders);
        true
    }
}
