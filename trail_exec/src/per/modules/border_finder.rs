//! Trail border finders

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use util::maths::clamp;

use crate::per::{
    sampling::perpendicular_angle,
    BorderPair, Side, TrailMask,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Measures the left and right borders of the trail across an expected point.
pub trait BorderFinder: Send + Sync {
    /// Find the borders around `expected`, searching along the perpendicular of `direction`.
    ///
    /// `width_estimate` is the current smoothed trail width, if any, and is used to size the
    /// search. Returns `None` if the trail is not found or its measured width is out of tolerance.
    fn find_borders(
        &self,
        mask: &TrailMask,
        expected: &Point2<f64>,
        direction: f64,
        width_estimate: Option<f64>,
    ) -> Option<BorderPair>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Walks out from the expected point in both perpendicular directions.
#[derive(Debug, Clone, Copy)]
pub struct BasicBorderFinder {
    /// Distance between samples along the search line.
    pub step_px: f64,

    /// Widths at or below this are rejected.
    pub min_width: f64,

    /// Widths at or above this are rejected.
    pub max_width: f64,

    /// The search on each side goes at most this multiple of the width estimate.
    pub bound_factor: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BasicBorderFinder {
    pub fn new(step_px: f64, min_width: f64, max_width: f64, bound_factor: f64) -> Self {
        Self {
            step_px,
            min_width,
            max_width,
            bound_factor,
        }
    }

    /// Maximum search distance on each side.
    pub fn search_bound(&self, width_estimate: Option<f64>) -> f64 {
        match width_estimate {
            Some(w) => clamp(w * self.bound_factor, (self.min_width, self.max_width)),
            None => self.max_width,
        }
    }

    /// Returns true if the width is strictly inside the accepted range.
    pub fn accepts(&self, width: f64) -> bool {
        width > self.min_width && width < self.max_width
    }
}

impl BorderFinder for BasicBorderFinder {
    fn find_borders(
        &self,
        mask: &TrailMask,
        expected: &Point2<f64>,
        direction: f64,
        width_estimate: Option<f64>,
    ) -> Option<BorderPair> {
        if !mask.is_trail(expected) {
            return None;
        }

        let perp = perpendicular_angle(direction);
        let bound = self.search_bound(width_estimate);

        let borders = BorderPair {
            left: mask.find_border(expected, perp, self.step_px, Side::Left, bound),
            right: mask.find_border(expected, perp, self.step_px, Side::Right, bound),
        };

        match self.accepts(borders.width()) {
            true => Some(borders),
            false => None,
        }
    }
}
