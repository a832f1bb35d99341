//! Angular turn handlers
//!
//! When the border finder loses the trail at the expected point the trail may simply have turned
//! more sharply than the smoothed direction can follow. A turn handler tries to explain the loss
//! as such a turn and, if it can, hands back a [`Situation`] that lets walking continue.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use nalgebra::Point2;

use super::BorderFinder;
use crate::per::{
    sampling::{distance, unit},
    BorderPair, MomentData,
};
use util::maths::wrap_pi;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait AngularTurnHandler: Send + Sync {
    /// Attempt to resolve a border search failure at `expected` as a sharp turn.
    ///
    /// Returns `None` if the loss cannot be explained, meaning the trail really has been lost.
    fn detect_and_proceed(
        &self,
        d: &MomentData,
        expected: &Point2<f64>,
        direction: f64,
        border_finder: &dyn BorderFinder,
    ) -> Option<Situation>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A resolved turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Situation {
    /// The next trail point.
    pub point: Point2<f64>,

    /// Borders measured around the point.
    pub borders: BorderPair,

    /// Direction the trail was found in.
    pub direction: f64,
}

/// Probes directions rotated away from the current one.
///
/// Candidates are at `±angle_step`, `±2 * angle_step`, ... up to `max_angle` either side of the
/// current direction, at the same distance as the failed step. The first candidate on the trail
/// with acceptable borders whose midpoint lies ahead of the current point wins.
#[derive(Debug, Clone, Copy)]
pub struct ProbingTurnHandler {
    pub angle_step_rad: f64,
    pub max_angle_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ProbingTurnHandler {
    pub fn new(angle_step_rad: f64, max_angle_rad: f64) -> Self {
        Self {
            angle_step_rad,
            max_angle_rad,
        }
    }

    /// Candidate directions in the order they are probed.
    pub fn candidates(&self, direction: f64) -> Vec<f64> {
        let mut candidates = Vec::new();

        if !(self.angle_step_rad > 0.0) {
            return candidates;
        }

        let mut k = 1.0;
        while k * self.angle_step_rad <= self.max_angle_rad + 1e-9 {
            let offset = k * self.angle_step_rad;
            candidates.push(wrap_pi(direction + offset));
            candidates.push(wrap_pi(direction - offset));
            k += 1.0;
        }

        candidates
    }
}

impl AngularTurnHandler for ProbingTurnHandler {
    fn detect_and_proceed(
        &self,
        d: &MomentData,
        expected: &Point2<f64>,
        direction: f64,
        border_finder: &dyn BorderFinder,
    ) -> Option<Situation> {
        let from = d.current();
        let reach = distance(&from, expected);
        let ahead = unit(direction);

        for candidate in self.candidates(direction) {
            let probe = from + unit(candidate) * reach;

            if !d.mask().is_trail(&probe) {
                continue;
            }

            if let Some(borders) =
                border_finder.find_borders(d.mask(), &probe, candidate, d.width_estimate())
            {
                let point = borders.midpoint();

                // Wide probes can measure along the trail, putting the midpoint behind the walk
                if (point - from).dot(&ahead) <= 0.0 {
                    trace!(
                        "Turn at {:.2} rad leads back to ({:.1}, {:.1}), rejected",
                        candidate,
                        point.x,
                        point.y
                    );
                    continue;
                }

                trace!(
                    "Turn resolved at {:.2} rad from ({:.1}, {:.1})",
                    candidate,
                    from.x,
                    from.y
                );
                return Some(Situation {
                    point,
                    borders,
                    direction: candidate,
                });
            }
        }

        None
    }
}
