//! Intersection solvers for the horizontal band strategy
//!
//! Each sampled band may cross several trail-coloured runs. A solver picks the one that continues
//! the trail.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;

use crate::per::sampling::distance;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait IntersectionSolver: Send + Sync {
    /// Choose one of the `candidates` given the previously chosen point, or `None` for the first
    /// band. `centre` is the centre of the image.
    fn solve(
        &self,
        candidates: &[Point2<f64>],
        previous: Option<&Point2<f64>>,
        centre: &Point2<f64>,
    ) -> Option<Point2<f64>>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Picks the candidate closest to the previous point, or to the image centre if there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosestIntersectionSolver;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl IntersectionSolver for ClosestIntersectionSolver {
    fn solve(
        &self,
        candidates: &[Point2<f64>],
        previous: Option<&Point2<f64>>,
        centre: &Point2<f64>,
    ) -> Option<Point2<f64>> {
        let reference = previous.unwrap_or(centre);

        candidates.iter().copied().fold(None, |best, c| match best {
            Some(b) if distance(&b, reference) <= distance(&c, reference) => Some(b),
            _ => Some(c),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_closest_to_centre_then_previous() {
        let solver = ClosestIntersectionSolver;
        let centre = Point2::new(50.0, 50.0);
        let candidates = [Point2::new(10.0, 90.0), Point2::new(60.0, 90.0)];

        assert_eq!(
            solver.solve(&candidates, None, &centre),
            Some(Point2::new(60.0, 90.0))
        );

        let previous = Point2::new(12.0, 95.0);
        assert_eq!(
            solver.solve(&candidates, Some(&previous), &centre),
            Some(Point2::new(10.0, 90.0))
        );

        assert_eq!(solver.solve(&[], None, &centre), None);
    }
}
