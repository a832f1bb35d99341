//! # Geometric sampling layer
//!
//! Pixel sampling and vector geometry over a boolean trail mask. All coordinates are in image
//! pixels with the origin at the top left and `y` increasing downwards, so "up the image" is the
//! direction angle `-pi/2`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::GrayImage;
use nalgebra::{Point2, Vector2};

use util::maths::wrap_pi;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Mask values at or above this level are trail.
pub const TRAIL_LEVEL: u8 = 128;

/// Mask value written for trail pixels.
pub const TRAIL: u8 = 255;

/// Mask value written for background pixels.
pub const BACKGROUND: u8 = 0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A classified image, each pixel either trail or background.
#[derive(Debug, Clone)]
pub struct TrailMask {
    mask: GrayImage,
}

/// The left and right edge points of the trail at one cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderPair {
    pub left: Point2<f64>,
    pub right: Point2<f64>,
}

/// A horizontal run of trail pixels in one image row, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub row: u32,
    pub start: u32,
    pub end: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Which side of the direction of travel to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrailMask {
    pub fn new(mask: GrayImage) -> Self {
        Self { mask }
    }

    pub fn image(&self) -> &GrayImage {
        &self.mask
    }

    pub fn into_image(self) -> GrayImage {
        self.mask
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    /// Returns true if the pixel containing the point lies inside the image.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        let (x, y) = pixel_of(point);
        self.contains_px(x, y)
    }

    /// Returns true if the pixel containing the point is trail. Points outside the image are
    /// never trail.
    pub fn is_trail(&self, point: &Point2<f64>) -> bool {
        let (x, y) = pixel_of(point);
        self.is_trail_px(x, y)
    }

    /// Returns true if the given pixel is trail.
    pub fn is_trail_px(&self, x: i64, y: i64) -> bool {
        self.contains_px(x, y) && self.mask.get_pixel(x as u32, y as u32)[0] >= TRAIL_LEVEL
    }

    /// Walk from `from` along `angle` (turned to the given side) in steps of `step_px`, returning
    /// the last point still on the trail before the first background pixel.
    ///
    /// The walk never goes further than `bound_px` from `from`, if no background is met by then
    /// the last sampled point within the bound is returned. If `from` itself is not trail then
    /// `from` is returned.
    pub fn find_border(
        &self,
        from: &Point2<f64>,
        angle: f64,
        step_px: f64,
        side: Side,
        bound_px: f64,
    ) -> Point2<f64> {
        let mut last = *from;

        if !self.is_trail(from) || !(step_px > 0.0) {
            return last;
        }

        let dir = unit(angle) * side.sign();
        let mut travelled = step_px;

        while travelled <= bound_px {
            let p = from + dir * travelled;
            if !self.is_trail(&p) {
                break;
            }
            last = p;
            travelled += step_px;
        }

        last
    }

    /// Find all runs of trail pixels in the given row, left to right.
    pub fn row_runs(&self, row: u32) -> Vec<Run> {
        let mut runs = Vec::new();

        if row >= self.height() {
            return runs;
        }

        let mut start: Option<u32> = None;
        for x in 0..self.width() {
            let trail = self.mask.get_pixel(x, row)[0] >= TRAIL_LEVEL;
            match (trail, start) {
                (true, None) => start = Some(x),
                (false, Some(s)) => {
                    runs.push(Run { row, start: s, end: x - 1 });
                    start = None;
                }
                _ => (),
            }
        }

        if let Some(s) = start {
            runs.push(Run {
                row,
                start: s,
                end: self.width() - 1,
            });
        }

        runs
    }

    fn contains_px(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64
    }
}

impl BorderPair {
    /// Euclidean distance between the two borders.
    pub fn width(&self) -> f64 {
        distance(&self.left, &self.right)
    }

    /// Point halfway between the two borders.
    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.left, &self.right)
    }
}

impl Run {
    /// Number of pixels in the run.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Centre of the run.
    pub fn midpoint(&self) -> Point2<f64> {
        Point2::new((self.start + self.end) as f64 / 2.0, self.row as f64)
    }
}

impl Side {
    fn sign(&self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Angle perpendicular to the given direction, pointing to the right of travel.
pub fn perpendicular_angle(direction: f64) -> f64 {
    wrap_pi(direction + std::f64::consts::FRAC_PI_2)
}

/// Euclidean distance between two points.
pub fn distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Unit vector pointing along the given angle.
pub fn unit(angle: f64) -> Vector2<f64> {
    Vector2::new(angle.cos(), angle.sin())
}

/// Angle of the given vector.
pub fn angle_of(v: &Vector2<f64>) -> f64 {
    v.y.atan2(v.x)
}

/// The pixel containing a point.
fn pixel_of(point: &Point2<f64>) -> (i64, i64) {
    (point.x.round() as i64, point.y.round() as i64)
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// Mask with a vertical stripe covering columns `start..=end`.
    pub(crate) fn stripe_mask(width: u32, height: u32, start: u32, end: u32) -> TrailMask {
        TrailMask::new(GrayImage::from_fn(width, height, |x, _| {
            match x >= start && x <= end {
                true => Luma([TRAIL]),
                false => Luma([BACKGROUND]),
            }
        }))
    }

    #[test]
    fn test_perpendicular_angle() {
        assert_relative_eq!(perpendicular_angle(-FRAC_PI_2), 0.0);
        assert_relative_eq!(perpendicular_angle(0.0), FRAC_PI_2);
        assert_relative_eq!(perpendicular_angle(PI), -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_distance() {
        assert_relative_eq!(distance(&Point2::new(0.0, 0.0), &Point2::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_out_of_image_is_not_trail() {
        let mask = stripe_mask(10, 10, 0, 9);

        assert!(mask.is_trail(&Point2::new(0.0, 0.0)));
        assert!(mask.is_trail(&Point2::new(9.4, 9.4)));
        assert!(!mask.is_trail(&Point2::new(-1.0, 5.0)));
        assert!(!mask.is_trail(&Point2::new(5.0, 10.0)));
        assert!(!mask.contains(&Point2::new(9.6, 0.0)));
    }

    #[test]
    fn test_find_border() {
        let mask = stripe_mask(100, 100, 45, 54);
        let from = Point2::new(50.0, 50.0);
        let perp = perpendicular_angle(-FRAC_PI_2);

        let left = mask.find_border(&from, perp, 1.0, Side::Left, 100.0);
        let right = mask.find_border(&from, perp, 1.0, Side::Right, 100.0);

        assert_relative_eq!(left.x, 45.0, epsilon = 1e-9);
        assert_relative_eq!(right.x, 54.0, epsilon = 1e-9);
        assert_relative_eq!(left.y, 50.0, epsilon = 1e-9);

        // Bound limits the walk
        let bounded = mask.find_border(&from, perp, 1.0, Side::Right, 2.0);
        assert_relative_eq!(bounded.x, 52.0, epsilon = 1e-9);

        // Starting on background returns the start
        let outside = Point2::new(10.0, 50.0);
        assert_eq!(mask.find_border(&outside, perp, 1.0, Side::Left, 100.0), outside);
    }

    #[test]
    fn test_row_runs() {
        let mut img = GrayImage::new(12, 3);
        for x in [1u32, 2, 3, 7, 11].iter() {
            img.put_pixel(*x, 1, Luma([TRAIL]));
        }
        let mask = TrailMask::new(img);

        let runs = mask.row_runs(1);
        assert_eq!(
            runs,
            vec![
                Run { row: 1, start: 1, end: 3 },
                Run { row: 1, start: 7, end: 7 },
                Run { row: 1, start: 11, end: 11 },
            ]
        );
        assert_eq!(runs[0].len(), 3);
        assert_eq!(runs[0].midpoint(), Point2::new(2.0, 1.0));
        assert!(mask.row_runs(0).is_empty());
        assert!(mask.row_runs(3).is_empty());
    }
}
