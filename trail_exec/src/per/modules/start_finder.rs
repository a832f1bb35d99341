//! Trail start finders

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;

use crate::per::TrailMask;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Locates the point where the trail enters the image.
pub trait StartFinder: Send + Sync {
    fn find_start(&self, mask: &TrailMask) -> Option<Point2<f64>>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Scans the bottom rows of the image, from the bottom up, for the first run of trail pixels that
/// is at least `min_run_px` long, returning the centre of that run.
#[derive(Debug, Clone, Copy)]
pub struct BottomRowStartFinder {
    /// Number of rows above the bottom edge that are scanned.
    pub rows_from_bottom: u32,

    /// Shortest run accepted as the trail.
    pub min_run_px: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StartFinder for BottomRowStartFinder {
    fn find_start(&self, mask: &TrailMask) -> Option<Point2<f64>> {
        let height = mask.height();
        let rows = self.rows_from_bottom.max(1).min(height);

        (0..rows)
            .map(|i| height - 1 - i)
            .flat_map(|row| mask.row_runs(row))
            .find(|run| run.len() >= self.min_run_px)
            .map(|run| run.midpoint())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::sampling::{test::stripe_mask, TRAIL};
    use image::{GrayImage, Luma};

    #[test]
    fn test_no_trail() {
        let finder = BottomRowStartFinder {
            rows_from_bottom: 5,
            min_run_px: 1,
        };
        assert_eq!(finder.find_start(&TrailMask::new(GrayImage::new(20, 20))), None);
        assert_eq!(finder.find_start(&TrailMask::new(GrayImage::new(0, 0))), None);
    }

    #[test]
    fn test_stripe_start() {
        let finder = BottomRowStartFinder {
            rows_from_bottom: 1,
            min_run_px: 3,
        };
        let start = finder.find_start(&stripe_mask(100, 100, 45, 54)).unwrap();
        assert_eq!(start, Point2::new(49.5, 99.0));
    }

    #[test]
    fn test_short_runs_ignored() {
        let mut img = GrayImage::new(20, 10);
        img.put_pixel(2, 9, Luma([TRAIL]));
        for x in 10..15 {
            img.put_pixel(x, 8, Luma([TRAIL]));
        }

        let finder = BottomRowStartFinder {
            rows_from_bottom: 3,
            min_run_px: 3,
        };
        assert_eq!(
            finder.find_start(&TrailMask::new(img)),
            Some(Point2::new(12.0, 8.0))
        );
    }
}
