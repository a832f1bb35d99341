//! Trail mask modifiers

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{GrayImage, Luma};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Transforms a trail mask into another of the same dimensions.
pub trait ImageModifier: Send + Sync {
    fn modify(&self, mask: GrayImage) -> GrayImage;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Returns the mask unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

/// Mean filter over a square window of side `2 * radius + 1`.
///
/// Pixels beyond the image edge take the value of the nearest edge pixel. Applied to a binary
/// mask this removes isolated specks and fills pinholes, as thresholding the result at half
/// intensity amounts to a majority vote over the window.
#[derive(Debug, Clone, Copy)]
pub struct BoxBlur {
    pub radius: u32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ImageModifier for PassThrough {
    fn modify(&self, mask: GrayImage) -> GrayImage {
        mask
    }
}

impl BoxBlur {
    pub fn new(radius: u32) -> Self {
        Self { radius }
    }
}

impl ImageModifier for BoxBlur {
    fn modify(&self, mask: GrayImage) -> GrayImage {
        if self.radius == 0 || mask.width() == 0 || mask.height() == 0 {
            return mask;
        }

        // Separable: horizontal pass then vertical pass
        let horiz = blur_pass(&mask, self.radius, true);
        blur_pass(&horiz, self.radius, false)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn blur_pass(src: &GrayImage, radius: u32, horizontal: bool) -> GrayImage {
    let (w, h) = src.dimensions();
    let r = radius as i64;
    let n = (2 * r + 1) as u32;

    GrayImage::from_fn(w, h, |x, y| {
        let mut sum = 0u32;
        for k in -r..=r {
            let (sx, sy) = match horizontal {
                true => (clamp_idx(x as i64 + k, w), y),
                false => (x, clamp_idx(y as i64 + k, h)),
            };
            sum += src.get_pixel(sx, sy)[0] as u32;
        }
        Luma([((sum + n / 2) / n) as u8])
    })
}

fn clamp_idx(i: i64, len: u32) -> u32 {
    i.max(0).min(len as i64 - 1) as u32
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::per::sampling::{TRAIL, TRAIL_LEVEL};

    #[test]
    fn test_blur_preserves_dimensions() {
        let mask = GrayImage::new(13, 9);
        let out = BoxBlur::new(2).modify(mask);
        assert_eq!(out.dimensions(), (13, 9));
    }

    #[test]
    fn test_blur_removes_speck() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, Luma([TRAIL]));

        let out = BoxBlur::new(1).modify(mask);

        assert!(out.pixels().all(|p| p[0] < TRAIL_LEVEL));
    }

    #[test]
    fn test_blur_keeps_uniform_regions() {
        let mask = GrayImage::from_pixel(6, 6, Luma([TRAIL]));
        let out = BoxBlur::new(2).modify(mask.clone());
        assert_eq!(out, mask);

        assert_eq!(PassThrough.modify(mask.clone()), mask);
    }
}
