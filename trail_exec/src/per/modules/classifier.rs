//! Boolean trail/background classifiers

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::per::{
    sampling::{BACKGROUND, TRAIL},
    Setting,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Classifies pixel colours as trail or background.
pub trait BooleanClassifier: Send + Sync {
    /// Returns true if the pixel is part of the trail.
    fn is_trail(&self, pixel: &Rgb<u8>) -> bool;

    /// Classify every pixel of the image, producing a trail mask of the same dimensions.
    fn classify(&self, image: &RgbImage) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            match self.is_trail(image.get_pixel(x, y)) {
                true => Luma([TRAIL]),
                false => Luma([BACKGROUND]),
            }
        })
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Classifies by mean channel brightness against a threshold.
#[derive(Debug, Clone)]
pub struct BrightnessClassifier {
    pub threshold: Setting<u8>,
    pub polarity: Polarity,
}

/// Classifies by how dominant the green channel is over the other two.
///
/// A pixel is trail when `g / (r + b + 1) > ratio`.
#[derive(Debug, Clone)]
pub struct GreenRatioClassifier {
    pub ratio: Setting<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Whether the trail is darker or lighter than its surroundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Pixels strictly darker than the threshold are trail
    Dark,

    /// Pixels at least as bright as the threshold are trail
    Light,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BrightnessClassifier {
    pub fn new<S: Into<Setting<u8>>>(threshold: S, polarity: Polarity) -> Self {
        Self {
            threshold: threshold.into(),
            polarity,
        }
    }

    fn test(threshold: u8, polarity: Polarity, pixel: &Rgb<u8>) -> bool {
        let brightness = brightness(pixel);
        match polarity {
            Polarity::Dark => brightness < threshold as u16,
            Polarity::Light => brightness >= threshold as u16,
        }
    }
}

impl BooleanClassifier for BrightnessClassifier {
    fn is_trail(&self, pixel: &Rgb<u8>) -> bool {
        Self::test(self.threshold.get(), self.polarity, pixel)
    }

    fn classify(&self, image: &RgbImage) -> GrayImage {
        // Read the live threshold once so the whole frame is classified consistently
        let threshold = self.threshold.get();

        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            match Self::test(threshold, self.polarity, image.get_pixel(x, y)) {
                true => Luma([TRAIL]),
                false => Luma([BACKGROUND]),
            }
        })
    }
}

impl GreenRatioClassifier {
    pub fn new<S: Into<Setting<f64>>>(ratio: S) -> Self {
        Self {
            ratio: ratio.into(),
        }
    }

    fn test(ratio: f64, pixel: &Rgb<u8>) -> bool {
        let [r, g, b] = pixel.0;
        g as f64 / (r as f64 + b as f64 + 1.0) > ratio
    }
}

impl BooleanClassifier for GreenRatioClassifier {
    fn is_trail(&self, pixel: &Rgb<u8>) -> bool {
        Self::test(self.ratio.get(), pixel)
    }

    fn classify(&self, image: &RgbImage) -> GrayImage {
        let ratio = self.ratio.get();

        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            match Self::test(ratio, image.get_pixel(x, y)) {
                true => Luma([TRAIL]),
                false => Luma([BACKGROUND]),
            }
        })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Mean of the three colour channels.
fn brightness(pixel: &Rgb<u8>) -> u16 {
    let [r, g, b] = pixel.0;
    (r as u16 + g as u16 + b as u16) / 3
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_brightness_polarity() {
        let light = BrightnessClassifier::new(100u8, Polarity::Light);
        let dark = BrightnessClassifier::new(100u8, Polarity::Dark);

        let white = Rgb([255, 255, 255]);
        let black = Rgb([0, 0, 0]);
        let edge = Rgb([100, 100, 100]);

        assert!(light.is_trail(&white));
        assert!(!light.is_trail(&black));
        assert!(light.is_trail(&edge));

        assert!(!dark.is_trail(&white));
        assert!(dark.is_trail(&black));
        assert!(!dark.is_trail(&edge));
    }

    #[test]
    fn test_green_ratio() {
        let green = GreenRatioClassifier::new(0.64f64);

        assert!(green.is_trail(&Rgb([40, 200, 40])));
        assert!(!green.is_trail(&Rgb([200, 200, 200])));
        assert!(!green.is_trail(&Rgb([0, 0, 0])));
    }

    #[test]
    fn test_classify_preserves_dimensions() {
        let mut img = RgbImage::new(7, 5);
        img.put_pixel(3, 2, Rgb([255, 255, 255]));

        let mask = BrightnessClassifier::new(128u8, Polarity::Light).classify(&img);

        assert_eq!(mask.dimensions(), (7, 5));
        assert_eq!(mask.get_pixel(3, 2)[0], TRAIL);
        assert_eq!(mask.get_pixel(0, 0)[0], BACKGROUND);
    }

    #[test]
    fn test_live_threshold() {
        let threshold = Arc::new(AtomicU8::new(200));
        let t = threshold.clone();
        let classifier =
            BrightnessClassifier::new(Setting::live(move || t.load(Ordering::SeqCst)), Polarity::Light);

        let grey = Rgb([150, 150, 150]);
        assert!(!classifier.is_trail(&grey));

        threshold.store(100, Ordering::SeqCst);
        assert!(classifier.is_trail(&grey));
    }
}
