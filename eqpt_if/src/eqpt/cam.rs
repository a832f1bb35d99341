//! # Camera Equipment Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use image::RgbImage;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of camera frames.
pub trait FrameSource: Send {
    /// Get the latest frame from the camera.
    ///
    /// Returns `None` if no frame is available this cycle. This is not an error, the caller is
    /// expected to skip perception for the cycle and try again on the next one.
    fn get_frame(&mut self) -> Option<RgbImage>;
}
