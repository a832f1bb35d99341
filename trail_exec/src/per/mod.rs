//! # Perception module
//!
//! Turns one [`FrameSnapshot`](crate::snapshot::FrameSnapshot) into an
//! [`Instruction`](crate::snapshot::Instruction). The pipeline is:
//!
//! 1. Classify each pixel of the image as trail or background, producing a trail mask.
//! 2. Modify (smooth) the mask.
//! 3. Locate where the trail enters the image.
//! 4. Walk along the trail, measuring its borders at each step, until it is lost or leaves the
//!    image.
//!
//! Each stage is a small module behind a trait in [`modules`], so they can be swapped and tested on
//! their own. A [`Strategy`] wires a set of modules together.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Pixel sampling and vector geometry on the trail mask
pub mod sampling;

/// The individual recognition modules
pub mod modules;

/// Iterative line walking over one frame
pub mod walker;

/// Strategies combining the modules into a full pipeline
pub mod strategy;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use sampling::{BorderPair, Side, TrailMask};
pub use strategy::{strategy_from_params, HorizontalBandStrategy, Strategy, StrategyError, TrailFollowingStrategy};
pub use walker::MomentData;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;
use std::sync::Arc;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A module configuration value.
///
/// `Fixed` values are set when the module is built. `Live` values are read through the accessor
/// every time they are needed, so a parameter reload is seen on the next read without rebuilding
/// the module.
#[derive(Clone)]
pub enum Setting<T> {
    Fixed(T),
    Live(Arc<dyn Fn() -> T + Send + Sync>),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Clone> Setting<T> {
    /// Create a live setting from an accessor.
    pub fn live<F>(accessor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Setting::Live(Arc::new(accessor))
    }

    /// Read the current value.
    pub fn get(&self) -> T {
        match self {
            Setting::Fixed(v) => v.clone(),
            Setting::Live(f) => f(),
        }
    }
}

impl<T> From<T> for Setting<T> {
    fn from(value: T) -> Self {
        Setting::Fixed(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Setting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setting::Fixed(v) => write!(f, "Fixed({:?})", v),
            Setting::Live(_) => write!(f, "Live"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicU8, Ordering};

    #[test]
    fn test_live_setting_observes_changes() {
        let value = Arc::new(AtomicU8::new(100));
        let v = value.clone();
        let setting = Setting::live(move || v.load(Ordering::SeqCst));

        assert_eq!(setting.get(), 100);
        value.store(42, Ordering::SeqCst);
        assert_eq!(setting.get(), 42);

        let fixed: Setting<u8> = 7.into();
        assert_eq!(fixed.get(), 7);
    }
}
