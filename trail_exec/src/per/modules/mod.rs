//! # Recognition modules
//!
//! Single purpose perception stages. Each stage is a trait with one or more implementations so
//! strategies can be assembled from any combination of them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod border_finder;
pub mod classifier;
pub mod direction;
pub mod intersection;
pub mod modifier;
pub mod start_finder;
pub mod turn_handler;
pub mod width;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use border_finder::{BasicBorderFinder, BorderFinder};
pub use classifier::{BooleanClassifier, BrightnessClassifier, GreenRatioClassifier, Polarity};
pub use direction::{DirectionEstimator, VectorDirectionEstimator};
pub use intersection::{ClosestIntersectionSolver, IntersectionSolver};
pub use modifier::{BoxBlur, ImageModifier, PassThrough};
pub use start_finder::{BottomRowStartFinder, StartFinder};
pub use turn_handler::{AngularTurnHandler, ProbingTurnHandler, Situation};
pub use width::{AveragingWidthEstimator, WidthEstimator};
