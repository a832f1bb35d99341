//! # Perception strategies
//!
//! A strategy is a fixed set of recognition modules plus the algorithm that runs them. All
//! strategies share the two stage contract: [`Strategy::prepare`] with a new snapshot, then
//! [`Strategy::evaluate`] to get the [`Instruction`].
//!
//! Preparing classifies and smooths the image and finds where the trail starts. Evaluating builds
//! a fresh working state from that seed every time it is called, so evaluating the same prepared
//! snapshot twice gives exactly the same result.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::Arc;

use log::trace;
use nalgebra::Point2;
use thiserror::Error;

use super::{
    modules::*,
    walker::{BasicLineFinder, LineFinder},
    MomentData, Setting, TrailMask,
};
use crate::{
    params::{ClassifierParams, StrategyKind, TrailExecParams},
    snapshot::{FrameSnapshot, Instruction},
};
use util::params::ParamStore;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A complete perception pipeline.
pub trait Strategy: Send {
    /// Prepare the strategy for the given snapshot, discarding any previous one.
    fn prepare(&mut self, snapshot: Arc<FrameSnapshot>);

    /// Run the pipeline on the prepared snapshot.
    fn evaluate(&self) -> Result<Instruction, StrategyError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Factory building a fresh width estimator for each walk.
pub type WidthFactory = Box<dyn Fn() -> Box<dyn WidthEstimator> + Send + Sync>;

/// Factory building a fresh direction estimator for each walk.
pub type DirectionFactory = Box<dyn Fn() -> Box<dyn DirectionEstimator> + Send + Sync>;

/// Everything derived from a snapshot in `prepare`.
struct Seed {
    snapshot: Arc<FrameSnapshot>,
    mask: TrailMask,
    start: Option<Point2<f64>>,
}

/// Walks the trail up the image from where it enters at the bottom.
///
/// Used with the camera looking down and forwards at the ground in front of the robot.
pub struct TrailFollowingStrategy {
    classifier: Box<dyn BooleanClassifier>,
    modifier: Box<dyn ImageModifier>,
    start_finder: Box<dyn StartFinder>,
    line_finder: Box<dyn LineFinder>,
    width_factory: WidthFactory,
    direction_factory: DirectionFactory,
    seed: Option<Seed>,
}

/// Samples a set of horizontal bands and picks one trail crossing in each.
///
/// Used with the camera looking further ahead, where the trail crosses many rows at a shallow
/// angle and walking along it is unreliable.
pub struct HorizontalBandStrategy {
    classifier: Box<dyn BooleanClassifier>,
    modifier: Box<dyn ImageModifier>,
    border_finder: Box<dyn BorderFinder>,
    solver: Box<dyn IntersectionSolver>,
    band_levels: Vec<f64>,
    seed: Option<Seed>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("Attempted to evaluate a strategy before preparing it")]
    NotPrepared,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Seed {
    fn new(
        snapshot: Arc<FrameSnapshot>,
        classifier: &dyn BooleanClassifier,
        modifier: &dyn ImageModifier,
    ) -> Self {
        let mask = TrailMask::new(modifier.modify(classifier.classify(snapshot.image())));
        Self {
            snapshot,
            mask,
            start: None,
        }
    }
}

impl TrailFollowingStrategy {
    pub fn new(
        classifier: Box<dyn BooleanClassifier>,
        modifier: Box<dyn ImageModifier>,
        start_finder: Box<dyn StartFinder>,
        line_finder: Box<dyn LineFinder>,
        width_factory: WidthFactory,
        direction_factory: DirectionFactory,
    ) -> Self {
        Self {
            classifier,
            modifier,
            start_finder,
            line_finder,
            width_factory,
            direction_factory,
            seed: None,
        }
    }

    /// The trail mask of the prepared snapshot.
    pub fn mask(&self) -> Option<&TrailMask> {
        self.seed.as_ref().map(|s| &s.mask)
    }
}

impl Strategy for TrailFollowingStrategy {
    fn prepare(&mut self, snapshot: Arc<FrameSnapshot>) {
        let mut seed = Seed::new(snapshot, self.classifier.as_ref(), self.modifier.as_ref());
        seed.start = self.start_finder.find_start(&seed.mask);
        self.seed = Some(seed);
    }

    fn evaluate(&self) -> Result<Instruction, StrategyError> {
        let seed = self.seed.as_ref().ok_or(StrategyError::NotPrepared)?;

        let start = match seed.start {
            Some(s) => s,
            None => {
                trace!("No trail start found");
                return Ok(Instruction::from_trail(Vec::new(), seed.snapshot.clone()));
            }
        };

        let mut d = MomentData::new(
            &seed.mask,
            start,
            (self.width_factory)(),
            (self.direction_factory)(),
        );

        while self.line_finder.find_next(&mut d) {}

        Ok(Instruction::from_trail(d.into_trail(), seed.snapshot.clone()))
    }
}

impl HorizontalBandStrategy {
    pub fn new(
        classifier: Box<dyn BooleanClassifier>,
        modifier: Box<dyn ImageModifier>,
        border_finder: Box<dyn BorderFinder>,
        solver: Box<dyn IntersectionSolver>,
        band_levels: Vec<f64>,
    ) -> Self {
        Self {
            classifier,
            modifier,
            border_finder,
            solver,
            band_levels,
            seed: None,
        }
    }

    /// Image row sampled for the given band level.
    fn band_row(level: f64, height: u32) -> u32 {
        (level * (height.saturating_sub(1)) as f64).round() as u32
    }
}

impl Strategy for HorizontalBandStrategy {
    fn prepare(&mut self, snapshot: Arc<FrameSnapshot>) {
        self.seed = Some(Seed::new(
            snapshot,
            self.classifier.as_ref(),
            self.modifier.as_ref(),
        ));
    }

    fn evaluate(&self) -> Result<Instruction, StrategyError> {
        let seed = self.seed.as_ref().ok_or(StrategyError::NotPrepared)?;
        let mask = &seed.mask;
        let centre = Point2::new(mask.width() as f64 / 2.0, mask.height() as f64 / 2.0);
        let up = -std::f64::consts::FRAC_PI_2;

        let mut trail: Vec<Point2<f64>> = Vec::with_capacity(self.band_levels.len());

        for level in self.band_levels.iter() {
            let row = Self::band_row(*level, mask.height());

            let candidates: Vec<Point2<f64>> = mask
                .row_runs(row)
                .iter()
                .filter_map(|run| {
                    self.border_finder
                        .find_borders(mask, &run.midpoint(), up, None)
                        .map(|b| b.midpoint())
                })
                .collect();

            if let Some(p) = self.solver.solve(&candidates, trail.last(), &centre) {
                trail.push(p);
            }
        }

        Ok(Instruction::from_trail(trail, seed.snapshot.clone()))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the strategy selected in the parameters.
///
/// If a parameter store is given the classifier threshold is read live from it, so a reload is
/// picked up on the next frame. Everything else is fixed when the strategy is built.
pub fn strategy_from_params(
    params: &TrailExecParams,
    store: Option<Arc<ParamStore<TrailExecParams>>>,
) -> Box<dyn Strategy> {
    let per = &params.per;
    let classifier = classifier_from_params(&per.classifier, store);
    let modifier: Box<dyn ImageModifier> = match per.blur_radius {
        0 => Box::new(PassThrough),
        r => Box::new(BoxBlur::new(r)),
    };
    let border_finder = BasicBorderFinder::new(
        per.border_step_px,
        per.min_width_px,
        per.max_width_px,
        per.border_bound_factor,
    );

    match params.exec.strategy {
        StrategyKind::TrailFollowing => {
            let line_finder = BasicLineFinder {
                border_finder: Box::new(border_finder),
                turn_handler: Box::new(ProbingTurnHandler::new(
                    per.turn_angle_step_deg.to_radians(),
                    per.turn_max_angle_deg.to_radians(),
                )),
                max_points: per.max_trail_points,
            };

            let width_window = per.width_window;
            let (step, window) = (per.direction_step_px, per.direction_window);

            Box::new(TrailFollowingStrategy::new(
                classifier,
                modifier,
                Box::new(BottomRowStartFinder {
                    rows_from_bottom: per.start_rows_from_bottom,
                    min_run_px: per.start_min_run_px,
                }),
                Box::new(line_finder),
                Box::new(move || Box::new(AveragingWidthEstimator::new(width_window))),
                Box::new(move || Box::new(VectorDirectionEstimator::new(step, window))),
            ))
        }
        StrategyKind::HorizontalBand => Box::new(HorizontalBandStrategy::new(
            classifier,
            modifier,
            Box::new(border_finder),
            Box::new(ClosestIntersectionSolver),
            per.band_levels.clone(),
        )),
    }
}

fn classifier_from_params(
    classifier: &ClassifierParams,
    store: Option<Arc<ParamStore<TrailExecParams>>>,
) -> Box<dyn BooleanClassifier> {
    match *classifier {
        ClassifierParams::Brightness {
            threshold,
            polarity,
        } => {
            let threshold: Setting<u8> = match store {
                Some(store) => Setting::live(move || match store.current().per.classifier {
                    ClassifierParams::Brightness { threshold, .. } => threshold,
                    _ => threshold,
                }),
                None => threshold.into(),
            };
            Box::new(BrightnessClassifier::new(threshold, polarity))
        }
        ClassifierParams::GreenRatio { ratio } => {
            let ratio: Setting<f64> = match store {
                Some(store) => Setting::live(move || match store.current().per.classifier {
                    ClassifierParams::GreenRatio { ratio, .. } => ratio,
                    _ => ratio,
                }),
                None => ratio.into(),
            };
            Box::new(GreenRatioClassifier::new(ratio))
        }
    }
}
