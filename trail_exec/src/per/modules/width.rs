//! Trail width estimators

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::VecDeque;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Smooths the measured trail width over successive steps.
pub trait WidthEstimator: Send {
    /// Add a newly measured width.
    fn push(&mut self, width: f64);

    /// Current smoothed width, or `None` if nothing has been measured yet.
    fn estimate(&self) -> Option<f64>;

    /// Forget all measurements.
    fn reset(&mut self);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Mean of the last `window` measured widths.
#[derive(Debug, Clone)]
pub struct AveragingWidthEstimator {
    window: usize,
    widths: VecDeque<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AveragingWidthEstimator {
    /// Create a new estimator. A window of zero is treated as one.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            widths: VecDeque::with_capacity(window),
        }
    }
}

impl WidthEstimator for AveragingWidthEstimator {
    fn push(&mut self, width: f64) {
        if self.widths.len() == self.window {
            self.widths.pop_front();
        }
        self.widths.push_back(width);
    }

    fn estimate(&self) -> Option<f64> {
        match self.widths.len() {
            0 => None,
            n => Some(self.widths.iter().sum::<f64>() / n as f64),
        }
    }

    fn reset(&mut self) {
        self.widths.clear();
    }
}
