//! # State executor
//!
//! Runs the current state's cycles and commits the transitions they suggest. The executor is
//! synchronous, the control thread in [`super::exec_loop`] drives it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use serde::Serialize;
use util::cancel::Interrupted;

use super::{Equipment, RobotError, StateId, StateSet};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Executor {
    states: StateSet,
    current: StateId,

    /// True between `begin` and `end` of the current state.
    active: bool,

    summary: RunSummary,
}

/// Counters describing one run of the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Cycles which ran to completion.
    pub cycles: u64,

    /// Cycles cut short by an interrupt.
    pub interrupted: u64,

    /// Number of times each state was begun.
    pub activations: BTreeMap<StateId, u64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Executor {
    /// Create a new executor starting in `initial`, which must be one of the given states.
    pub fn new(states: StateSet, initial: StateId) -> Result<Self, RobotError> {
        if !states.contains(initial) {
            return Err(RobotError::UnknownState(initial));
        }

        Ok(Self {
            states,
            current: initial,
            active: false,
            summary: RunSummary::default(),
        })
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Begin the current state if it isn't already active.
    pub fn start(&mut self, eqpt: &mut Equipment) {
        if !self.active {
            self.begin(self.current, eqpt);
        }
    }

    /// Run one cycle of the current state.
    ///
    /// If the cycle is interrupted it is abandoned with no transition. Otherwise the suggested
    /// state is committed if it differs from the current one, or if `refresh` is set, in which
    /// case the current state is ended and begun again.
    pub fn cycle(&mut self, eqpt: &mut Equipment, refresh: &AtomicBool) -> Result<(), Interrupted> {
        self.start(eqpt);

        let current = self.current;
        let next = match self.states.get_mut(current) {
            Some(state) => state.run_cycle(eqpt),
            None => Ok(current),
        };

        let next = match next {
            Ok(n) => n,
            Err(Interrupted) => {
                self.summary.interrupted += 1;
                return Err(Interrupted);
            }
        };
        self.summary.cycles += 1;

        let next = match self.states.contains(next) {
            true => next,
            false => {
                warn!("Suggested state {} is not available, staying in {}", next, current);
                current
            }
        };

        if next != current || refresh.load(Ordering::SeqCst) {
            refresh.store(false, Ordering::SeqCst);
            self.transition(next, eqpt);
        }

        Ok(())
    }

    /// End the current state and begin `next`, which may be the same state.
    pub fn transition(&mut self, next: StateId, eqpt: &mut Equipment) {
        match next == self.current {
            true => info!("Refreshing {}", next),
            false => info!("Transition {} -> {}", self.current, next),
        }

        self.finish(eqpt);
        self.current = next;
        self.begin(next, eqpt);
    }

    /// End the current state if it is active.
    pub fn finish(&mut self, eqpt: &mut Equipment) {
        if !self.active {
            return;
        }

        debug!("Ending {}", self.current);
        if let Some(state) = self.states.get_mut(self.current) {
            state.end(eqpt);
        }
        self.active = false;
    }

    fn begin(&mut self, id: StateId, eqpt: &mut Equipment) {
        debug!("Beginning {}", id);
        if let Some(state) = self.states.get_mut(id) {
            state.begin(eqpt);
        }
        self.active = true;
        *self.summary.activations.entry(id).or_insert(0) += 1;
    }
}
