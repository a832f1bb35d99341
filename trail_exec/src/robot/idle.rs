//! # Idle state

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use util::cancel::Interrupted;

use super::{Equipment, ParamSource, RobotState, StateId};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Keeps the motors stopped and waits one cycle period per cycle.
pub struct Idle {
    params: ParamSource,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Idle {
    pub fn new(params: ParamSource) -> Self {
        Self { params }
    }
}

impl RobotState for Idle {
    fn id(&self) -> StateId {
        StateId::Idle
    }

    fn begin(&mut self, eqpt: &mut Equipment) {
        eqpt.actuators.write_motors(0.0, 0.0);
    }

    fn run_cycle(&mut self, eqpt: &mut Equipment) -> Result<StateId, Interrupted> {
        let period = self.params.get().exec.cycle_period_s.max(0.0);
        eqpt.cancel.sleep(Duration::from_secs_f64(period))?;
        Ok(StateId::Idle)
    }

    fn end(&mut self, _eqpt: &mut Equipment) {}
}
