//! # Robot module
//!
//! The robot is a state machine run by a dedicated control thread. The states are:
//!
//! - `LineFollowing` - Perceive the trail in each frame and steer the motors along it.
//! - `ObstacleAvoidance` - Drive a fixed set of timed maneuvers around an obstacle until the
//!   ultrasonic sensor reports the way is clear.
//! - `Idle` - Do nothing.
//!
//! A state's cycle function only *suggests* the next state. The [`Executor`] alone commits
//! transitions, ending the old state and beginning the new one, so that `begin` and `end` are always
//! called in strict alternation.
//!
//! The [`Robot`] runs an executor on its own thread and provides the thread safe controls:
//! refresh, interrupt and stop.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod exec_loop;
mod executor;
mod idle;
mod line_following;
mod obstacle_avoidance;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use exec_loop::Robot;
pub use executor::{Executor, RunSummary};

pub mod states {
    pub use super::idle::Idle;
    pub use super::line_following::LineFollowing;
    pub use super::obstacle_avoidance::ObstacleAvoidance;
}

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fmt, sync::Arc};

use eqpt_if::{ActuatorSink, FrameSource, SensorSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use util::{
    cancel::{CancelToken, Interrupted},
    params::ParamStore,
};

use crate::{
    ctrl::PidGains,
    params::TrailExecParams,
    per::{strategy_from_params, Setting},
};
use states::*;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// One state of the robot.
///
/// All three functions run on the control thread. `run_cycle` may block on equipment, in which
/// case it must observe the equipment's cancel token and return `Err(Interrupted)` once it is
/// cancelled.
pub trait RobotState: Send {
    fn id(&self) -> StateId;

    /// Prepare the hardware for this state.
    fn begin(&mut self, eqpt: &mut Equipment);

    /// Perform one cycle, returning the suggested next state.
    fn run_cycle(&mut self, eqpt: &mut Equipment) -> Result<StateId, Interrupted>;

    /// Return the hardware to a safe condition.
    fn end(&mut self, eqpt: &mut Equipment);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The equipment collaborators used by the states, plus the token used to interrupt them.
pub struct Equipment {
    pub frames: Box<dyn FrameSource>,
    pub sensors: Box<dyn SensorSource>,
    pub actuators: Box<dyn ActuatorSink>,
    pub cancel: CancelToken,
}

/// One persistent instance of each state.
#[derive(Default)]
pub struct StateSet {
    states: Vec<Box<dyn RobotState>>,
}

/// Parameters as seen by the states, read afresh each cycle.
pub type ParamSource = Setting<Arc<TrailExecParams>>;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateId {
    LineFollowing,
    ObstacleAvoidance,
    Idle,
}

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("No {0} state has been provided")]
    UnknownState(StateId),

    #[error("Could not spawn the control thread: {0}")]
    SpawnFailed(std::io::Error),

    #[error("The control thread panicked")]
    JoinFailed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Equipment {
    pub fn new(
        frames: Box<dyn FrameSource>,
        sensors: Box<dyn SensorSource>,
        actuators: Box<dyn ActuatorSink>,
    ) -> Self {
        Self {
            frames,
            sensors,
            actuators,
            cancel: CancelToken::new(),
        }
    }
}

impl StateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a state, replacing any existing state with the same id.
    pub fn insert(&mut self, state: Box<dyn RobotState>) {
        let id = state.id();
        self.states.retain(|s| s.id() != id);
        self.states.push(state);
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.states.iter().any(|s| s.id() == id)
    }

    pub fn get_mut(&mut self, id: StateId) -> Option<&mut (dyn RobotState + 'static)> {
        self.states
            .iter_mut()
            .find(|s| s.id() == id)
            .map(|s| s.as_mut())
    }

    /// Build the full set of states from the parameter store.
    ///
    /// Every state reads its parameters from the store each cycle, and the line following PID
    /// gains are updated whenever new parameters are installed.
    pub fn from_store(store: &Arc<ParamStore<TrailExecParams>>) -> Self {
        let params = store.current();
        let source = param_source(store);

        let line_following =
            LineFollowing::new(source.clone(), strategy_from_params(&params, Some(store.clone())));

        let gains = line_following.gains_handle();
        store.add_observer(move |p: &TrailExecParams| {
            gains.set(PidGains::from(&p.line_following));
        });

        let mut set = Self::new();
        set.insert(Box::new(line_following));
        set.insert(Box::new(ObstacleAvoidance::new(source.clone())));
        set.insert(Box::new(Idle::new(source)));
        set
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateId::LineFollowing => write!(f, "LineFollowing"),
            StateId::ObstacleAvoidance => write!(f, "ObstacleAvoidance"),
            StateId::Idle => write!(f, "Idle"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parameter source reading the current snapshot of the store.
pub fn param_source(store: &Arc<ParamStore<TrailExecParams>>) -> ParamSource {
    let store = store.clone();
    Setting::live(move || store.current())
}
