//! # Execution loop
//!
//! The [`Robot`] owns the control thread. Other threads interact with it only through the run and
//! refresh flags, the cancel token and the cycle counter, all held in [`Shared`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::{debug, info, trace};
use util::cancel::{CancelToken, Interrupted};

use super::{Equipment, Executor, RobotError, RunSummary};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to the running control thread.
pub struct Robot {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<RunSummary>>,
}

/// Data shared between the control thread and its controllers.
struct Shared {
    run: AtomicBool,
    refresh: AtomicBool,
    cancel: CancelToken,
    num_cycles: AtomicU64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Robot {
    /// Start the control thread running the given executor on the given equipment.
    pub fn start(executor: Executor, eqpt: Equipment) -> Result<Self, RobotError> {
        let shared = Arc::new(Shared {
            run: AtomicBool::new(true),
            refresh: AtomicBool::new(false),
            cancel: eqpt.cancel.clone(),
            num_cycles: AtomicU64::new(0),
        });
        let shared_thread = shared.clone();

        let thread = thread::Builder::new()
            .name("robot::control".into())
            .spawn(move || control_thread(shared_thread, executor, eqpt))
            .map_err(RobotError::SpawnFailed)?;

        info!("Control thread started");

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Request that the current state is ended and begun again after its current cycle.
    pub fn refresh(&self) {
        self.shared.refresh.store(true, Ordering::SeqCst);
    }

    /// Abort the cycle currently running, if it is blocked on equipment. The loop restarts the
    /// cycle without ending the state.
    pub fn interrupt(&self) {
        self.shared.cancel.cancel();
    }

    /// Number of cycles completed so far.
    pub fn num_cycles(&self) -> u64 {
        self.shared.num_cycles.load(Ordering::SeqCst)
    }

    /// Returns true while the control thread is running.
    pub fn is_running(&self) -> bool {
        self.shared.run.load(Ordering::SeqCst)
    }

    /// Stop the control thread, waiting for the current state to be ended.
    pub fn stop(mut self) -> Result<RunSummary, RobotError> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<RunSummary, RobotError> {
        self.shared.run.store(false, Ordering::SeqCst);
        self.shared.cancel.cancel();

        match self.thread.take() {
            Some(t) => t.join().map_err(|_| RobotError::JoinFailed),
            None => Ok(RunSummary::default()),
        }
    }
}

impl Drop for Robot {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop_and_join().ok();
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn control_thread(shared: Arc<Shared>, mut exec: Executor, mut eqpt: Equipment) -> RunSummary {
    exec.start(&mut eqpt);

    while shared.run.load(Ordering::SeqCst) {
        match exec.cycle(&mut eqpt, &shared.refresh) {
            Ok(()) => {
                shared.num_cycles.fetch_add(1, Ordering::SeqCst);
            }
            Err(Interrupted) => {
                trace!("Cycle of {} interrupted", exec.current());
                eqpt.cancel.reset();
            }
        }
    }

    debug!("Control loop stopped");
    exec.finish(&mut eqpt);

    exec.into_summary()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::robot::{
        executor::test::{sim_equipment, Call, ScriptedState},
        StateId, StateSet,
    };
    use std::{
        sync::Mutex,
        time::{Duration, Instant},
    };

    fn wait_for<F: Fn() -> bool>(condition: F) {
        let start = Instant::now();
        while !condition() {
            assert!(start.elapsed() < Duration::from_secs(5), "timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn robot() -> (Robot, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut states = StateSet::new();
        states.insert(Box::new(ScriptedState {
            id: StateId::Idle,
            script: Arc::new(Mutex::new(Vec::new())),
            calls: calls.clone(),
        }));

        let exec = Executor::new(states, StateId::Idle).unwrap();
        (Robot::start(exec, sim_equipment()).unwrap(), calls)
    }

    fn count(calls: &Arc<Mutex<Vec<Call>>>, call: Call) -> usize {
        calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    #[test]
    fn test_stop_ends_current_state_once() {
        let (robot, calls) = robot();

        wait_for(|| robot.num_cycles() > 10);
        assert!(robot.is_running());
        let summary = robot.stop().unwrap();

        assert_eq!(count(&calls, Call::Begin(StateId::Idle)), 1);
        assert_eq!(count(&calls, Call::End(StateId::Idle)), 1);
        assert_eq!(calls.lock().unwrap().last(), Some(&Call::End(StateId::Idle)));
        assert!(summary.cycles > 10);
        assert_eq!(summary.activations.get(&StateId::Idle), Some(&1));
    }

    #[test]
    fn test_refresh_restarts_state() {
        let (robot, calls) = robot();

        wait_for(|| robot.num_cycles() > 0);
        robot.refresh();
        wait_for(|| count(&calls, Call::Begin(StateId::Idle)) == 2);
        robot.stop().unwrap();

        assert_eq!(count(&calls, Call::Begin(StateId::Idle)), 2);
        assert_eq!(count(&calls, Call::End(StateId::Idle)), 2);
    }

    #[test]
    fn test_drop_stops_thread() {
        let (robot, calls) = robot();

        wait_for(|| robot.num_cycles() > 0);
        drop(robot);

        assert_eq!(count(&calls, Call::End(StateId::Idle)), 1);
    }
}
