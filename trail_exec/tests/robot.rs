//! # Robot scenario tests
//!
//! Runs the control thread against simulated equipment.

use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use trail_lib::{
    params::{ManeuverParams, TrailExecParams},
    robot::{Equipment, Executor, Robot, RobotState, StateId, StateSet},
    sim::{sim_equipment, LogActuators, SimCamera, SimSensors},
};
use util::{cancel::Interrupted, params::ParamStore};

// ------------------------------------------------------------------------------------------------
// HELPERS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counts {
    begins: usize,
    attempts: usize,
    completed: usize,
    ends: usize,
}

/// State whose cycle is a single sensor read.
struct SensingState {
    counts: Arc<Mutex<Counts>>,
}

impl RobotState for SensingState {
    fn id(&self) -> StateId {
        StateId::LineFollowing
    }

    fn begin(&mut self, _: &mut Equipment) {
        self.counts.lock().unwrap().begins += 1;
    }

    fn run_cycle(&mut self, eqpt: &mut Equipment) -> Result<StateId, Interrupted> {
        self.counts.lock().unwrap().attempts += 1;
        eqpt.sensors.collect(&eqpt.cancel)?;
        self.counts.lock().unwrap().completed += 1;
        Ok(StateId::LineFollowing)
    }

    fn end(&mut self, _: &mut Equipment) {
        self.counts.lock().unwrap().ends += 1;
    }
}

fn wait_for<F: Fn() -> bool>(condition: F) {
    let start = Instant::now();
    while !condition() {
        assert!(start.elapsed() < Duration::from_secs(10), "timed out");
        thread::sleep(Duration::from_millis(1));
    }
}

fn fast_params() -> TrailExecParams {
    let mut p = TrailExecParams::default();
    p.exec.cycle_period_s = 0.001;
    p.line_following.servo_settle_ms = 0;
    p.obstacle_avoidance.maneuvers = vec![ManeuverParams {
        left: -0.5,
        right: -0.5,
        duration_s: 0.001,
    }];
    p.sim.sensor_latency_ms = 0;
    p
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[test]
fn interrupt_restarts_blocked_cycle_without_ending_state() {
    let counts = Arc::new(Mutex::new(Counts::default()));
    let mut states = StateSet::new();
    states.insert(Box::new(SensingState {
        counts: counts.clone(),
    }));
    let exec = Executor::new(states, StateId::LineFollowing).unwrap();

    // Every sensor read blocks for a minute unless interrupted
    let eqpt = Equipment::new(
        Box::new(SimCamera::unavailable()),
        Box::new(SimSensors::new(100.0, 60_000)),
        Box::new(LogActuators::default()),
    );
    let robot = Robot::start(exec, eqpt).unwrap();

    wait_for(|| counts.lock().unwrap().attempts == 1);
    let interrupted_at = Instant::now();
    robot.interrupt();

    // The loop starts the same cycle again promptly
    wait_for(|| counts.lock().unwrap().attempts == 2);
    assert!(interrupted_at.elapsed() < Duration::from_secs(5));
    {
        let c = counts.lock().unwrap();
        assert_eq!(c.begins, 1);
        assert_eq!(c.ends, 0);
        assert_eq!(c.completed, 0);
    }
    assert_eq!(robot.num_cycles(), 0);

    let summary = robot.stop().unwrap();

    let c = counts.lock().unwrap();
    assert_eq!(c.begins, 1);
    assert_eq!(c.ends, 1);
    assert_eq!(summary.cycles, 0);
    assert!(summary.interrupted >= 2);
}

#[test]
fn line_following_runs_on_simulated_equipment() {
    let store = Arc::new(ParamStore::new(fast_params()));
    let states = StateSet::from_store(&store);
    let exec = Executor::new(states, StateId::LineFollowing).unwrap();
    let robot = Robot::start(exec, sim_equipment(&store.current().sim)).unwrap();

    wait_for(|| robot.num_cycles() >= 20);
    let summary = robot.stop().unwrap();

    assert!(summary.cycles >= 20);
    assert_eq!(summary.activations.get(&StateId::LineFollowing), Some(&1));
    assert_eq!(summary.activations.get(&StateId::ObstacleAvoidance), None);
}

#[test]
fn obstacle_hands_over_to_avoidance() {
    let mut p = fast_params();
    p.sim.ultrasonic_cm = 3.0;
    let store = Arc::new(ParamStore::new(p));

    let states = StateSet::from_store(&store);
    let exec = Executor::new(states, StateId::LineFollowing).unwrap();
    let robot = Robot::start(exec, sim_equipment(&store.current().sim)).unwrap();

    wait_for(|| robot.num_cycles() >= 10);
    let summary = robot.stop().unwrap();

    // The obstacle never clears, so avoidance is never left
    assert_eq!(summary.activations.get(&StateId::LineFollowing), Some(&1));
    assert_eq!(summary.activations.get(&StateId::ObstacleAvoidance), Some(&1));
}

#[test]
fn unknown_initial_state_is_rejected() {
    let states = StateSet::new();
    assert!(Executor::new(states, StateId::Idle).is_err());
}
