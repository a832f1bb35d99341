//! # Line following state
//!
//! Each cycle reads the ultrasonic sensor, handing over to obstacle avoidance if something is too
//! close, then captures a frame, evaluates the strategy on it and steers the motors towards the
//! destination.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    collections::VecDeque,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use eqpt_if::{LightId, ServoId};
use log::{info, trace, warn};
use util::cancel::Interrupted;

use super::{Equipment, ParamSource, RobotState, StateId};
use crate::{
    ctrl::{GainsHandle, LinearMotorIntensity, MotorIntensityFunction, PidController, PidGains},
    params::LineFollowingParams,
    per::Strategy,
    snapshot::FrameSnapshot,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of most recent snapshots kept.
const HISTORY_LEN: usize = 2;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct LineFollowing {
    params: ParamSource,
    strategy: Box<dyn Strategy>,
    pid: PidController,
    motors: Box<dyn MotorIntensityFunction>,

    /// Most recent snapshots, newest at the back.
    history: VecDeque<Arc<FrameSnapshot>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LineFollowing {
    /// Create the state, building the controller and motor mapping from the current parameters.
    pub fn new(params: ParamSource, strategy: Box<dyn Strategy>) -> Self {
        let p = params.get();
        let lf = &p.line_following;

        let pid = PidController::new(
            PidGains::from(lf),
            (lf.pid_input_range[0], lf.pid_input_range[1]),
            (lf.pid_output_range[0], lf.pid_output_range[1]),
        );
        let motors = Box::new(LinearMotorIntensity {
            base: lf.motor_base,
            spread: lf.motor_spread,
        });

        Self::with_modules(params, strategy, pid, motors)
    }

    pub fn with_modules(
        params: ParamSource,
        strategy: Box<dyn Strategy>,
        pid: PidController,
        motors: Box<dyn MotorIntensityFunction>,
    ) -> Self {
        Self {
            params,
            strategy,
            pid,
            motors,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    /// Handle through which reloaded gains are applied to the controller.
    pub fn gains_handle(&self) -> GainsHandle {
        self.pid.gains_handle()
    }

    /// The retained snapshots, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Arc<FrameSnapshot>> {
        self.history.iter()
    }

    fn remember(&mut self, snapshot: Arc<FrameSnapshot>) {
        if let Some(prev) = self.history.back() {
            let period = snapshot.captured_at() - prev.captured_at();
            trace!(
                "Frame period: {:.3} s",
                util::time::duration_to_seconds(period).unwrap_or(std::f64::NAN)
            );
        }

        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(snapshot);
    }

    /// Heading error towards the trail in the given snapshot, zero if no trail is found.
    fn evaluate(&mut self, snapshot: Arc<FrameSnapshot>) -> f64 {
        // The strategy is re-seeded from this snapshot alone
        self.strategy.prepare(snapshot);
        match self.strategy.evaluate() {
            Ok(inst) => {
                if inst.destination.is_none() {
                    trace!("No trail found");
                }
                inst.heading_error()
            }
            Err(e) => {
                warn!("Strategy evaluation failed: {}", e);
                0.0
            }
        }
    }

    /// Wait out the rest of the cycle period.
    fn pace(&self, cycle_start: Instant, period_s: f64, eqpt: &Equipment) -> Result<(), Interrupted> {
        if !(period_s > 0.0) {
            return Ok(());
        }

        let period = Duration::from_secs_f64(period_s);
        match period.checked_sub(cycle_start.elapsed()) {
            Some(remaining) => eqpt.cancel.sleep(remaining),
            None => Ok(()),
        }
    }
}

impl RobotState for LineFollowing {
    fn id(&self) -> StateId {
        StateId::LineFollowing
    }

    fn begin(&mut self, eqpt: &mut Equipment) {
        let p = self.params.get();
        let lf = &p.line_following;
        let settle = Duration::from_millis(lf.servo_settle_ms);

        info!("Line following: positioning camera and arm");

        eqpt.actuators.write_servo(ServoId::CameraTilt, lf.camera_up);
        thread::sleep(settle);
        eqpt.actuators.write_servo(ServoId::Arm, lf.arm_normal);
        thread::sleep(settle);
        eqpt.actuators.set_light(LightId::Backlight, true);
        eqpt.actuators.write_servo(ServoId::CameraTilt, lf.camera_down);
        thread::sleep(settle);

        self.pid.reset();
        self.history.clear();
    }

    fn run_cycle(&mut self, eqpt: &mut Equipment) -> Result<StateId, Interrupted> {
        let cycle_start = Instant::now();
        let p = self.params.get();

        let sensors = eqpt.sensors.collect(&eqpt.cancel)?;
        if sensors.ultrasonic_cm < p.line_following.obstacle_threshold_cm {
            info!(
                "Obstacle detected at {:.1} cm, avoiding",
                sensors.ultrasonic_cm
            );
            return Ok(StateId::ObstacleAvoidance);
        }

        // Without a frame the controller is still fed, with no correction
        let heading_error = match eqpt.frames.get_frame() {
            Some(image) => {
                let snapshot = Arc::new(FrameSnapshot::new(image, sensors));
                self.remember(snapshot.clone());
                self.evaluate(snapshot)
            }
            None => {
                trace!("No frame available");
                0.0
            }
        };

        let heading = self.pid.feed(-heading_error);
        let (left, right) = self.motors.intensities(heading);
        trace!(
            "Heading error {:.3}, heading {:.3}, motors ({:.2}, {:.2})",
            heading_error,
            heading,
            left,
            right
        );
        eqpt.actuators.write_motors(left, right);

        self.pace(cycle_start, p.exec.cycle_period_s, eqpt)?;

        Ok(StateId::LineFollowing)
    }

    fn end(&mut self, eqpt: &mut Equipment) {
        eqpt.actuators.set_light(LightId::Backlight, false);
        eqpt.actuators.write_motors(0.0, 0.0);
    }
}

impl From<&LineFollowingParams> for PidGains {
    fn from(p: &LineFollowingParams) -> Self {
        Self {
            k_p: p.k_p,
            k_i: p.k_i,
            k_d: p.k_d,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        params::{SimParams, TrailExecParams},
        per::strategy_from_params,
        sim::{ActuatorCommand, RecordingActuators, SimCamera, SimSensors},
    };
    use util::cancel::CancelToken;

    fn params() -> TrailExecParams {
        let mut p = TrailExecParams::default();
        p.exec.cycle_period_s = 0.0;
        p.line_following.servo_settle_ms = 0;
        p
    }

    fn state(p: &TrailExecParams) -> LineFollowing {
        LineFollowing::new(
            Arc::new(p.clone()).into(),
            strategy_from_params(p, None),
        )
    }

    fn equipment(camera: SimCamera, ultrasonic_cm: f64, actuators: RecordingActuators) -> Equipment {
        Equipment {
            frames: Box::new(camera),
            sensors: Box::new(SimSensors::new(ultrasonic_cm, 0)),
            actuators: Box::new(actuators),
            cancel: CancelToken::new(),
        }
    }

    #[test]
    fn test_begin_and_end_drive_hardware() {
        let p = params();
        let mut lf = state(&p);
        let act = RecordingActuators::default();
        let mut eqpt = equipment(SimCamera::straight(100, 100, 10), 100.0, act.clone());

        lf.begin(&mut eqpt);
        lf.end(&mut eqpt);

        let lfp = &p.line_following;
        assert_eq!(
            act.commands(),
            vec![
                ActuatorCommand::Servo(ServoId::CameraTilt, lfp.camera_up),
                ActuatorCommand::Servo(ServoId::Arm, lfp.arm_normal),
                ActuatorCommand::Light(LightId::Backlight, true),
                ActuatorCommand::Servo(ServoId::CameraTilt, lfp.camera_down),
                ActuatorCommand::Light(LightId::Backlight, false),
                ActuatorCommand::Motors(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_centred_trail_drives_straight() {
        let p = params();
        let mut lf = state(&p);
        let act = RecordingActuators::default();
        let mut eqpt = equipment(SimCamera::straight(100, 100, 10), 100.0, act.clone());

        assert_eq!(lf.run_cycle(&mut eqpt), Ok(StateId::LineFollowing));

        match act.commands().last() {
            Some(ActuatorCommand::Motors(l, r)) => {
                // Stripe centre is half a pixel left of the image centre
                assert!((l - r).abs() < 0.05);
                assert!(*l > 0.0 && *r > 0.0);
            }
            other => panic!("Expected a motor command, got {:?}", other),
        }
    }

    #[test]
    fn test_obstacle_hands_over() {
        let p = params();
        let mut lf = state(&p);
        let act = RecordingActuators::default();
        let mut eqpt = equipment(SimCamera::straight(100, 100, 10), 2.0, act.clone());

        assert_eq!(lf.run_cycle(&mut eqpt), Ok(StateId::ObstacleAvoidance));
        assert!(act.commands().is_empty());
    }

    #[test]
    fn test_history_keeps_two_snapshots() {
        let p = params();
        let mut lf = state(&p);
        let mut eqpt = equipment(
            SimCamera::straight(100, 100, 10),
            100.0,
            RecordingActuators::default(),
        );

        for _ in 0..5 {
            lf.run_cycle(&mut eqpt).unwrap();
        }

        let history: Vec<_> = lf.history().collect();
        assert_eq!(history.len(), 2);
        assert!(history[0].captured_at() <= history[1].captured_at());
    }

    #[test]
    fn test_missing_frame_drives_without_correction() {
        let p = params();
        let mut lf = state(&p);
        let act = RecordingActuators::default();
        let mut eqpt = equipment(SimCamera::unavailable(), 100.0, act.clone());

        assert_eq!(lf.run_cycle(&mut eqpt), Ok(StateId::LineFollowing));

        let lfp = &p.line_following;
        assert_eq!(
            act.commands(),
            vec![ActuatorCommand::Motors(lfp.motor_base, lfp.motor_base)]
        );
        assert_eq!(lf.history().count(), 0);
    }

    #[test]
    fn test_missing_frame_stops_turning() {
        let p = params();
        let mut lf = state(&p);
        let act = RecordingActuators::default();

        // A trail entering the image right of centre makes the robot turn
        let mut eqpt = equipment(
            SimCamera::new(&SimParams {
                bend_row: 100,
                bend_angle_deg: 80.0,
                ..p.sim.clone()
            }),
            100.0,
            act.clone(),
        );
        lf.run_cycle(&mut eqpt).unwrap();
        match act.commands().last() {
            Some(ActuatorCommand::Motors(l, r)) => assert!(l != r),
            other => panic!("Expected a motor command, got {:?}", other),
        }

        eqpt.frames = Box::new(SimCamera::unavailable());
        lf.run_cycle(&mut eqpt).unwrap();

        let lfp = &p.line_following;
        assert_eq!(
            act.commands().last(),
            Some(&ActuatorCommand::Motors(lfp.motor_base, lfp.motor_base))
        );
    }
}
