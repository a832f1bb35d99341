//! # Obstacle avoidance state
//!
//! Drives the configured list of timed maneuvers, one phase per cycle. Once the list is complete
//! the ultrasonic sensor is checked, if the way is clear line following resumes, otherwise the
//! list is driven again.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Duration;

use log::{debug, info};
use util::cancel::Interrupted;

use super::{Equipment, ParamSource, RobotState, StateId};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ObstacleAvoidance {
    params: ParamSource,

    /// Index of the next maneuver phase.
    phase: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ObstacleAvoidance {
    pub fn new(params: ParamSource) -> Self {
        Self { params, phase: 0 }
    }
}

impl RobotState for ObstacleAvoidance {
    fn id(&self) -> StateId {
        StateId::ObstacleAvoidance
    }

    fn begin(&mut self, eqpt: &mut Equipment) {
        self.phase = 0;
        eqpt.actuators.write_motors(0.0, 0.0);
    }

    fn run_cycle(&mut self, eqpt: &mut Equipment) -> Result<StateId, Interrupted> {
        let p = self.params.get();
        let oa = &p.obstacle_avoidance;

        if let Some(m) = oa.maneuvers.get(self.phase) {
            debug!(
                "Maneuver phase {}: ({:.2}, {:.2}) for {:.2} s",
                self.phase, m.left, m.right, m.duration_s
            );
            eqpt.actuators.write_motors(m.left, m.right);
            // An interrupted phase is driven again from the start on the next cycle
            eqpt.cancel.sleep(Duration::from_secs_f64(m.duration_s.max(0.0)))?;
            self.phase += 1;

            if self.phase < oa.maneuvers.len() {
                return Ok(StateId::ObstacleAvoidance);
            }
        }

        eqpt.actuators.write_motors(0.0, 0.0);
        self.phase = 0;

        let sensors = eqpt.sensors.collect(&eqpt.cancel)?;
        match sensors.ultrasonic_cm >= oa.clear_distance_cm {
            true => {
                info!("Way clear at {:.1} cm", sensors.ultrasonic_cm);
                Ok(StateId::LineFollowing)
            }
            false => {
                debug!(
                    "Still blocked at {:.1} cm, repeating maneuvers",
                    sensors.ultrasonic_cm
                );
                Ok(StateId::ObstacleAvoidance)
            }
        }
    }

    fn end(&mut self, eqpt: &mut Equipment) {
        eqpt.actuators.write_motors(0.0, 0.0);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        params::{ManeuverParams, TrailExecParams},
        sim::{ActuatorCommand, RecordingActuators, SimCamera, SimSensors},
    };
    use std::sync::Arc;
    use util::cancel::CancelToken;

    fn setup(ultrasonic_cm: f64) -> (ObstacleAvoidance, Equipment, RecordingActuators) {
        let mut p = TrailExecParams::default();
        p.obstacle_avoidance.clear_distance_cm = 10.0;
        p.obstacle_avoidance.maneuvers = vec![
            ManeuverParams {
                left: -0.5,
                right: -0.5,
                duration_s: 0.01,
            },
            ManeuverParams {
                left: 0.5,
                right: -0.5,
                duration_s: 0.01,
            },
        ];

        let act = RecordingActuators::default();
        let eqpt = Equipment {
            frames: Box::new(SimCamera::unavailable()),
            sensors: Box::new(SimSensors::new(ultrasonic_cm, 0)),
            actuators: Box::new(act.clone()),
            cancel: CancelToken::new(),
        };

        (ObstacleAvoidance::new(Arc::new(p).into()), eqpt, act)
    }

    #[test]
    fn test_maneuvers_then_clear() {
        let (mut oa, mut eqpt, act) = setup(50.0);

        oa.begin(&mut eqpt);
        assert_eq!(oa.run_cycle(&mut eqpt), Ok(StateId::ObstacleAvoidance));
        assert_eq!(oa.run_cycle(&mut eqpt), Ok(StateId::LineFollowing));
        oa.end(&mut eqpt);

        assert_eq!(
            act.commands(),
            vec![
                ActuatorCommand::Motors(0.0, 0.0),
                ActuatorCommand::Motors(-0.5, -0.5),
                ActuatorCommand::Motors(0.5, -0.5),
                ActuatorCommand::Motors(0.0, 0.0),
                ActuatorCommand::Motors(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_repeats_while_blocked() {
        let (mut oa, mut eqpt, act) = setup(3.0);

        oa.begin(&mut eqpt);
        for _ in 0..4 {
            assert_eq!(oa.run_cycle(&mut eqpt), Ok(StateId::ObstacleAvoidance));
        }

        let reverses = act
            .commands()
            .iter()
            .filter(|c| **c == ActuatorCommand::Motors(-0.5, -0.5))
            .count();
        assert_eq!(reverses, 2);
    }

    #[test]
    fn test_interrupted_phase_is_repeated() {
        let (mut oa, mut eqpt, act) = setup(50.0);

        oa.begin(&mut eqpt);
        eqpt.cancel.cancel();
        assert_eq!(oa.run_cycle(&mut eqpt), Err(Interrupted));
        eqpt.cancel.reset();

        assert_eq!(oa.run_cycle(&mut eqpt), Ok(StateId::ObstacleAvoidance));
        let reverses = act
            .commands()
            .iter()
            .filter(|c| **c == ActuatorCommand::Motors(-0.5, -0.5))
            .count();
        assert_eq!(reverses, 2);
    }
}
