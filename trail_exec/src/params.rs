//! # Trail Executable Parameters
//!
//! This module provides the parameters for the trail following executable, loaded from
//! `params/trail_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{per::modules::Polarity, robot::StateId};
use util::params::Validate;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailExecParams {
    pub exec: ExecParams,

    pub per: PerParams,

    pub line_following: LineFollowingParams,

    pub obstacle_avoidance: ObstacleAvoidanceParams,

    pub sim: SimParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecParams {
    /// Target duration of one control cycle. Shorter cycles wait out the remainder.
    pub cycle_period_s: f64,

    /// Interval between cycle rate reports.
    pub stats_interval_s: f64,

    /// Interval between checks of the parameter file for changes.
    pub reload_poll_s: f64,

    /// State the robot starts in.
    pub initial_state: StateId,

    /// Perception strategy used by line following.
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerParams {
    pub classifier: ClassifierParams,

    /// Radius of the box blur applied to the trail mask, 0 disables it.
    pub blur_radius: u32,

    /// Number of rows above the bottom edge searched for the trail start.
    pub start_rows_from_bottom: u32,

    /// Shortest run of trail pixels accepted as the trail start.
    pub start_min_run_px: u32,

    /// Distance between samples when searching for a border.
    pub border_step_px: f64,

    /// Lower width limit, exclusive.
    pub min_width_px: f64,

    /// Upper width limit, exclusive.
    pub max_width_px: f64,

    /// Search bound as a multiple of the width estimate.
    pub border_bound_factor: f64,

    /// Number of widths averaged by the width estimator.
    pub width_window: usize,

    /// Length of one walking step.
    pub direction_step_px: f64,

    /// Number of steps averaged by the direction estimator.
    pub direction_window: usize,

    /// Angle between successive turn handler probes.
    pub turn_angle_step_deg: f64,

    /// Largest deviation probed by the turn handler.
    pub turn_max_angle_deg: f64,

    /// Cap on the number of points in one walk.
    pub max_trail_points: usize,

    /// Rows sampled by the horizontal band strategy, as fractions of the image height from the
    /// top, bottom-most first.
    pub band_levels: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineFollowingParams {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,

    /// PID inputs are clamped to this range.
    pub pid_input_range: [f64; 2],

    /// PID outputs are clamped to this range.
    pub pid_output_range: [f64; 2],

    /// Intensity of both motors when driving straight.
    pub motor_base: f64,

    /// Intensity difference added to one side and removed from the other at full heading.
    pub motor_spread: f64,

    /// Ultrasonic readings below this hand over to obstacle avoidance.
    pub obstacle_threshold_cm: f64,

    /// Wait between servo commands for the servos to settle.
    pub servo_settle_ms: u64,

    pub camera_up: i32,
    pub camera_down: i32,
    pub arm_normal: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleAvoidanceParams {
    /// Ultrasonic readings at or above this mean the way is clear.
    pub clear_distance_cm: f64,

    /// Timed motor phases driven one per cycle.
    pub maneuvers: Vec<ManeuverParams>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ManeuverParams {
    pub left: f64,
    pub right: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    pub width: u32,
    pub height: u32,

    /// Width of the rendered trail.
    pub stripe_width_px: u32,

    /// Row above which the trail bends.
    pub bend_row: u32,

    /// Bend angle from vertical, positive to the right. Zero renders a straight trail.
    pub bend_angle_deg: f64,

    /// Distance reported by the simulated ultrasonic sensor.
    pub ultrasonic_cm: f64,

    /// Simulated time taken by one sensor read.
    pub sensor_latency_ms: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TrailFollowing,
    HorizontalBand,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierParams {
    Brightness { threshold: u8, polarity: Polarity },
    GreenRatio { ratio: f64 },
}

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Width limits are inconsistent (min {0}, max {1})")]
    WidthLimits(f64, f64),

    #[error("The {0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("The {0} range is empty or inverted")]
    EmptyRange(&'static str),

    #[error("Band level {0} is outside the image")]
    BandLevel(f64),

    #[error("Motor intensities must be within [-1, 1]")]
    MotorIntensity,

    #[error("The {0} must be a finite, non-negative number of seconds, found {1}")]
    InvalidDuration(&'static str, f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrailExecParams {
    /// Determines if the parameters are valid.
    pub fn are_valid(&self) -> Result<(), ParamsError> {
        let per = &self.per;

        if !(per.min_width_px >= 0.0 && per.min_width_px < per.max_width_px) {
            return Err(ParamsError::WidthLimits(per.min_width_px, per.max_width_px));
        }

        let positive = [
            (self.exec.stats_interval_s, "stats interval"),
            (self.exec.reload_poll_s, "reload poll interval"),
            (per.border_step_px, "border step"),
            (per.border_bound_factor, "border bound factor"),
            (per.direction_step_px, "direction step"),
            (per.turn_angle_step_deg, "turn angle step"),
            (per.width_window as f64, "width window"),
            (per.direction_window as f64, "direction window"),
            (per.max_trail_points as f64, "trail point cap"),
            (self.sim.width as f64, "simulated image width"),
            (self.sim.height as f64, "simulated image height"),
        ];
        for (value, name) in positive.iter() {
            if !(*value > 0.0) {
                return Err(ParamsError::NotPositive(*name));
            }
        }

        // Durations are converted to std durations on the control thread
        let durations = self
            .obstacle_avoidance
            .maneuvers
            .iter()
            .map(|m| (m.duration_s, "maneuver duration"))
            .chain(vec![
                (self.exec.cycle_period_s, "cycle period"),
                (self.exec.stats_interval_s, "stats interval"),
                (self.exec.reload_poll_s, "reload poll interval"),
            ]);
        for (value, name) in durations {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ParamsError::InvalidDuration(name, value));
            }
        }

        let lf = &self.line_following;
        if !(lf.pid_input_range[0] < lf.pid_input_range[1]) {
            return Err(ParamsError::EmptyRange("PID input"));
        }
        if !(lf.pid_output_range[0] < lf.pid_output_range[1]) {
            return Err(ParamsError::EmptyRange("PID output"));
        }

        if let Some(l) = per.band_levels.iter().find(|l| !(**l >= 0.0 && **l <= 1.0)) {
            return Err(ParamsError::BandLevel(*l));
        }

        let intensities = self
            .obstacle_avoidance
            .maneuvers
            .iter()
            .flat_map(|m| vec![m.left, m.right])
            .chain(vec![lf.motor_base]);
        for i in intensities {
            if !(i >= -1.0 && i <= 1.0) {
                return Err(ParamsError::MotorIntensity);
            }
        }

        Ok(())
    }
}

impl Validate for TrailExecParams {
    type Error = ParamsError;

    fn are_valid(&self) -> Result<(), ParamsError> {
        TrailExecParams::are_valid(self)
    }
}

impl Default for TrailExecParams {
    fn default() -> Self {
        Self {
            exec: ExecParams {
                cycle_period_s: 0.05,
                stats_interval_s: 1.0,
                reload_poll_s: 0.5,
                initial_state: StateId::LineFollowing,
                strategy: StrategyKind::TrailFollowing,
            },
            per: PerParams {
                classifier: ClassifierParams::Brightness {
                    threshold: 100,
                    polarity: Polarity::Light,
                },
                blur_radius: 0,
                start_rows_from_bottom: 3,
                start_min_run_px: 3,
                border_step_px: 1.0,
                min_width_px: 3.0,
                max_width_px: 140.0,
                border_bound_factor: 2.0,
                width_window: 3,
                direction_step_px: 8.0,
                direction_window: 3,
                turn_angle_step_deg: 20.0,
                turn_max_angle_deg: 100.0,
                max_trail_points: 200,
                band_levels: vec![0.95, 0.8, 0.65, 0.5, 0.35, 0.2],
            },
            line_following: LineFollowingParams {
                k_p: 1.0,
                k_i: 0.0,
                k_d: 0.0,
                pid_input_range: [
                    -std::f64::consts::FRAC_PI_2,
                    std::f64::consts::FRAC_PI_2,
                ],
                pid_output_range: [
                    -std::f64::consts::FRAC_PI_2,
                    std::f64::consts::FRAC_PI_2,
                ],
                motor_base: 0.5,
                motor_spread: 0.5,
                obstacle_threshold_cm: 6.0,
                servo_settle_ms: 500,
                camera_up: 60,
                camera_down: 170,
                arm_normal: 90,
            },
            obstacle_avoidance: ObstacleAvoidanceParams {
                clear_distance_cm: 10.0,
                maneuvers: vec![
                    ManeuverParams {
                        left: -0.5,
                        right: -0.5,
                        duration_s: 0.5,
                    },
                    ManeuverParams {
                        left: 0.5,
                        right: -0.5,
                        duration_s: 0.6,
                    },
                    ManeuverParams {
                        left: 0.5,
                        right: 0.5,
                        duration_s: 1.0,
                    },
                    ManeuverParams {
                        left: -0.5,
                        right: 0.5,
                        duration_s: 0.6,
                    },
                ],
            },
            sim: SimParams {
                width: 100,
                height: 100,
                stripe_width_px: 10,
                bend_row: 50,
                bend_angle_deg: 0.0,
                ultrasonic_cm: 100.0,
                sensor_latency_ms: 5,
            },
        }
    }
}
