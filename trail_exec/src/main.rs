//! Main trail follower executable entry point.
//!
//! # Architecture
//!
//! The robot runs on its own control thread, see [`trail_lib::robot`]. This main thread:
//!
//!     - Initialises the session, logging and parameters
//!     - Builds the states and equipment, then starts the control thread
//!     - Main loop:
//!         - Reports the cycle rate once per stats interval
//!         - Polls the parameter file and reloads it when it changes, then refreshes the current
//!           state so that servo positions are reapplied
//!     - Stops the control thread once the run duration (first argument, in seconds) has elapsed
//!
//! With no run duration the executable runs until killed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, error, info};
use std::{
    env, fs,
    path::Path,
    sync::Arc,
    thread,
    time::{Duration, Instant, SystemTime},
};

// Internal
use trail_lib::{
    params::TrailExecParams,
    robot::{Executor, Robot, RobotError, StateSet},
    sim::sim_equipment,
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    params::ParamStore,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the parameter file, relative to the params directory.
const PARAMS_FILE: &str = "trail_exec.toml";

/// Targets logged at a coarser level than the executable, which would otherwise log every walker
/// step of every cycle.
const LOG_TARGET_LEVELS: [(&str, LevelFilter); 1] = [("trail_lib::per", LevelFilter::Debug)];

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("trail_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &LOG_TARGET_LEVELS, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Trail Follower Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- ARGUMENTS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let run_duration = match args.len() {
        1 => {
            info!("No run duration provided, running until killed");
            None
        }
        2 => {
            let secs: f64 = args[1]
                .parse()
                .wrap_err_with(|| format!("Invalid run duration \"{}\"", args[1]))?;
            if !(secs.is_finite() && secs >= 0.0) {
                return Err(eyre!(
                    "The run duration must be a finite positive number, found {}",
                    secs
                ));
            }
            info!("Running for {:.1} s", secs);
            Some(Duration::from_secs_f64(secs))
        }
        n => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                n - 1
            ))
        }
    };

    // ---- LOAD PARAMETERS ----

    let params: TrailExecParams =
        util::params::load(PARAMS_FILE).wrap_err("Could not load the exec params")?;
    params
        .are_valid()
        .wrap_err("The exec params are invalid")?;

    session
        .save_json("params/trail_exec.json", &params)
        .wrap_err("Failed to save the exec params")?;

    info!("Exec parameters loaded");

    let params_path =
        util::params::param_file_path(PARAMS_FILE).wrap_err("Could not find the params file")?;
    let mut params_modified = modified_time(&params_path);

    let store = Arc::new(ParamStore::new(params));

    // ---- INITIALISE ROBOT ----

    info!("Initialising robot...");

    let initial = store.current().exec.initial_state;
    let states = StateSet::from_store(&store);
    let executor = Executor::new(states, initial).wrap_err("Failed to build the executor")?;
    let eqpt = sim_equipment(&store.current().sim);

    info!("Using simulated equipment");

    let robot = Robot::start(executor, eqpt).wrap_err("Failed to start the robot")?;

    info!("Robot started in {}\n", initial);

    // ---- MAIN LOOP ----

    let start = Instant::now();
    let mut last_stats = Instant::now();
    let mut last_cycles = 0;

    loop {
        let exec = store.current().exec.clone();

        thread::sleep(Duration::from_secs_f64(exec.reload_poll_s));

        // ---- CYCLE RATE ----

        let since_stats = last_stats.elapsed();
        if since_stats.as_secs_f64() >= exec.stats_interval_s {
            let cycles = robot.num_cycles();
            info!(
                "Cycle rate: {:.2} Hz",
                (cycles - last_cycles) as f64 / since_stats.as_secs_f64()
            );
            last_cycles = cycles;
            last_stats = Instant::now();
        }

        // ---- PARAMETER RELOAD ----

        let modified = modified_time(&params_path);
        if modified != params_modified {
            params_modified = modified;
            // Failures are logged by the store, which keeps the previous values
            if store.reload_path(&params_path).is_ok() {
                robot.refresh();
            }
        }

        // ---- RUN DURATION ----

        if let Some(d) = run_duration {
            if start.elapsed() >= d {
                info!("Run duration elapsed, stopping");
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    let summary = match robot.stop() {
        Ok(s) => s,
        Err(RobotError::JoinFailed) => {
            error!("The control thread panicked");
            return Err(eyre!("The control thread panicked"));
        }
        Err(e) => return Err(e).wrap_err("Failed to stop the robot"),
    };

    info!(
        "Completed {} cycles ({} interrupted)",
        summary.cycles, summary.interrupted
    );

    session
        .save_json("run_summary.json", &summary)
        .wrap_err("Failed to save the run summary")?;

    info!("End of execution");

    Ok(())
}

/// Modification time of the given file, or `None` if it cannot be read.
fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
