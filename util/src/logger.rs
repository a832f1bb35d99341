//! Generic logger utility functions
//!
//! Records go to stdout and to the session's log file. Noisy targets, such as the per-step trace of
//! the perception walker, can be capped at a coarser level than the rest of the executable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info, Record};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `target_levels` caps individual targets (and their children) at their own level, for instance
/// `("trail_lib::per", LevelFilter::Debug)` keeps the walker's per-step trace out of the log.
///
/// # Notes
///
/// - `min_level` must be greater than `log::Level::Info`.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    target_levels: &[(&'static str, LevelFilter)],
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let dispatch = target_levels.iter().fold(
        fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{}",
                    format_record(
                        session::get_elapsed_seconds(),
                        record,
                        message,
                        std::thread::current().name()
                    )
                ))
            })
            .level(min_level),
        |dispatch, (target, level)| dispatch.level_for(*target, *level),
    );

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    for (target, level) in target_levels.iter() {
        info!("    Level for {}: {:?}", target, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Format a single record.
///
/// Debug and trace records also carry their target and the emitting thread, which tells the
/// control thread's records apart from the main thread's.
fn format_record(
    elapsed_s: f64,
    record: &Record,
    message: &std::fmt::Arguments,
    thread: Option<&str>,
) -> String {
    if record.level() > log::Level::Info {
        format!(
            "[{:10.6} {}] {} ({}): {}",
            elapsed_s,
            level_to_str(record.level()),
            record.target(),
            thread.unwrap_or("unnamed"),
            message
        )
    } else {
        format!(
            "[{:10.6} {}] {}",
            elapsed_s,
            level_to_str(record.level()),
            message
        )
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}
