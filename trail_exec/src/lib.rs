//! # Trail follower library.
//!
//! This library allows the executable, the integration tests and the benchmarks to access items
//! defined inside the trail follower crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Control - PID controller and motor intensity mapping
pub mod ctrl;

/// Parameters of the executable
pub mod params;

/// Perception - finds the trail in a camera frame
pub mod per;

/// Robot - the state machine and the control thread which runs it
pub mod robot;

/// Simulated equipment
pub mod sim;

/// Frame snapshots and the instructions derived from them
pub mod snapshot;
