//! Utility library for the trail follower software

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod cancel;
pub mod host;
pub mod logger;
pub mod maths;
pub mod params;
pub mod session;
pub mod time;
