//! # Equipment Interface
//!
//! This module defines the contracts the executive expects its equipment to fulfil.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod act;
pub mod cam;
pub mod sens;
