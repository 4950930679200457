//! Tracking control module
//!
//! Runs target selection, error calculation and the yaw controller once per cycle, converting a
//! frame's detections into velocity demands for the vehicle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use params::*;
pub use state::*;
