//! # Tracker library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the tracker crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command sink - the boundary demands are sent through
pub mod cmd_sink;

/// Data store - holds everything the executable carries between cycles
pub mod data_store;

/// Detection client - recieves frames of detections from the face detector
pub mod det_client;

/// Error calculation - lateral error and approach command for a target
pub mod err_calc;

/// Mode manager - operating modes and the armed gate
pub mod mode_mgr;

/// Executable parameters
pub mod params;

/// Target selection - picks the face to track
pub mod target_sel;

/// Telecommand client - recieves telecommands from the key event source
pub mod tc_client;

/// Tracking control module - converts detections into velocity demands
pub mod track_ctrl;

/// Vehicle client - sends demands to the vehicle bridge
pub mod veh_client;
