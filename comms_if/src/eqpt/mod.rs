//! # Equipment module
//!
//! Data exchanged with the equipment surrounding the controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Face detector output
pub mod det;

/// Vehicle velocity demands
pub mod veh;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use det::{BoundingBox, DetFrame, Detection};
pub use veh::{ManualDir, RcDems, VehDemsResponse, RC_LIMIT};
