//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software: the data
//! exchanged with the face detector, the vehicle bridge, and the key event
//! source.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands, discrete instructions such as mode selection
pub mod tc;

/// Data definitions for equipment (detector and vehicle)
pub mod eqpt;

/// Network module
pub mod net;
