//! # Tracking controllers module
//!
//! This module provides the yaw controller used by TrackCtrl.
//!
//! The controller is a PD law on the lateral pixel error. It runs once per control cycle rather
//! than on wall-clock time, so the derivative term is the change in error since the last cycle
//! and no time step appears in the calculation.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use comms_if::eqpt::RC_LIMIT;
use util::maths::round_clamp_i32;

use super::Gains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PD controller producing yaw rate demands.
#[derive(Debug, Serialize, Clone)]
pub struct PdController {
    /// Proportional gain
    k_p: f64,

    /// Derivative gain
    k_d: f64,

    /// Error from the previous cycle
    prev_error: i64
}

/// Output of one controller step.
#[derive(Debug, Default, Serialize, Copy, Clone, PartialEq)]
pub struct PdOutput {
    /// The unlimited controller output
    pub raw: f64,

    /// The rounded and limited demand
    pub demand: i32,

    /// True if the demand was limited
    pub limited: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PdController {

    /// Create a new controller with the given gains.
    ///
    /// The integral gain is not used.
    pub fn new(gains: &Gains) -> Self {
        Self {
            k_p: gains.k_p,
            k_d: gains.k_d,
            prev_error: 0
        }
    }

    /// Get the demand for the given error, remembering the error for the next cycle.
    ///
    /// If `no_target` is set the demand is forced to zero and zero is remembered as the error,
    /// so that reacquiring a target does not produce a derivative kick from stale data.
    pub fn step(&mut self, error: i64, no_target: bool) -> PdOutput {
        let error = if no_target { 0 } else { error };

        let raw = self.k_p * error as f64
            + self.k_d * (error - self.prev_error) as f64;

        let out = if no_target {
            PdOutput::default()
        }
        else {
            let demand = round_clamp_i32(raw, -RC_LIMIT, RC_LIMIT);
            PdOutput {
                raw,
                demand,
                limited: raw.round().abs() > RC_LIMIT as f64
            }
        };

        self.prev_error = error;

        out
    }

    /// The error remembered from the previous cycle.
    pub fn prev_error(&self) -> i64 {
        self.prev_error
    }

    /// Forget the previous error.
    pub fn reset(&mut self) {
        self.prev_error = 0;
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Stateless form of the PD law.
///
/// Returns `clamp(round(k_p * error + k_d * (error - prev_error)), -100, 100)`.
pub fn pd_step(error: i64, prev_error: i64, gains: &Gains) -> i32 {
    let raw = gains.k_p * error as f64
        + gains.k_d * (error - prev_error) as f64;

    round_clamp_i32(raw, -RC_LIMIT, RC_LIMIT)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
