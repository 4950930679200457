//! # Tracker Executable Parameters
//!
//! This module provides parameters for the tracker executable, and the configuration errors
//! shared by every parameter set in the crate.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::mode_mgr::Mode;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackExecParams {

    /// Network endpoint the face detector publishes frames on
    pub det_endpoint: String,

    /// Network endpoint of the vehicle bridge
    pub veh_endpoint: String,

    /// Network endpoint for the telecommand client
    pub tc_endpoint: String,

    /// Target period of one control cycle.
    ///
    /// Units: seconds
    #[serde(default = "default_cycle_period_s")]
    pub cycle_period_s: f64,

    /// Mode number (1 to 5) to start in
    #[serde(default = "default_initial_mode")]
    pub initial_mode: u8,

    /// If true demands are sent to the vehicle from the first cycle, otherwise an `Arm` TC is
    /// needed first.
    #[serde(default)]
    pub armed: bool,

    /// Magnitude of a manual key press command
    #[serde(default = "default_manual_speed")]
    pub manual_speed: i32,

    /// Number of cycles without a detector frame after which face tracking runs on an empty
    /// frame, stopping the vehicle.
    #[serde(default = "default_max_frame_gap_cycles")]
    pub max_frame_gap_cycles: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Invalid configuration. Parameters are always validated before use, the controller must never
/// run with any of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Frame dimensions must be positive, found {0}x{1}")]
    NonPositiveFrameSize(u32, u32),

    #[error("Area band lower bound must not be negative, found {0}")]
    NegativeAreaBand(i64),

    #[error("Area band is inverted (low = {0}, high = {1})")]
    InvertedAreaBand(i64, i64),

    #[error("Area band bounds are equal ({0}), the dead zone would be empty")]
    EmptyDeadZone(i64),

    #[error("Integral gain must be zero, found {0}")]
    NonZeroIntegralGain(f64),

    #[error("The {0} gain must be finite, found {1}")]
    NonFiniteGain(&'static str, f64),

    #[error("The {0} must be in the range [0, 100], found {1}")]
    SpeedOutOfRange(&'static str, i32),

    #[error("Minimum confidence must be in the range [0, 1], found {0}")]
    InvalidMinConfidence(f32),

    #[error("Cycle period must be positive, found {0} s")]
    InvalidCyclePeriod(f64),

    #[error("Initial mode must be a mode number between 1 and 5, found {0}")]
    InvalidInitialMode(u8),

    #[error("Maximum frame gap must be at least one cycle, found {0}")]
    InvalidFrameGap(u64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrackExecParams {
    /// Check the parameters, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cycle_period_s > 0.0) || !self.cycle_period_s.is_finite() {
            return Err(ConfigError::InvalidCyclePeriod(self.cycle_period_s));
        }

        self.initial_mode()?;

        if self.max_frame_gap_cycles == 0 {
            return Err(ConfigError::InvalidFrameGap(0));
        }

        check_speed("manual speed", self.manual_speed)
    }

    /// The mode to start in.
    pub fn initial_mode(&self) -> Result<Mode, ConfigError> {
        Mode::from_select(self.initial_mode)
            .map_err(|_| ConfigError::InvalidInitialMode(self.initial_mode))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check that a speed is a usable channel magnitude.
pub(crate) fn check_speed(name: &'static str, speed: i32) -> Result<(), ConfigError> {
    if (0..=comms_if::eqpt::RC_LIMIT).contains(&speed) {
        Ok(())
    } else {
        Err(ConfigError::SpeedOutOfRange(name, speed))
    }
}

fn default_cycle_period_s() -> f64 {
    0.05
}

fn default_initial_mode() -> u8 {
    2
}

fn default_manual_speed() -> i32 {
    30
}

fn default_max_frame_gap_cycles() -> u64 {
    10
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
