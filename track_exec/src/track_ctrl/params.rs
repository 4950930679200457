//! Tracking control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::err_calc::AreaBand;
use crate::params::{check_speed, ConfigError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for tracking control
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Params {

    /// Width of the frames the detector runs on.
    ///
    /// Units: pixels
    pub frame_width: u32,

    /// Height of the frames the detector runs on.
    ///
    /// Units: pixels
    pub frame_height: u32,

    /// Target areas inside this band are at the desired standoff distance.
    ///
    /// The band depends on the camera resolution and detector, so it must be retuned when
    /// either changes.
    ///
    /// Units: pixels^2
    pub area_band: AreaBand,

    /// Yaw controller gains
    pub gains: Gains,

    /// Forward demand when the target is too far away
    pub forward_speed: i32,

    /// Backward demand magnitude when the target is too close
    pub back_speed: i32,

    /// Detections below this confidence are ignored
    #[serde(default)]
    pub min_confidence: f32,

    /// Clear the controller's previous error whenever face tracking mode is entered
    #[serde(default = "default_true")]
    pub reset_on_face_track_entry: bool,

    /// Treat a target centred on x = 0 as no target, zeroing the yaw demand.
    ///
    /// If false only an empty target (zero area) is treated as no target.
    #[serde(default = "default_true")]
    pub zero_cx_is_no_target: bool,
}

/// Yaw controller gains.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Gains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain, reserved. Must be zero.
    #[serde(default)]
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::NonPositiveFrameSize(
                self.frame_width,
                self.frame_height
            ));
        }

        let AreaBand { low, high } = self.area_band;
        if low < 0 {
            return Err(ConfigError::NegativeAreaBand(low));
        }
        if low == high {
            return Err(ConfigError::EmptyDeadZone(low));
        }
        if low > high {
            return Err(ConfigError::InvertedAreaBand(low, high));
        }

        self.gains.validate()?;

        check_speed("forward speed", self.forward_speed)?;
        check_speed("back speed", self.back_speed)?;

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidMinConfidence(self.min_confidence));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            frame_width: 720,
            frame_height: 480,
            area_band: AreaBand::default(),
            gains: Gains::default(),
            forward_speed: 20,
            back_speed: 20,
            min_confidence: 0.0,
            reset_on_face_track_entry: true,
            zero_cx_is_no_target: true,
        }
    }
}

impl Gains {
    /// Check the gains are usable by the PD controller.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.k_p.is_finite() {
            return Err(ConfigError::NonFiniteGain("proportional", self.k_p));
        }
        if !self.k_d.is_finite() {
            return Err(ConfigError::NonFiniteGain("derivative", self.k_d));
        }
        if self.k_i != 0.0 {
            return Err(ConfigError::NonZeroIntegralGain(self.k_i));
        }

        Ok(())
    }
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            k_p: 0.3,
            k_i: 0.0,
            k_d: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
