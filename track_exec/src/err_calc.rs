//! # Error calculation
//!
//! Converts the target into the two quantities the controller acts on:
//!
//! - The lateral error, the horizontal offset in pixels of the target's centre from the middle of
//!   the frame. Positive when the target is to the right.
//! - The approach command, a banded forward/back decision made from the target's area. The area
//!   of a face grows as the vehicle gets closer, so an area above the desired band means the
//!   vehicle is too close and must back away, and an area below it means the vehicle must
//!   approach.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::target_sel::Target;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Band of target areas within which the vehicle is at the desired standoff distance.
///
/// Units: pixels^2
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaBand {
    pub low: i64,
    pub high: i64,
}

/// Errors computed for a single target.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Errors {
    /// Horizontal pixel offset of the target from the frame midpoint
    pub lat_error: i64,

    /// Forward/back velocity demand
    pub approach_cmd: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AreaBand {
    /// True if `area` is strictly inside the band (the dead zone).
    pub fn contains(&self, area: i64) -> bool {
        self.low < area && area < self.high
    }
}

impl Default for AreaBand {
    fn default() -> Self {
        Self {
            low: 6200,
            high: 6800,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the lateral error and approach command for a target.
///
/// When the target is [`Target::NONE`] the approach command is zero, but the lateral error is
/// still computed against the origin. Callers must zero it themselves, see
/// [`crate::track_ctrl::TrackCtrl`].
pub fn compute_errors(
    target: &Target,
    frame_width: u32,
    band: &AreaBand,
    forward_speed: i32,
    back_speed: i32,
) -> Errors {
    Errors {
        lat_error: lat_error(target, frame_width),
        approach_cmd: approach_cmd(target.area, band, forward_speed, back_speed),
    }
}

/// Horizontal offset of the target from the frame midpoint.
pub fn lat_error(target: &Target, frame_width: u32) -> i64 {
    target.center.0 - (frame_width / 2) as i64
}

/// Banded approach decision.
///
/// | Area                 | Command          |
/// |----------------------|------------------|
/// | `0`                  | `0`              |
/// | `0 < area <= low`    | `+forward_speed` |
/// | `low < area < high`  | `0`              |
/// | `area >= high`       | `-back_speed`    |
pub fn approach_cmd(area: i64, band: &AreaBand, forward_speed: i32, back_speed: i32) -> i32 {
    if area <= 0 {
        0
    } else if band.contains(area) {
        0
    } else if area >= band.high {
        -back_speed
    } else {
        forward_speed
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const BAND: AreaBand = AreaBand {
        low: 6200,
        high: 6800,
    };

    #[test]
    fn test_lat_error_sign() {
        let right = Target {
            center: (400, 240),
            area: 6500,
        };
        let left = Target {
            center: (300, 240),
            area: 6500,
        };

        assert_eq!(lat_error(&right, 720), 40);
        assert_eq!(lat_error(&left, 720), -60);

        // Odd widths use floor division for the midpoint
        assert_eq!(lat_error(&right, 721), 40);
    }

    #[test]
    fn test_dead_zone() {
        for area in 6201..6800 {
            assert_eq!(approach_cmd(area, &BAND, 20, 20), 0, "area {}", area);
        }
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(approach_cmd(1, &BAND, 20, 20), 20);
        assert_eq!(approach_cmd(6199, &BAND, 20, 20), 20);
        assert_eq!(approach_cmd(6200, &BAND, 20, 20), 20);
        assert_eq!(approach_cmd(6201, &BAND, 20, 20), 0);
        assert_eq!(approach_cmd(6799, &BAND, 20, 20), 0);
        assert_eq!(approach_cmd(6800, &BAND, 20, 20), -20);
        assert_eq!(approach_cmd(100_000, &BAND, 20, 20), -20);
    }

    #[test]
    fn test_speeds_are_separate() {
        assert_eq!(approach_cmd(100, &BAND, 15, 25), 15);
        assert_eq!(approach_cmd(9000, &BAND, 15, 25), -25);
    }

    #[test]
    fn test_no_target_no_approach() {
        let errs = compute_errors(&Target::NONE, 720, &BAND, 20, 20);

        assert_eq!(errs.approach_cmd, 0);
        assert_eq!(errs.lat_error, -360);
    }

    #[test]
    fn test_compute_errors() {
        let target = Target {
            center: (150, 150),
            area: 10_000,
        };

        assert_eq!(
            compute_errors(&target, 720, &BAND, 20, 20),
            Errors {
                lat_error: -210,
                approach_cmd: -20
            }
        );
    }
}
