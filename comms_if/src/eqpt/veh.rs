//! # Vehicle demands
//!
//! The vehicle accepts four velocity channels, each an integer percentage of the vehicle's
//! maximum rate in the range [-100, 100].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Limit of each velocity channel, demands are always within `[-RC_LIMIT, RC_LIMIT]`.
pub const RC_LIMIT: i32 = 100;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Velocity demands for the four vehicle channels.
///
/// The fields can only be set through [`RcDems::new`], which clamps them, so every `RcDems` in
/// existence (including deserialised ones) is within the channel limits.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRcDems")]
pub struct RcDems {
    left_right: i32,
    forward_back: i32,
    up_down: i32,
    yaw: i32,
}

#[derive(Deserialize)]
struct RawRcDems {
    left_right: i32,
    forward_back: i32,
    up_down: i32,
    yaw: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Response from the vehicle bridge to a set of demands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehDemsResponse {
    /// Demands accepted and forwarded to the vehicle
    DemsOk,

    /// Demands could not be understood
    DemsInvalid,

    /// The vehicle is on the ground and will not act on demands
    NotArmed,
}

/// Directional keys available in manual control.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ManualDir {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
    RotateCw,
    RotateCcw,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RcDems {
    /// Create a new set of demands, clamping every channel into `[-RC_LIMIT, RC_LIMIT]`.
    pub fn new(left_right: i32, forward_back: i32, up_down: i32, yaw: i32) -> Self {
        Self {
            left_right: clamp_channel(left_right),
            forward_back: clamp_channel(forward_back),
            up_down: clamp_channel(up_down),
            yaw: clamp_channel(yaw),
        }
    }

    /// Demands for face tracking, which only use the forward/back and yaw channels.
    pub fn tracking(forward_back: i32, yaw: i32) -> Self {
        Self::new(0, forward_back, 0, yaw)
    }

    /// Demands for a manual key press of the given magnitude.
    pub fn manual(dir: ManualDir, speed: i32) -> Self {
        match dir {
            ManualDir::Forward => Self::new(0, speed, 0, 0),
            ManualDir::Back => Self::new(0, -speed, 0, 0),
            ManualDir::Left => Self::new(-speed, 0, 0, 0),
            ManualDir::Right => Self::new(speed, 0, 0, 0),
            ManualDir::Up => Self::new(0, 0, speed, 0),
            ManualDir::Down => Self::new(0, 0, -speed, 0),
            ManualDir::RotateCw => Self::new(0, 0, 0, speed),
            ManualDir::RotateCcw => Self::new(0, 0, 0, -speed),
        }
    }

    pub fn left_right(&self) -> i32 {
        self.left_right
    }

    pub fn forward_back(&self) -> i32 {
        self.forward_back
    }

    pub fn up_down(&self) -> i32 {
        self.up_down
    }

    pub fn yaw(&self) -> i32 {
        self.yaw
    }

    /// The channels in vehicle order: left/right, forward/back, up/down, yaw.
    pub fn as_array(&self) -> [i32; 4] {
        [self.left_right, self.forward_back, self.up_down, self.yaw]
    }

    /// True if every channel is zero, i.e. the vehicle should hover.
    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|&c| c == 0)
    }
}

impl From<RawRcDems> for RcDems {
    fn from(raw: RawRcDems) -> Self {
        Self::new(raw.left_right, raw.forward_back, raw.up_down, raw.yaw)
    }
}

impl From<[i32; 4]> for RcDems {
    fn from(channels: [i32; 4]) -> Self {
        Self::new(channels[0], channels[1], channels[2], channels[3])
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn clamp_channel(value: i32) -> i32 {
    value.max(-RC_LIMIT).min(RC_LIMIT)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_clamps() {
        let d = RcDems::new(150, -150, 99, -100);
        assert_eq!(d.as_array(), [100, -100, 99, -100]);
    }

    #[test]
    fn test_deserialise_clamps() {
        let d: RcDems = serde_json::from_str(
            r#"{"left_right": 0, "forward_back": -20, "up_down": 0, "yaw": -168}"#
        ).unwrap();
        assert_eq!(d.as_array(), [0, -20, 0, -100]);
    }

    #[test]
    fn test_manual_mapping() {
        assert_eq!(RcDems::manual(ManualDir::Forward, 30).as_array(), [0, 30, 0, 0]);
        assert_eq!(RcDems::manual(ManualDir::Back, 30).as_array(), [0, -30, 0, 0]);
        assert_eq!(RcDems::manual(ManualDir::Left, 30).as_array(), [-30, 0, 0, 0]);
        assert_eq!(RcDems::manual(ManualDir::Right, 30).as_array(), [30, 0, 0, 0]);
        assert_eq!(RcDems::manual(ManualDir::Up, 30).as_array(), [0, 0, 30, 0]);
        assert_eq!(RcDems::manual(ManualDir::Down, 30).as_array(), [0, 0, -30, 0]);
        assert_eq!(RcDems::manual(ManualDir::RotateCw, 30).as_array(), [0, 0, 0, 30]);
        assert_eq!(RcDems::manual(ManualDir::RotateCcw, 30).as_array(), [0, 0, 0, -30]);
    }

    #[test]
    fn test_is_zero() {
        assert!(RcDems::default().is_zero());
        assert!(!RcDems::tracking(20, 0).is_zero());
    }
}
