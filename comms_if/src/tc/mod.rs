//! # Telecommand module
//!
//! Telecommands are the discrete instructions sent to the tracker by the key event source (or by
//! a script). They are serialised as JSON, for example:
//!
//! ```text
//! {"ModeSelect": 3}
//! {"Manual": "Forward"}
//! "Arm"
//! ```

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eqpt::ManualDir;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A telecommand.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tc {
    /// Select an operating mode by its number (1 to 5).
    ModeSelect(u8),

    /// A directional key press, only acted on in manual mode.
    Manual(ManualDir),

    /// The vehicle has taken off, demands may be sent to it.
    Arm,

    /// The vehicle has landed, demands must no longer be sent.
    Disarm,

    /// Stop the tracker.
    Quit,
}

/// Response sent back to the telecommand source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TcResponse {
    /// The TC was accepted
    Ok,

    /// The TC could not be parsed or has invalid content
    Invalid,

    /// The TC is valid but cannot be executed right now
    CannotExecute,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("No TC is bound to the key {0:?}")]
    UnboundKey(char),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Tc {
    /// Parse a TC from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str.trim()).map_err(TcParseError::InvalidJson)
    }

    /// Get the TC bound to a key on the keyboard.
    ///
    /// Bindings:
    /// - `1`..`5`: select mode
    /// - `w`/`s`: forward/back, `a`/`d`: left/right, `r`/`f`: up/down
    /// - `e`/`q`: rotate clockwise/counter clockwise
    /// - `t`: arm (takeoff), `l`: disarm (land)
    /// - escape: quit
    pub fn from_key(key: char) -> Result<Self, TcParseError> {
        let tc = match key {
            '1'..='5' => Tc::ModeSelect(key as u8 - b'0'),
            'w' => Tc::Manual(ManualDir::Forward),
            's' => Tc::Manual(ManualDir::Back),
            'a' => Tc::Manual(ManualDir::Left),
            'd' => Tc::Manual(ManualDir::Right),
            'r' => Tc::Manual(ManualDir::Up),
            'f' => Tc::Manual(ManualDir::Down),
            'e' => Tc::Manual(ManualDir::RotateCw),
            'q' => Tc::Manual(ManualDir::RotateCcw),
            't' => Tc::Arm,
            'l' => Tc::Disarm,
            '\u{1b}' => Tc::Quit,
            _ => return Err(TcParseError::UnboundKey(key)),
        };

        Ok(tc)
    }

    /// Serialise the TC to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_json() {
        assert_eq!(Tc::from_json(r#"{"ModeSelect": 3}"#).unwrap(), Tc::ModeSelect(3));
        assert_eq!(
            Tc::from_json(r#" {"Manual": "RotateCcw"} "#).unwrap(),
            Tc::Manual(ManualDir::RotateCcw)
        );
        assert_eq!(Tc::from_json(r#""Arm""#).unwrap(), Tc::Arm);
        assert!(Tc::from_json(r#"{"Takeoff": 1}"#).is_err());
    }

    #[test]
    fn test_json_form() {
        assert_eq!(Tc::ModeSelect(2).to_json().unwrap(), r#"{"ModeSelect":2}"#);
        assert_eq!(Tc::Quit.to_json().unwrap(), r#""Quit""#);
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(Tc::from_key('1').unwrap(), Tc::ModeSelect(1));
        assert_eq!(Tc::from_key('5').unwrap(), Tc::ModeSelect(5));
        assert_eq!(Tc::from_key('w').unwrap(), Tc::Manual(ManualDir::Forward));
        assert_eq!(Tc::from_key('q').unwrap(), Tc::Manual(ManualDir::RotateCcw));
        assert_eq!(Tc::from_key('t').unwrap(), Tc::Arm);
        assert_eq!(Tc::from_key('\u{1b}').unwrap(), Tc::Quit);
        assert!(Tc::from_key('6').is_err());
        assert!(Tc::from_key('z').is_err());
    }
}
