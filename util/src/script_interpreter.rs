//! # Telecommand script interpreter
//!
//! Scripts replay a timed sequence of telecommands, allowing a tracking session to be repeated
//! without a key event source. Each command is written as
//!
//! ```text
//! <time_s>: <json tc>;
//! ```
//!
//! where `time_s` is the time since the script was started (see [`ScriptInterpreter::start`]) at
//! which the TC is released, for example:
//!
//! ```text
//! 0.0: "Arm";
//! 0.5: {"ModeSelect": 3};
//! 20.0: {"ModeSelect": 1};
//! 21.0: "Quit";
//! ```
//!
//! Any line not matching this form is ignored, so it can be used for comments.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use log::trace;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::tc::{Tc, TcParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A TC and the time it is released at.
#[derive(Debug, Clone)]
struct TimedTc {
    exec_time_s: f64,
    tc: Tc
}

/// A script interpreter.
///
/// Once loaded call [`ScriptInterpreter::start`] then [`ScriptInterpreter::get_pending_tcs`] each
/// cycle to get the TCs which are due.
#[derive(Debug)]
pub struct ScriptInterpreter {
    tcs: VecDeque<TimedTc>,

    duration_s: f64,

    /// Clock time the script was started at
    start_time_s: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(std::path::PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script contains no TCs")]
    ScriptEmpty,

    #[error("Could not build the script line pattern: {0}")]
    PatternError(regex::Error),

    #[error("Script contains an invalid timestamp ({0}), should be a number like 1.0")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid TC at {0} s: {1}")]
    InvalidTc(f64, TcParseError)
}

/// TCs released by the interpreter.
#[derive(Debug, PartialEq)]
pub enum PendingTcs {
    /// Nothing is due yet
    None,

    /// These TCs are due, in script order
    Some(Vec<Tc>),

    /// Every TC has been released
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Load a script from a file.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path.to_path_buf()));
        }

        let script = fs::read_to_string(path)
            .map_err(ScriptError::ScriptLoadError)?;

        Self::from_script_str(&script)
    }

    /// Parse a script held in a string.
    ///
    /// TCs with equal times keep the order they were written in.
    pub fn from_script_str(script: &str) -> Result<Self, ScriptError> {
        let re = RegexBuilder::new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .map_err(ScriptError::PatternError)?;

        let mut tcs = Vec::new();

        for cap in re.captures_iter(script) {
            let time_str = cap.get(1).map_or("", |m| m.as_str());
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|_| ScriptError::InvalidTimestamp(time_str.to_string()))?;

            let tc = Tc::from_json(cap.get(3).map_or("", |m| m.as_str()))
                .map_err(|e| ScriptError::InvalidTc(exec_time_s, e))?;

            tcs.push(TimedTc {
                exec_time_s,
                tc
            });
        }

        if tcs.is_empty() {
            return Err(ScriptError::ScriptEmpty);
        }

        tcs.sort_by(|a, b| {
            a.exec_time_s
                .partial_cmp(&b.exec_time_s)
                .unwrap_or(Ordering::Equal)
        });

        let duration_s = tcs.last().map_or(0.0, |t| t.exec_time_s);

        Ok(Self {
            tcs: tcs.into(),
            duration_s,
            start_time_s: 0.0
        })
    }

    /// Start the script at the clock time `now_s`.
    ///
    /// Script times are measured from this point. If never called the script starts at time
    /// zero.
    pub fn start(&mut self, now_s: f64) {
        self.start_time_s = now_s;
    }

    /// Release every TC due at or before the clock time `current_time_s`.
    pub fn get_pending_tcs(&mut self, current_time_s: f64) -> PendingTcs {
        if self.tcs.is_empty() {
            return PendingTcs::EndOfScript;
        }

        let script_time_s = current_time_s - self.start_time_s;
        let mut due = Vec::new();

        while let Some(next) = self.tcs.front() {
            if next.exec_time_s > script_time_s {
                break;
            }

            if let Some(t) = self.tcs.pop_front() {
                trace!("Script TC due at {} s: {:?}", t.exec_time_s, t.tc);
                due.push(t.tc);
            }
        }

        if due.is_empty() {
            PendingTcs::None
        }
        else {
            PendingTcs::Some(due)
        }
    }

    /// Number of TCs not yet released.
    pub fn get_num_tcs(&self) -> usize {
        self.tcs.len()
    }

    /// Time of the last TC in the script.
    pub fn get_duration(&self) -> f64 {
        self.duration_s
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::ManualDir;

    const SCRIPT: &str = r#"
        # Take off is done by hand before the script starts
        0.0: "Arm";
        0.5: {"ModeSelect": 3};
        10: {"ModeSelect": 2};
        10: {"Manual": "RotateCw"};
        12.25: "Quit";
    "#;

    #[test]
    fn test_parse() {
        let si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();

        assert_eq!(si.get_num_tcs(), 5);
        assert_eq!(si.get_duration(), 12.25);
    }

    #[test]
    fn test_release_order() {
        let mut si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();

        assert_eq!(si.get_pending_tcs(0.0), PendingTcs::Some(vec![Tc::Arm]));
        assert_eq!(si.get_pending_tcs(0.1), PendingTcs::None);
        assert_eq!(si.get_pending_tcs(1.0), PendingTcs::Some(vec![Tc::ModeSelect(3)]));
        assert_eq!(
            si.get_pending_tcs(11.0),
            PendingTcs::Some(vec![Tc::ModeSelect(2), Tc::Manual(ManualDir::RotateCw)])
        );
        assert_eq!(si.get_pending_tcs(100.0), PendingTcs::Some(vec![Tc::Quit]));
        assert_eq!(si.get_pending_tcs(100.0), PendingTcs::EndOfScript);
    }

    #[test]
    fn test_late_start() {
        let mut si = ScriptInterpreter::from_script_str(SCRIPT).unwrap();

        // Startup took 5 s
        si.start(5.0);

        assert_eq!(si.get_pending_tcs(4.9), PendingTcs::None);
        assert_eq!(si.get_pending_tcs(5.0), PendingTcs::Some(vec![Tc::Arm]));
        assert_eq!(si.get_pending_tcs(5.4), PendingTcs::None);
        assert_eq!(si.get_pending_tcs(5.5), PendingTcs::Some(vec![Tc::ModeSelect(3)]));
        assert_eq!(si.get_num_tcs(), 3);
    }

    #[test]
    fn test_unordered_script() {
        let mut si = ScriptInterpreter::from_script_str(
            "2.0: \"Disarm\";\n1.0: \"Arm\";\n"
        ).unwrap();

        assert_eq!(si.get_duration(), 2.0);
        assert_eq!(si.get_pending_tcs(1.5), PendingTcs::Some(vec![Tc::Arm]));
    }

    #[test]
    fn test_load_file() {
        let si = ScriptInterpreter::new(
            concat!(env!("CARGO_MANIFEST_DIR"), "/../scripts/track_20s.txt")
        ).unwrap();

        assert_eq!(si.get_num_tcs(), 4);
        assert_eq!(si.get_duration(), 22.0);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            ScriptInterpreter::from_script_str("nothing to see here"),
            Err(ScriptError::ScriptEmpty)
        ));

        assert!(matches!(
            ScriptInterpreter::from_script_str("1.0: {\"Fly\": 1};"),
            Err(ScriptError::InvalidTc(t, _)) if t == 1.0
        ));

        assert!(matches!(
            ScriptInterpreter::new("/this/script/does/not/exist.txt"),
            Err(ScriptError::ScriptNotFound(_))
        ));
    }
}
