//! # Mode manager
//!
//! The tracker is always in one of five operating modes, selected by number:
//!
//! | Number | Mode             | Behaviour                                        |
//! |--------|------------------|--------------------------------------------------|
//! | 1      | `Hold`           | Nothing is sent                                  |
//! | 2      | `Manual`         | Each directional key sends a single demand       |
//! | 3      | `FaceTrack`      | Tracking control runs every cycle                |
//! | 4      | `GestureControl` | Reserved, behaves as `Hold`                      |
//! | 5      | `VoiceControl`   | Reserved, behaves as `Hold`                      |
//!
//! Any mode can be selected from any other. Demands only reach the vehicle while it is armed, in
//! `FaceTrack` with the vehicle unarmed the controller still runs but its output is dropped.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use comms_if::eqpt::{ManualDir, RcDems};
use util::module::State;

use crate::{
    cmd_sink::CommandSink,
    track_ctrl::{InputData, TrackCtrl},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Owns the operating mode, the armed flag and the tracking controller.
pub struct ModeMgr {
    mode: Mode,

    armed: bool,

    /// Magnitude of manual key demands
    manual_speed: i32,

    /// Key pressed in manual mode and not yet sent
    pending_manual: Option<ManualDir>,

    track_ctrl: TrackCtrl,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Operating mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Hold,
    Manual,
    FaceTrack,
    GestureControl,
    VoiceControl,
}

/// Events which may change the mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModeEvent {
    /// Switch to the given mode
    Select(Mode),

    /// Directional key press
    Manual(ManualDir),
}

/// What happened to the vehicle during one cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TickOutcome {
    /// The mode does not run anything
    Skipped,

    /// Manual mode with no key pressed
    Idle,

    /// Demands were computed but the vehicle is not armed
    DryRun(RcDems),

    /// Demands were sent to the vehicle
    Sent(RcDems),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("{0} is not a valid mode number, expected 1 to 5")]
    InvalidSelection(u8),

    #[error("Manual keys are ignored in {0:?} mode")]
    NotInManual(Mode),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Mode {
    /// Get the mode for a mode select number.
    pub fn from_select(number: u8) -> Result<Self, ModeError> {
        match number {
            1 => Ok(Mode::Hold),
            2 => Ok(Mode::Manual),
            3 => Ok(Mode::FaceTrack),
            4 => Ok(Mode::GestureControl),
            5 => Ok(Mode::VoiceControl),
            n => Err(ModeError::InvalidSelection(n)),
        }
    }

    /// The mode select number of this mode.
    pub fn number(&self) -> u8 {
        match self {
            Mode::Hold => 1,
            Mode::Manual => 2,
            Mode::FaceTrack => 3,
            Mode::GestureControl => 4,
            Mode::VoiceControl => 5,
        }
    }

    /// The mode after `event`.
    pub fn transition(self, event: &ModeEvent) -> Mode {
        match event {
            ModeEvent::Select(m) => *m,
            ModeEvent::Manual(_) => self,
        }
    }
}

impl ModeMgr {
    pub fn new(track_ctrl: TrackCtrl, initial_mode: Mode, armed: bool, manual_speed: i32) -> Self {
        info!(
            "Starting in {:?} mode, vehicle {}",
            initial_mode,
            if armed { "armed" } else { "not armed" }
        );

        Self {
            mode: initial_mode,
            armed,
            manual_speed,
            pending_manual: None,
            track_ctrl,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn track_ctrl(&self) -> &TrackCtrl {
        &self.track_ctrl
    }

    pub fn track_ctrl_mut(&mut self) -> &mut TrackCtrl {
        &mut self.track_ctrl
    }

    /// Handle a mode event.
    ///
    /// Manual keys are only accepted in manual mode. Entering `FaceTrack` resets the tracking
    /// controller if configured to.
    pub fn handle_event(&mut self, event: ModeEvent) -> Result<(), ModeError> {
        let new_mode = self.mode.transition(&event);

        if new_mode != self.mode {
            info!("Mode change: {:?} -> {:?}", self.mode, new_mode);

            if new_mode == Mode::FaceTrack
                && self.track_ctrl.params().reset_on_face_track_entry
            {
                self.track_ctrl.reset();
            }

            // Keys pressed in manual mode do not carry over
            self.pending_manual = None;
            self.mode = new_mode;
        }

        if let ModeEvent::Manual(dir) = event {
            if self.mode != Mode::Manual {
                return Err(ModeError::NotInManual(self.mode));
            }

            if let Some(prev) = self.pending_manual.replace(dir) {
                debug!("Manual key {:?} replaced by {:?} before being sent", prev, dir);
            }
        }

        Ok(())
    }

    /// Set whether the vehicle is armed.
    pub fn set_armed(&mut self, armed: bool) {
        if armed != self.armed {
            info!("Vehicle {}", if armed { "armed" } else { "disarmed" });
        }
        self.armed = armed;
    }

    /// Put the manager into `Hold`.
    pub fn force_hold(&mut self) {
        if self.mode != Mode::Hold {
            warn!("Forcing Hold mode (was {:?})", self.mode);
            self.mode = Mode::Hold;
            self.pending_manual = None;
        }
    }

    /// Run one cycle of the current mode, sending any demands to `sink`.
    ///
    /// On a sink error the controller has already been updated for this cycle and a pending
    /// manual key has been consumed.
    pub fn step<S: CommandSink>(
        &mut self,
        input: &InputData,
        sink: &mut S,
    ) -> Result<TickOutcome, S::Error> {
        let dems = match self.mode {
            Mode::Hold | Mode::GestureControl | Mode::VoiceControl => {
                return Ok(TickOutcome::Skipped)
            }
            Mode::Manual => match self.pending_manual.take() {
                Some(dir) => RcDems::manual(dir, self.manual_speed),
                None => return Ok(TickOutcome::Idle),
            },
            Mode::FaceTrack => {
                let (dems, _) = self
                    .track_ctrl
                    .proc(input)
                    .unwrap_or_else(|e| match e {});
                dems
            }
        };

        self.gate(dems, sink)
    }

    /// Send zero demands to stop the vehicle, if it is armed.
    pub fn stop<S: CommandSink>(&mut self, sink: &mut S) -> Result<TickOutcome, S::Error> {
        self.pending_manual = None;
        self.gate(RcDems::default(), sink)
    }

    fn gate<S: CommandSink>(&self, dems: RcDems, sink: &mut S) -> Result<TickOutcome, S::Error> {
        if self.armed {
            sink.send_dems(&dems)?;
            Ok(TickOutcome::Sent(dems))
        } else {
            Ok(TickOutcome::DryRun(dems))
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::cmd_sink::test_sinks::{FailingSink, RecordingSink, SinkDown};
    use crate::track_ctrl::Params;
    use comms_if::eqpt::{BoundingBox, Detection};

    fn mgr(mode: Mode, armed: bool, params: Params) -> ModeMgr {
        ModeMgr::new(TrackCtrl::init(params).unwrap(), mode, armed, 30)
    }

    fn face(x_min: i32) -> InputData {
        InputData {
            detections: vec![Detection::new(
                BoundingBox::new(x_min, 100, x_min + 10, 110),
                0.9,
            )],
        }
    }

    #[test]
    fn test_from_select() {
        for n in 1..=5 {
            assert_eq!(Mode::from_select(n).unwrap().number(), n);
        }
        assert_eq!(Mode::from_select(3), Ok(Mode::FaceTrack));
        assert_eq!(Mode::from_select(0), Err(ModeError::InvalidSelection(0)));
        assert_eq!(Mode::from_select(6), Err(ModeError::InvalidSelection(6)));
    }

    #[test]
    fn test_transition() {
        let modes = [
            Mode::Hold,
            Mode::Manual,
            Mode::FaceTrack,
            Mode::GestureControl,
            Mode::VoiceControl,
        ];

        for from in modes.iter() {
            for to in modes.iter() {
                assert_eq!(from.transition(&ModeEvent::Select(*to)), *to);
            }
            assert_eq!(from.transition(&ModeEvent::Manual(ManualDir::Up)), *from);
        }
    }

    #[test]
    fn test_hold_never_sends() {
        let mut sink = RecordingSink::default();

        for mode in [Mode::Hold, Mode::GestureControl, Mode::VoiceControl].iter() {
            let mut m = mgr(*mode, true, Params::default());
            for _ in 0..10 {
                assert_eq!(m.step(&face(400), &mut sink), Ok(TickOutcome::Skipped));
            }
        }

        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_unarmed_face_track_never_sends() {
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::FaceTrack, false, Params::default());

        for _ in 0..10 {
            match m.step(&face(400), &mut sink) {
                Ok(TickOutcome::DryRun(d)) => assert_eq!(d.forward_back(), 20),
                o => panic!("Unexpected outcome {:?}", o),
            }
        }

        assert!(sink.sent.is_empty());
        assert_eq!(m.track_ctrl().prev_lat_error(), 45);
    }

    #[test]
    fn test_armed_face_track_sends() {
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::FaceTrack, true, Params::default());

        // Centre x = 410, error 50
        let outcome = m.step(&face(405), &mut sink).unwrap();

        assert_eq!(outcome, TickOutcome::Sent(RcDems::new(0, 20, 0, 40)));
        assert_eq!(sink.sent, vec![RcDems::new(0, 20, 0, 40)]);
    }

    #[test]
    fn test_manual_one_shot() {
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::Manual, true, Params::default());

        assert_eq!(m.step(&face(400), &mut sink), Ok(TickOutcome::Idle));

        m.handle_event(ModeEvent::Manual(ManualDir::Left)).unwrap();
        assert_eq!(
            m.step(&InputData::default(), &mut sink),
            Ok(TickOutcome::Sent(RcDems::new(-30, 0, 0, 0)))
        );
        assert_eq!(m.step(&InputData::default(), &mut sink), Ok(TickOutcome::Idle));

        m.handle_event(ModeEvent::Manual(ManualDir::RotateCw)).unwrap();
        m.step(&InputData::default(), &mut sink).unwrap();

        assert_eq!(
            sink.sent,
            vec![RcDems::new(-30, 0, 0, 0), RcDems::new(0, 0, 0, 30)]
        );
    }

    #[test]
    fn test_manual_unarmed() {
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::Manual, false, Params::default());

        m.handle_event(ModeEvent::Manual(ManualDir::Forward)).unwrap();
        assert_eq!(
            m.step(&InputData::default(), &mut sink),
            Ok(TickOutcome::DryRun(RcDems::new(0, 30, 0, 0)))
        );
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_manual_key_rejected_outside_manual() {
        let mut m = mgr(Mode::FaceTrack, true, Params::default());

        assert_eq!(
            m.handle_event(ModeEvent::Manual(ManualDir::Up)),
            Err(ModeError::NotInManual(Mode::FaceTrack))
        );
        assert_eq!(m.mode(), Mode::FaceTrack);
    }

    #[test]
    fn test_reset_on_entry() {
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::FaceTrack, true, Params::default());

        m.step(&face(405), &mut sink).unwrap();
        assert_eq!(m.track_ctrl().prev_lat_error(), 50);

        m.handle_event(ModeEvent::Select(Mode::Hold)).unwrap();
        assert_eq!(m.track_ctrl().prev_lat_error(), 50);

        m.handle_event(ModeEvent::Select(Mode::FaceTrack)).unwrap();
        assert_eq!(m.track_ctrl().prev_lat_error(), 0);

        // Error 80 with no derivative history: 0.3 * 80 + 0.5 * 80 = 64
        assert_eq!(
            m.step(&face(435), &mut sink).unwrap(),
            TickOutcome::Sent(RcDems::new(0, 20, 0, 64))
        );
    }

    #[test]
    fn test_stale_error_kept_without_reset() {
        let params = Params {
            reset_on_face_track_entry: false,
            ..Default::default()
        };
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::FaceTrack, true, params);

        m.step(&face(405), &mut sink).unwrap();
        m.handle_event(ModeEvent::Select(Mode::Manual)).unwrap();
        m.handle_event(ModeEvent::Select(Mode::FaceTrack)).unwrap();

        assert_eq!(m.track_ctrl().prev_lat_error(), 50);
        assert_eq!(
            m.step(&face(435), &mut sink).unwrap(),
            TickOutcome::Sent(RcDems::new(0, 20, 0, 39))
        );
    }

    #[test]
    fn test_reselecting_face_track_does_not_reset() {
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::FaceTrack, true, Params::default());

        m.step(&face(405), &mut sink).unwrap();
        m.handle_event(ModeEvent::Select(Mode::FaceTrack)).unwrap();

        assert_eq!(m.track_ctrl().prev_lat_error(), 50);
    }

    #[test]
    fn test_failing_sink() {
        let mut sink = FailingSink::default();
        let mut m = mgr(Mode::FaceTrack, true, Params::default());

        assert_eq!(m.step(&face(405), &mut sink), Err(SinkDown));
        assert_eq!(sink.attempts, 1);

        // The controller still advanced
        assert_eq!(m.track_ctrl().prev_lat_error(), 50);
        assert_eq!(m.mode(), Mode::FaceTrack);

        // Manual keys are consumed even if sending fails
        m.handle_event(ModeEvent::Select(Mode::Manual)).unwrap();
        m.handle_event(ModeEvent::Manual(ManualDir::Down)).unwrap();
        assert_eq!(m.step(&InputData::default(), &mut sink), Err(SinkDown));
        assert_eq!(m.step(&InputData::default(), &mut sink), Ok(TickOutcome::Idle));
    }

    #[test]
    fn test_force_hold_and_stop() {
        let mut sink = RecordingSink::default();
        let mut m = mgr(Mode::FaceTrack, true, Params::default());

        m.force_hold();
        assert_eq!(m.mode(), Mode::Hold);
        assert_eq!(m.step(&face(405), &mut sink), Ok(TickOutcome::Skipped));

        assert_eq!(m.stop(&mut sink), Ok(TickOutcome::Sent(RcDems::default())));
        m.set_armed(false);
        assert_eq!(m.stop(&mut sink), Ok(TickOutcome::DryRun(RcDems::default())));

        assert_eq!(sink.sent, vec![RcDems::default()]);
    }
}
