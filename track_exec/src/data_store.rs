//! # Data Store

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, trace, warn};
use serde::Serialize;

use comms_if::eqpt::{DetFrame, RcDems};
use util::{
    archive::{Archived, Archiver, ArchiveError},
    session::{self, Session},
};

use crate::{
    cmd_sink::CommandSink,
    mode_mgr::{Mode, ModeMgr, TickOutcome},
    track_ctrl,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of consecutive failures to send demands to the vehicle after which `Hold` is forced.
pub const MAX_VEH_ERROR_LIMIT: u64 = 5;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Set when the executable should stop at the end of this cycle
    pub quit_requested: bool,

    /// If true the vehicle can never be armed
    pub dry_run: bool,

    // Detection
    /// Most recent frame recieved from the detector
    pub latest_frame: Option<DetFrame>,

    /// True if `latest_frame` was recieved this cycle
    pub new_frame: bool,

    /// True if the detector is connected
    pub det_connected: bool,

    /// Cycles since the last frame was recieved, `None` if no frame has been
    cycles_since_frame: Option<u64>,

    /// Cycles without a frame after which tracking runs on an empty frame
    max_frame_gap_cycles: u64,

    // Control
    pub mode_mgr: ModeMgr,
    pub track_ctrl_input: track_ctrl::InputData,
    pub last_outcome: Option<TickOutcome>,

    /// True if tracking control was run this cycle, whether or not its demands were sent
    track_ctrl_ran: bool,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive failures sending demands to the vehicle
    pub num_consec_veh_errors: u64,

    arch_cycle: Archiver,
}

/// One row of the cycle archive.
#[derive(Debug, Serialize)]
struct CycleRecord {
    cycle: u64,
    elapsed_s: f64,
    mode: u8,
    armed: bool,
    frame_id: Option<u64>,
    num_detections: usize,
    sent: bool,
    left_right: i32,
    forward_back: i32,
    up_down: i32,
    yaw: i32,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DataStore {
    pub fn new(mode_mgr: ModeMgr, dry_run: bool, max_frame_gap_cycles: u64) -> Self {
        Self {
            num_cycles: 0,
            quit_requested: false,
            dry_run,
            latest_frame: None,
            new_frame: false,
            det_connected: false,
            cycles_since_frame: None,
            max_frame_gap_cycles,
            mode_mgr,
            track_ctrl_input: track_ctrl::InputData::default(),
            last_outcome: None,
            track_ctrl_ran: false,
            num_consec_cycle_overruns: 0,
            num_consec_veh_errors: 0,
            arch_cycle: Archiver::default(),
        }
    }

    /// Start archiving cycles, and tracking control, into the session.
    pub fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_cycle = Archiver::from_path(session, "track_exec/cycles.csv")?;
        self.mode_mgr.track_ctrl_mut().init_archives(session)
    }

    /// Perform actions required at the start of a cycle.
    pub fn cycle_start(&mut self) {
        self.new_frame = false;
        self.track_ctrl_input = track_ctrl::InputData::default();
        self.last_outcome = None;
        self.track_ctrl_ran = false;
        self.cycles_since_frame = self.cycles_since_frame.map(|n| n.saturating_add(1));
    }

    /// Set the frame recieved this cycle, which becomes the tracking control input.
    pub fn set_frame(&mut self, frame: DetFrame) {
        self.track_ctrl_input = track_ctrl::InputData {
            detections: frame.detections.clone(),
        };
        self.latest_frame = Some(frame);
        self.new_frame = true;
        self.cycles_since_frame = Some(0);
    }

    /// Returns true if the current mode should be stepped this cycle.
    ///
    /// Tracking control runs once per detector frame. If the detector is disconnected, or has
    /// sent nothing for `max_frame_gap_cycles`, it runs on the empty input left by
    /// [`DataStore::cycle_start`] instead, so the vehicle is stopped rather than left on its last
    /// demand. Every other mode is always stepped.
    pub fn track_input_due(&self) -> bool {
        if self.mode_mgr.mode() != Mode::FaceTrack || self.new_frame || !self.det_connected {
            return true;
        }

        match self.cycles_since_frame {
            Some(n) => n >= self.max_frame_gap_cycles,
            None => true,
        }
    }

    /// Step the mode manager with this cycle's tracking input, sending any demands to `sink`.
    pub fn step_mode<S: CommandSink>(&mut self, sink: &mut S) -> Result<TickOutcome, S::Error> {
        if !self.track_input_due() {
            return Ok(TickOutcome::Skipped);
        }

        if self.mode_mgr.mode() == Mode::FaceTrack {
            if !self.new_frame {
                trace!("No fresh detector frame, tracking with no target");
            }
            self.track_ctrl_ran = true;
        }

        self.mode_mgr.step(&self.track_ctrl_input, sink)
    }

    /// True if tracking control was run this cycle.
    pub fn track_ctrl_ran(&self) -> bool {
        self.track_ctrl_ran
    }

    /// Force the `Hold` mode.
    pub fn make_safe(&mut self, reason: &str) {
        if self.mode_mgr.mode() != Mode::Hold {
            warn!("Make safe requested: {}", reason);
            self.mode_mgr.force_hold();
        }
    }

    /// Record that demands reached the vehicle.
    pub fn veh_ok(&mut self) {
        self.num_consec_veh_errors = 0;
    }

    /// Record a failure to send demands to the vehicle.
    ///
    /// Forces `Hold` once [`MAX_VEH_ERROR_LIMIT`] consecutive failures have occured, returning
    /// true if it did so.
    pub fn veh_error(&mut self) -> bool {
        self.num_consec_veh_errors += 1;

        if self.num_consec_veh_errors >= MAX_VEH_ERROR_LIMIT
            && self.mode_mgr.mode() != Mode::Hold
        {
            error!(
                "Maximum number of consecutive vehicle errors ({}) reached",
                MAX_VEH_ERROR_LIMIT
            );
            self.make_safe("vehicle error limit reached");
            true
        } else {
            false
        }
    }
}

impl Archived for DataStore {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let (sent, dems) = match self.last_outcome {
            Some(TickOutcome::Sent(d)) => (true, d),
            Some(TickOutcome::DryRun(d)) => (false, d),
            _ => (false, RcDems::default()),
        };

        self.arch_cycle.serialise(CycleRecord {
            cycle: self.num_cycles,
            elapsed_s: session::get_elapsed_seconds(),
            mode: self.mode_mgr.mode().number(),
            armed: self.mode_mgr.armed(),
            frame_id: self.latest_frame.as_ref().map(|f| f.frame_id),
            num_detections: self.track_ctrl_input.detections.len(),
            sent,
            left_right: dems.left_right(),
            forward_back: dems.forward_back(),
            up_down: dems.up_down(),
            yaw: dems.yaw(),
        })?;

        // Tracking control only has something new to archive if it ran this cycle
        if self.track_ctrl_ran {
            self.mode_mgr.track_ctrl_mut().write()?;
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
