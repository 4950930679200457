//! Tracking control module state

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::convert::Infallible;
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{Params, PdController};
use crate::{
    err_calc,
    params::ConfigError,
    target_sel::{self, Target}
};
use comms_if::eqpt::{Detection, RcDems};
use util::{
    archive::{Archived, Archiver, ArchiveError},
    module::State,
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tracking control module state
pub struct TrackCtrl {
    params: Params,

    /// Yaw controller, holds the error from the previous cycle
    yaw_ctrl: PdController,

    report: StatusReport,
    arch_report: Archiver,

    output: Option<RcDems>,
    arch_output: Archiver
}

/// Input data to tracking control.
#[derive(Debug, Default, Clone)]
pub struct InputData {
    /// Detections made on the latest frame, in detector order
    pub detections: Vec<Detection>
}

/// The status report containing the quantities computed during a cycle.
///
/// The report is flat so that it can be archived as a csv row.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    /// Centre x of the selected target
    pub target_cx: i64,

    /// Centre y of the selected target
    pub target_cy: i64,

    /// Area of the selected target
    pub target_area: i64,

    /// True if the target was treated as no target
    pub no_target: bool,

    /// Lateral error used by the yaw controller (zero when there is no target)
    pub lat_error: i64,

    /// Forward/back demand
    pub approach_cmd: i32,

    /// Unlimited yaw controller output
    pub raw_yaw: f64,

    /// Yaw demand sent
    pub yaw_cmd: i32,

    /// True if the yaw demand was limited
    pub yaw_limited: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for TrackCtrl {
    type InitData = Params;
    type InitError = ConfigError;

    type InputData = InputData;
    type OutputData = RcDems;
    type StatusReport = StatusReport;
    type ProcError = Infallible;

    /// Initialise the TrackCtrl module.
    ///
    /// The parameters are validated before use.
    fn init(params: Self::InitData) -> Result<Self, Self::InitError> {
        params.validate()?;

        Ok(Self {
            yaw_ctrl: PdController::new(&params.gains),
            params,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            output: None,
            arch_output: Archiver::default()
        })
    }

    /// Process tracking control.
    ///
    /// Processing involves:
    ///  1. Selecting the target from the detections
    ///  1. Calculating the lateral error and approach demand
    ///  1. Running the yaw controller on the lateral error
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let target = target_sel::select_in_frame(
            &input_data.detections,
            self.params.frame_width,
            self.params.frame_height,
            self.params.min_confidence
        );

        let errors = err_calc::compute_errors(
            &target,
            self.params.frame_width,
            &self.params.area_band,
            self.params.forward_speed,
            self.params.back_speed
        );

        let no_target = self.is_no_target(&target);
        let yaw = self.yaw_ctrl.step(errors.lat_error, no_target);

        self.report = StatusReport {
            target_cx: target.center.0,
            target_cy: target.center.1,
            target_area: target.area,
            no_target,
            lat_error: if no_target { 0 } else { errors.lat_error },
            approach_cmd: errors.approach_cmd,
            raw_yaw: yaw.raw,
            yaw_cmd: yaw.demand,
            yaw_limited: yaw.limited
        };

        if no_target {
            trace!("TrackCtrl: no target");
        }
        else {
            debug!(
                "TrackCtrl: target ({}, {}) area {}, lat err {}, fb {}, yaw {}{}",
                target.center.0,
                target.center.1,
                target.area,
                errors.lat_error,
                errors.approach_cmd,
                yaw.demand,
                if yaw.limited { " (limited)" } else { "" }
            );
        }

        let output = RcDems::tracking(errors.approach_cmd, yaw.demand);
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for TrackCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        self.arch_report.serialise(self.report)?;
        if let Some(output) = self.output {
            self.arch_output.serialise(output)?;
        }

        Ok(())
    }
}

impl TrackCtrl {

    /// Start archiving reports and outputs into the session.
    pub fn init_archives(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_report = Archiver::from_path(
            session, "track_ctrl/status_report.csv"
        )?;
        self.arch_output = Archiver::from_path(
            session, "track_ctrl/output.csv"
        )?;

        Ok(())
    }

    /// Forget the controller's previous error.
    pub fn reset(&mut self) {
        debug!("TrackCtrl reset");
        self.yaw_ctrl.reset();
        self.report = StatusReport::default();
        self.output = None;
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The lateral error remembered from the previous cycle.
    pub fn prev_lat_error(&self) -> i64 {
        self.yaw_ctrl.prev_error()
    }

    /// The most recent status report.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Decide whether the selected target means "no target".
    fn is_no_target(&self, target: &Target) -> bool {
        if self.params.zero_cx_is_no_target {
            target.center.0 == 0
        }
        else {
            target.is_none()
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::BoundingBox;

    fn input(boxes: &[(i32, i32, i32, i32)]) -> InputData {
        InputData {
            detections: boxes
                .iter()
                .map(|&(a, b, c, d)| Detection::new(BoundingBox::new(a, b, c, d), 0.9))
                .collect()
        }
    }

    fn run(ctrl: &mut TrackCtrl, boxes: &[(i32, i32, i32, i32)]) -> (RcDems, StatusReport) {
        match ctrl.proc(&input(boxes)) {
            Ok(r) => r,
            Err(e) => match e {}
        }
    }

    #[test]
    fn test_end_to_end() {
        let mut ctrl = TrackCtrl::init(Params::default()).unwrap();

        let (dems, report) = run(&mut ctrl, &[(100, 100, 200, 200)]);

        assert_eq!(report.lat_error, -210);
        assert_eq!(report.approach_cmd, -20);
        assert!(report.yaw_limited);
        assert_eq!(dems.as_array(), [0, -20, 0, -100]);
        assert_eq!(ctrl.prev_lat_error(), -210);
    }

    #[test]
    fn test_consecutive_ticks() {
        let mut ctrl = TrackCtrl::init(Params::default()).unwrap();

        // Centre x = 410 -> error 50, area 100 -> approach
        let (d, _) = run(&mut ctrl, &[(405, 100, 415, 110)]);
        assert_eq!(d.as_array(), [0, 20, 0, 40]);

        // Centre x = 440 -> error 80
        let (d, _) = run(&mut ctrl, &[(435, 100, 445, 110)]);
        assert_eq!(d.yaw(), 39);
    }

    #[test]
    fn test_no_target() {
        let mut ctrl = TrackCtrl::init(Params::default()).unwrap();
        run(&mut ctrl, &[(100, 100, 200, 200)]);

        let (d, report) = run(&mut ctrl, &[]);
        assert!(d.is_zero());
        assert!(report.no_target);
        assert_eq!(ctrl.prev_lat_error(), 0);

        // Garbage only frames also degrade to no target
        let (d, _) = run(&mut ctrl, &[(10, 10, 10, 10), (-50, 0, 10, 10)]);
        assert!(d.is_zero());
    }

    #[test]
    fn test_zero_cx_override() {
        let mut ctrl = TrackCtrl::init(Params::default()).unwrap();
        run(&mut ctrl, &[(600, 100, 700, 200)]);

        // 1 pixel wide box at the left edge has its centre at x = 0, but a non zero area
        let (d, report) = run(&mut ctrl, &[(0, 0, 1, 100)]);
        assert_eq!(d.yaw(), 0);
        assert_eq!(d.forward_back(), 20);
        assert!(report.no_target);
        assert_eq!(ctrl.prev_lat_error(), 0);
    }

    #[test]
    fn test_zero_cx_tracked_when_disabled() {
        let params = Params {
            zero_cx_is_no_target: false,
            ..Default::default()
        };
        let mut ctrl = TrackCtrl::init(params).unwrap();

        let (d, report) = run(&mut ctrl, &[(0, 0, 1, 100)]);
        assert!(!report.no_target);
        assert_eq!(d.yaw(), -100);
        assert_eq!(ctrl.prev_lat_error(), -360);

        let (d, _) = run(&mut ctrl, &[]);
        assert!(d.is_zero());
    }

    #[test]
    fn test_init_rejects_invalid() {
        let params = Params {
            frame_width: 0,
            ..Default::default()
        };

        assert!(TrackCtrl::init(params).is_err());
    }

    #[test]
    fn test_reset() {
        let mut ctrl = TrackCtrl::init(Params::default()).unwrap();
        run(&mut ctrl, &[(100, 100, 200, 200)]);
        ctrl.reset();

        assert_eq!(ctrl.prev_lat_error(), 0);
        assert_eq!(*ctrl.report(), StatusReport::default());
    }

    #[test]
    fn test_write_without_session() {
        let mut ctrl = TrackCtrl::init(Params::default()).unwrap();
        run(&mut ctrl, &[(100, 100, 200, 200)]);

        assert!(ctrl.write().is_ok());
    }
}
