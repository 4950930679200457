//! # Telecommand processor module
//!
//! The telecommand processor handles TCs coming from any source.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use comms_if::tc::{Tc, TcResponse};
use track_lib::{
    data_store::DataStore,
    mode_mgr::{Mode, ModeError, ModeEvent}
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand, returning the response for the TC source.
pub(crate) fn exec(ds: &mut DataStore, tc: &Tc) -> TcResponse {
    debug!("Executing {:?}", tc);

    let result = match tc {
        Tc::ModeSelect(n) => Mode::from_select(*n)
            .and_then(|m| ds.mode_mgr.handle_event(ModeEvent::Select(m))),
        Tc::Manual(dir) => ds.mode_mgr.handle_event(ModeEvent::Manual(*dir)),
        Tc::Arm => {
            if ds.dry_run {
                warn!("Arm ignored, running in dry run mode");
                return TcResponse::CannotExecute;
            }
            ds.mode_mgr.set_armed(true);
            Ok(())
        },
        Tc::Disarm => {
            ds.mode_mgr.set_armed(false);
            Ok(())
        },
        Tc::Quit => {
            info!("Quit requested");
            ds.quit_requested = true;
            Ok(())
        }
    };

    match result {
        Ok(()) => TcResponse::Ok,
        Err(e @ ModeError::InvalidSelection(_)) => {
            warn!("Rejected {:?}: {}", tc, e);
            TcResponse::Invalid
        },
        Err(e @ ModeError::NotInManual(_)) => {
            debug!("Cannot execute {:?}: {}", tc, e);
            TcResponse::CannotExecute
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::ManualDir;
    use track_lib::{
        mode_mgr::ModeMgr,
        track_ctrl::{Params, TrackCtrl}
    };
    use util::module::State;

    fn ds(dry_run: bool) -> DataStore {
        let mgr = ModeMgr::new(
            TrackCtrl::init(Params::default()).unwrap(),
            Mode::Manual,
            false,
            30
        );
        DataStore::new(mgr, dry_run, 10)
    }

    #[test]
    fn test_mode_select() {
        let mut ds = ds(false);

        assert_eq!(exec(&mut ds, &Tc::ModeSelect(3)), TcResponse::Ok);
        assert_eq!(ds.mode_mgr.mode(), Mode::FaceTrack);

        assert_eq!(exec(&mut ds, &Tc::ModeSelect(9)), TcResponse::Invalid);
        assert_eq!(ds.mode_mgr.mode(), Mode::FaceTrack);
    }

    #[test]
    fn test_manual_only_in_manual() {
        let mut ds = ds(false);

        assert_eq!(exec(&mut ds, &Tc::Manual(ManualDir::Up)), TcResponse::Ok);

        exec(&mut ds, &Tc::ModeSelect(1));
        assert_eq!(
            exec(&mut ds, &Tc::Manual(ManualDir::Up)),
            TcResponse::CannotExecute
        );
    }

    #[test]
    fn test_arm_disarm() {
        let mut ds = ds(false);

        assert_eq!(exec(&mut ds, &Tc::Arm), TcResponse::Ok);
        assert!(ds.mode_mgr.armed());

        assert_eq!(exec(&mut ds, &Tc::Disarm), TcResponse::Ok);
        assert!(!ds.mode_mgr.armed());
    }

    #[test]
    fn test_dry_run_blocks_arm() {
        let mut ds = ds(true);

        assert_eq!(exec(&mut ds, &Tc::Arm), TcResponse::CannotExecute);
        assert!(!ds.mode_mgr.armed());
    }

    #[test]
    fn test_quit() {
        let mut ds = ds(false);

        assert_eq!(exec(&mut ds, &Tc::Quit), TcResponse::Ok);
        assert!(ds.quit_requested);
    }
}
