//! Main tracker executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Telecommand processing and handling
//!         - Detection input acquisition
//!         - Mode processing, including tracking control
//!         - Sending demands to the vehicle
//!         - Archiving
//!     - Stop the vehicle
//!
//! # Modules
//!
//! All control modules (e.g. `track_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use track_lib::{
    data_store::DataStore,
    det_client::DetClient,
    mode_mgr::{ModeMgr, TickOutcome},
    params::TrackExecParams,
    tc_client::{TcClient, TcClientError},
    track_ctrl::{self, TrackCtrl},
    veh_client::{VehClient, VehClientError}
};
use comms_if::tc::TcResponse;

mod tc_processor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::WrapErr};
use structopt::StructOpt;

// Internal
use util::{
    host,
    module::State,
    logger::{logger_init, parse_level, LevelFilter},
    session::{self, Session},
    script_interpreter::{ScriptInterpreter, PendingTcs},
    archive::Archived,
    time::cycle_remainder_s
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Face tracking vehicle controller
#[derive(Debug, StructOpt)]
#[structopt(name = "track_exec")]
struct Opts {
    /// Replay telecommands from this script instead of recieving them from the key event source
    #[structopt(long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Never arm the vehicle, demands are computed and logged but not sent
    #[structopt(long)]
    dry_run: bool,

    /// Minimum level of log messages (info, debug or trace)
    #[structopt(long, default_value = "debug", parse(try_from_str = parse_log_level))]
    log_level: LevelFilter
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Various sources for the telecommands incoming to the exec.
enum TcSource {
    Remote(TcClient),
    Script(ScriptInterpreter)
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "track_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(opts.log_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Face Tracking Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| String::from("unknown host"))
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opts);

    // ---- LOAD PARAMETERS ----

    let mut exec_params: TrackExecParams = util::params::load(
        "track_exec.toml"
    ).wrap_err("Could not load executable params")?;
    exec_params.validate()
        .wrap_err("Invalid executable params")?;

    if opts.dry_run {
        info!("Dry run, the vehicle will not be armed");
        exec_params.armed = false;
    }

    let track_ctrl_params: track_ctrl::Params = util::params::load(
        "track_ctrl.toml"
    ).wrap_err("Could not load TrackCtrl params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE TC SOURCE ----

    let script = match opts.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path)
                .wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} TCs\n",
                si.get_duration(),
                si.get_num_tcs()
            );

            Some(si)
        },
        None => {
            info!("No script provided, remote control via the TcClient will be used\n");
            None
        }
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut track_ctrl = TrackCtrl::init(track_ctrl_params)
        .wrap_err("Failed to initialise TrackCtrl")?;
    track_ctrl.init_archives(&session)
        .wrap_err("Failed to initialise TrackCtrl archives")?;
    info!("TrackCtrl init complete");

    let mode_mgr = ModeMgr::new(
        track_ctrl,
        exec_params.initial_mode()?,
        exec_params.armed,
        exec_params.manual_speed
    );

    let mut ds = DataStore::new(mode_mgr, opts.dry_run, exec_params.max_frame_gap_cycles);
    ds.init_archives(&session)
        .wrap_err("Failed to initialise the DataStore archives")?;

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let zmq_ctx = comms_if::net::zmq::Context::new();

    let mut tc_source = match script {
        Some(si) => TcSource::Script(si),
        None => {
            let c = TcClient::new(&zmq_ctx, &exec_params)
                .wrap_err("Failed to initialise the TcClient")?;
            info!("TcClient initialised");
            TcSource::Remote(c)
        }
    };

    let mut det_client = {
        let c = DetClient::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise DetClient")?;
        info!("DetClient initialised");
        c
    };

    let mut veh_client = {
        let c = VehClient::new(&zmq_ctx, &exec_params)
            .wrap_err("Failed to initialise VehClient")?;
        info!("VehClient initialised");
        c
    };

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut tc_connected = false;
    let mut frame_size_warned = false;

    // Error which ended the main loop, returned once the vehicle has been stopped
    let mut fatal: Option<Report> = None;

    // Script times are relative to the start of the main loop
    if let TcSource::Script(ref mut si) = tc_source {
        si.start(session::get_elapsed_seconds());
    }

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start();

        // ---- TELECOMMAND PROCESSING ----

        match tc_source {
            TcSource::Remote(ref mut client) => {
                let connected = client.is_connected();
                if connected != tc_connected {
                    match connected {
                        true => info!("Key event source connected"),
                        false => warn!("Key event source disconnected")
                    }
                    tc_connected = connected;
                }

                // Get commands until none remain
                while tc_connected {
                    match client.recieve_tc() {
                        Ok(Some(tc)) => {
                            let response = tc_processor::exec(&mut ds, &tc);

                            if let Err(e) = client.send_response(response) {
                                warn!("Could not respond to TC: {}", e);
                            }
                        },
                        Ok(None) => break,
                        Err(TcClientError::NotConnected) => break,
                        Err(TcClientError::TcParseError(e)) => {
                            warn!("Could not parse recieved TC: {}", e)
                        },
                        Err(TcClientError::NonUtf8Response) => {
                            warn!("Recieved a TC which was not valid UTF-8")
                        },
                        Err(e) => {
                            error!("An error occured while receiving TCs: {}", e);
                            fatal = Some(
                                Report::new(e).wrap_err("An error occured while receiving TCs")
                            );
                            break;
                        }
                    }
                }
            },

            TcSource::Script(ref mut si) =>
                match si.get_pending_tcs(session::get_elapsed_seconds()) {
                    PendingTcs::None => (),
                    PendingTcs::Some(tcs) => {
                        for tc in tcs.iter() {
                            match tc_processor::exec(&mut ds, tc) {
                                TcResponse::Ok => (),
                                r => warn!("Script TC {:?} not executed: {:?}", tc, r)
                            }
                        }
                    },
                    PendingTcs::EndOfScript => {
                        info!("End of TC script reached, stopping");
                        ds.quit_requested = true;
                    }
                }
        };

        if ds.quit_requested || fatal.is_some() {
            break;
        }

        // ---- DETECTION INPUT ----

        let connected = det_client.is_connected();
        if connected != ds.det_connected {
            match connected {
                true => info!("Detector connected"),
                false => warn!("Detector disconnected, tracking will stop the vehicle")
            }
            ds.det_connected = connected;
        }

        match det_client.latest_frame() {
            Ok(Some(frame)) => {
                let params = ds.mode_mgr.track_ctrl().params();
                if !frame_size_warned
                    && (frame.width != params.frame_width || frame.height != params.frame_height)
                {
                    warn!(
                        "Detector frames are {}x{} but TrackCtrl expects {}x{}",
                        frame.width,
                        frame.height,
                        params.frame_width,
                        params.frame_height
                    );
                    frame_size_warned = true;
                }

                ds.set_frame(frame);
            },
            Ok(None) => (),
            Err(e) => warn!("DetClient error: {}", e)
        }

        // ---- MODE PROCESSING ----

        match ds.step_mode(&mut veh_client) {
            Ok(outcome) => {
                if let TickOutcome::Sent(_) = outcome {
                    ds.veh_ok();
                }
                ds.last_outcome = Some(outcome);
            },
            Err(VehClientError::VehicleNotArmed) => {
                warn!("The vehicle reports it is not armed, disarming");
                ds.mode_mgr.set_armed(false);
                ds.veh_ok();
            },
            Err(e) => {
                warn!("Could not send demands to the vehicle: {}", e);
                ds.veh_error();
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.write() {
            warn!("Could not write archives: {}", e);
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur_s = (Instant::now() - cycle_start_instant).as_secs_f64();

        match cycle_remainder_s(exec_params.cycle_period_s, cycle_dur_s) {
            Some(remainder_s) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(Duration::from_secs_f64(remainder_s));
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur_s - exec_params.cycle_period_s
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        ds.num_cycles += 1;
    }

    // ---- SHUTDOWN ----

    match ds.mode_mgr.stop(&mut veh_client) {
        Ok(TickOutcome::Sent(_)) => info!("Stop demands sent to the vehicle"),
        Ok(_) => (),
        Err(e) => error!("Could not stop the vehicle: {}", e)
    }

    info!("End of execution after {} cycles", ds.num_cycles);

    match fatal {
        Some(e) => Err(e),
        None => Ok(())
    }
}

/// Parse the log level command line option.
fn parse_log_level(level: &str) -> Result<LevelFilter, String> {
    parse_level(level).ok_or_else(|| format!("Unknown log level \"{}\"", level))
}
