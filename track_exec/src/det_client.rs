//! # Detection Client
//!
//! Subscribes to the face detector, which publishes one [`DetFrame`] for every frame it
//! processes. The detector may publish faster than the control cycle, so only the most recent
//! frame is kept each cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::Utc;
use log::{trace, warn};

use comms_if::{
    eqpt::DetFrame,
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::params::TrackExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Detection client
pub struct DetClient {
    socket: MonitoredSocket,

    /// ID of the last frame returned, used to spot frames arriving out of order
    last_frame_id: Option<u64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum DetClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not recieve a frame from the detector: {0}")]
    RecvError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DetClient {
    /// Create a new instance of the detection client.
    ///
    /// This function will not block until the detector connects.
    pub fn new(ctx: &zmq::Context, params: &TrackExecParams) -> Result<Self, DetClientError> {
        let socket_options = SocketOptions {
            subscribe: Vec::new(),
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 0,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            socket_options,
            &params.det_endpoint,
        )
        .map_err(DetClientError::SocketError)?;

        Ok(Self {
            socket,
            last_frame_id: None,
        })
    }

    /// Check if the client is connected to the detector.
    pub fn is_connected(&mut self) -> bool {
        self.socket.connected()
    }

    /// Get the most recent frame published by the detector.
    ///
    /// Every frame waiting on the socket is read and all but the newest discarded. Frames which
    /// cannot be parsed are skipped with a warning. Returns `Ok(None)` if no new frame arrived.
    pub fn latest_frame(&mut self) -> Result<Option<DetFrame>, DetClientError> {
        let mut latest: Option<DetFrame> = None;
        let mut num_read = 0usize;

        loop {
            let frame_str = match self.socket.recv_string(zmq::DONTWAIT) {
                Ok(Ok(s)) => s,
                Ok(Err(_)) => {
                    warn!("Detector sent a frame which was not valid UTF-8");
                    continue;
                }
                Err(zmq::Error::EAGAIN) => break,
                Err(e) => return Err(DetClientError::RecvError(e)),
            };

            match DetFrame::from_json(&frame_str) {
                Ok(f) => {
                    num_read += 1;
                    latest = Some(f);
                }
                Err(e) => warn!("Could not parse frame from the detector: {}", e),
            }
        }

        if num_read > 1 {
            trace!("Discarded {} stale detector frames", num_read - 1);
        }

        if let Some(ref frame) = latest {
            if let Some(last) = self.last_frame_id {
                if frame.frame_id <= last {
                    warn!(
                        "Detector frame {} arrived after frame {}",
                        frame.frame_id, last
                    );
                }
            }
            self.last_frame_id = Some(frame.frame_id);

            if let Some(age_s) =
                util::time::duration_to_seconds(Utc::now().signed_duration_since(frame.timestamp))
            {
                trace!("Frame {} is {:.3} s old", frame.frame_id, age_s);
            }
        }

        Ok(latest)
    }
}
