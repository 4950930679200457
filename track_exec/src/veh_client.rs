//! # Vehicle Client
//!
//! This module provides networking abstractions to connect to the vehicle bridge, which forwards
//! demands to the vehicle's radio control channels.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use comms_if::{
    eqpt::{RcDems, VehDemsResponse},
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
};

use crate::{cmd_sink::CommandSink, params::TrackExecParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Vehicle client
pub struct VehClient {
    dems_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum VehClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the vehicle bridge")]
    NotConnected,

    #[error("Could not send demands to the vehicle bridge: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a response from the vehicle bridge: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the demands: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not deserialize the response from the vehicle bridge: {0}")]
    DeserializeError(serde_json::Error),

    #[error("The vehicle bridge sent a response which was not valid UTF-8")]
    NonUtf8Response,

    #[error("The vehicle bridge rejected the demands as invalid")]
    Rejected,

    #[error("The vehicle is not armed")]
    VehicleNotArmed,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehClient {
    /// Create a new instance of the vehicle client.
    ///
    /// This function will not block until the bridge connects.
    pub fn new(ctx: &zmq::Context, params: &TrackExecParams) -> Result<Self, VehClientError> {
        // Timeouts are kept well inside one cycle so a missing bridge cannot stall the loop
        let socket_options = SocketOptions {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            req_correlate: true,
            req_relaxed: true,
            ..Default::default()
        };

        let dems_socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            socket_options,
            &params.veh_endpoint,
        )
        .map_err(VehClientError::SocketError)?;

        Ok(Self { dems_socket })
    }

    /// Check if the client is connected to the vehicle bridge.
    pub fn is_connected(&mut self) -> bool {
        self.dems_socket.connected()
    }

    /// Send demands to the vehicle bridge and wait for its response.
    pub fn send_demands(&mut self, demands: &RcDems) -> Result<VehDemsResponse, VehClientError> {
        if !self.dems_socket.connected() {
            return Err(VehClientError::NotConnected);
        }

        let dems_str =
            serde_json::to_string(demands).map_err(VehClientError::SerializationError)?;

        self.dems_socket
            .send(&dems_str, 0)
            .map_err(VehClientError::SendError)?;

        let msg = self
            .dems_socket
            .recv_msg(0)
            .map_err(VehClientError::RecvError)?;

        let response_str = msg.as_str().ok_or(VehClientError::NonUtf8Response)?;

        serde_json::from_str(response_str).map_err(VehClientError::DeserializeError)
    }
}

impl CommandSink for VehClient {
    type Error = VehClientError;

    fn send_dems(&mut self, dems: &RcDems) -> Result<(), Self::Error> {
        match self.send_demands(dems)? {
            VehDemsResponse::DemsOk => {
                trace!("Demands accepted: {:?}", dems.as_array());
                Ok(())
            }
            VehDemsResponse::DemsInvalid => Err(VehClientError::Rejected),
            VehDemsResponse::NotArmed => Err(VehClientError::VehicleNotArmed),
        }
    }
}
