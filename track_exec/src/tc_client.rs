//! # Telecommand Client
//!
//! Receives telecommands from the key event source. Every TC received must be answered with a
//! [`TcResponse`] before the next one can be read.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, SocketOptions},
    tc::{Tc, TcParseError, TcResponse},
};

use crate::params::TrackExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telecommand client
pub struct TcClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TcClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("The client is not connected to the key event source")]
    NotConnected,

    #[error("Could not send the response: {0}")]
    SendError(zmq::Error),

    #[error("Could not recieve a message: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the response: {0}")]
    SerializationError(serde_json::Error),

    #[error("Could not parse the recieved telecommand: {0}")]
    TcParseError(TcParseError),

    #[error("The key event source sent a message which was not valid UTF-8")]
    NonUtf8Response,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcClient {
    /// Create a new instance of the TC Client.
    ///
    /// This function will not block until the key event source connects.
    pub fn new(ctx: &zmq::Context, params: &TrackExecParams) -> Result<Self, TcClientError> {
        let socket_options = SocketOptions {
            block_on_first_connect: false,
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        };

        let socket = MonitoredSocket::new(
            ctx,
            zmq::REP,
            socket_options,
            &params.tc_endpoint,
        )
        .map_err(TcClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Check if the client is connected to the key event source.
    pub fn is_connected(&mut self) -> bool {
        self.socket.connected()
    }

    /// Recieve a single TC.
    ///
    /// Call this in a loop until `Ok(None)` is returned, meaning no more TCs are waiting right
    /// now.
    ///
    /// After recieving a valid TC a response must be sent with [`TcClient::send_response`] before
    /// attempting to recieve another. If the message could not be parsed the `Invalid` response is
    /// sent by this function.
    pub fn recieve_tc(&mut self) -> Result<Option<Tc>, TcClientError> {
        if !self.socket.connected() {
            return Err(TcClientError::NotConnected);
        }

        let tc_str = match self.socket.recv_string(zmq::DONTWAIT) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                self.send_response(TcResponse::Invalid)?;
                return Err(TcClientError::NonUtf8Response);
            }
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // No response is sent if nothing was recieved
            Err(e) => return Err(TcClientError::RecvError(e)),
        };

        match Tc::from_json(&tc_str) {
            Ok(tc) => Ok(Some(tc)),
            Err(e) => {
                self.send_response(TcResponse::Invalid)?;
                Err(TcClientError::TcParseError(e))
            }
        }
    }

    /// Send the response to the last TC recieved.
    ///
    /// The response is always passed to the socket, even if the key event source has just
    /// disconnected, as the socket cannot recieve again until it has replied. A response to a
    /// source which has gone is dropped.
    pub fn send_response(&mut self, response: TcResponse) -> Result<(), TcClientError> {
        let response_str =
            serde_json::to_string(&response).map_err(TcClientError::SerializationError)?;

        self.socket
            .send(&response_str, 0)
            .map_err(TcClientError::SendError)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    const TC_ENDPOINT: &str = "tcp://127.0.0.1:47131";

    fn params() -> TrackExecParams {
        util::params::parse(&format!(
            "det_endpoint = \"tcp://127.0.0.1:47132\"\n\
             veh_endpoint = \"tcp://127.0.0.1:47133\"\n\
             tc_endpoint = \"{}\"\n",
            TC_ENDPOINT
        ))
        .unwrap()
    }

    /// Poll `cond` until it holds, failing the test after a few seconds.
    fn wait_until<F: FnMut() -> bool>(what: &str, mut cond: F) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "Timed out waiting for {}", what);
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Bind a key event source and wait for the client to connect to it.
    fn source(ctx: &zmq::Context, client: &mut TcClient) -> zmq::Socket {
        let socket = ctx.socket(zmq::REQ).unwrap();
        socket.set_linger(0).unwrap();
        socket.bind(TC_ENDPOINT).unwrap();
        wait_until("the client to connect", || client.is_connected());
        socket
    }

    fn next_tc(client: &mut TcClient) -> Tc {
        let mut tc = None;
        wait_until("a TC", || {
            tc = client.recieve_tc().unwrap();
            tc.is_some()
        });
        tc.unwrap()
    }

    #[test]
    fn test_respond_after_source_disconnects() {
        let ctx = zmq::Context::new();
        let mut client = TcClient::new(&ctx, &params()).unwrap();

        let first = source(&ctx, &mut client);
        first.send("\"Arm\"", 0).unwrap();
        assert_eq!(next_tc(&mut client), Tc::Arm);

        // The source goes away before the TC is answered
        drop(first);
        wait_until("the client to disconnect", || !client.is_connected());
        assert!(client.send_response(TcResponse::Ok).is_ok());

        // A new source is served normally
        let second = source(&ctx, &mut client);
        second.send("\"Disarm\"", 0).unwrap();
        assert_eq!(next_tc(&mut client), Tc::Disarm);
        client.send_response(TcResponse::Ok).unwrap();

        assert_eq!(second.recv_string(0).unwrap().unwrap(), "\"Ok\"");
    }
}
