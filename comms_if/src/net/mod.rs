//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking library chosen for the
//! software.
//!
//! The tracker runs on a single control thread, so socket monitoring is polled rather than run in
//! a background thread: call [`MonitoredSocket::update`] (or [`MonitoredSocket::connected`],
//! which calls it) once per cycle to drain pending monitor events.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::atomic::{AtomicUsize, Ordering};
use log::trace;
use zmq::{Context, Socket, SocketEvent, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| MonitoredSocketError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Number of monitors that are registered. Used to provide unique IDs for each monitor endpoint.
static NUM_MONITORS: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A zmq socket paired with a monitor reporting whether it is connected.
pub struct MonitoredSocket {
    socket: Socket,

    monitor: Socket,

    endpoint: String,

    connected: bool
}

/// Represents options which can be set on a monitored socket.
///
/// Most options here correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
pub struct SocketOptions {

    /// Indicates if the socket should bind itself to the endpoint rather than connect.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// If true [`MonitoredSocket::new`] blocks until the socket is connected, or until
    /// `connect_timeout` elapses, in which case `MonitoredSocketError::CouldNotConnect` is
    /// returned.
    ///
    /// The default value is `false`.
    pub block_on_first_connect: bool,

    /// Topic prefix to subscribe to, only used by `SUB` sockets. An empty prefix subscribes to
    /// everything.
    pub subscribe: Vec<u8>,

    /// `ZMQ_REQ_CORRELATE`: Match replies with requests
    pub req_correlate: bool,

    /// `ZMQ_REQ_RELAXED`: relax strict alternation between request and reply
    pub req_relaxed: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`: Set reconnection interval
    pub reconnect_ivl: i32,

    /// `ZMQ_CONNECT_TIMEOUT`: Set `connect()` timeout
    pub connect_timeout: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32,

    /// `ZMQ_HEARTBEAT_IVL`: Set interval between sending ZMTP heartbeats
    pub heartbeat_ivl: i32,

    /// `ZMQ_HEARTBEAT_TIMEOUT`: Set timeout for ZMTP heartbeats
    pub heartbeat_timeout: i32,

    /// `ZMQ_HEARTBEAT_TTL`: Set the TTL (time to live) value for ZMTP heartbeats
    pub heartbeat_ttl: i32
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MonitoredSocketError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Error enabling monitoring for the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("Could not connect the socket: {0:?}")]
    CouldNotConnect(Option<zmq::Error>),

    #[error("Could not read event from monitor socket: {0}")]
    EventReadError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonitoredSocket {
    /// Create a new monitored socket.
    ///
    /// ## Arguments
    /// - `ctx`: the zmq context which will be used to create the socket
    /// - `socket_type`: the type of zmq socket to create
    /// - `socket_options`: a [`SocketOptions`] struct specifying how to configure the socket
    /// - `endpoint`: a zmq endpoint string, such as `"tcp://localhost:4000"`
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: SocketOptions,
        endpoint: &str
    ) -> Result<Self, MonitoredSocketError> {
        let socket = ctx.socket(socket_type)
            .map_err(MonitoredSocketError::CreateSocketError)?;

        // Each monitor needs its own inproc endpoint
        let monitor_endpoint = format!(
            "inproc://monitor_{}",
            NUM_MONITORS.fetch_add(1, Ordering::Relaxed)
        );

        socket.monitor(&monitor_endpoint, SocketEvent::ALL as i32)
            .map_err(MonitoredSocketError::MonitoringEnableError)?;
        let monitor = ctx.socket(zmq::PAIR)
            .map_err(MonitoredSocketError::CreateSocketError)?;
        monitor.connect(&monitor_endpoint)
            .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        socket_options.set(&socket)?;

        match socket_options.bind {
            false => socket.connect(endpoint),
            true => socket.bind(endpoint)
        }.map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        let mut monitored = Self {
            socket,
            monitor,
            endpoint: endpoint.to_string(),
            connected: false
        };

        if socket_options.block_on_first_connect {
            monitored.wait_for_connection(socket_options.connect_timeout)?;
        }

        Ok(monitored)
    }

    /// Drain all pending monitor events, updating the connection flag.
    pub fn update(&mut self) -> Result<(), MonitoredSocketError> {
        while let Some(event) = read_event(&self.monitor, zmq::DONTWAIT)
            .map_err(MonitoredSocketError::EventReadError)?
        {
            self.apply_event(event);
        }

        Ok(())
    }

    /// Return if the socket is connected or not.
    ///
    /// A monitor read error is treated as not connected.
    pub fn connected(&mut self) -> bool {
        match self.update() {
            Ok(()) => self.connected,
            Err(_) => false
        }
    }

    /// The endpoint this socket is attached to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Block on the monitor until the socket reports a connection.
    ///
    /// A `timeout_ms` of zero or less waits forever.
    fn wait_for_connection(&mut self, timeout_ms: i32) -> Result<(), MonitoredSocketError> {
        if timeout_ms > 0 {
            set_sockopts!(self.monitor, (set_rcvtimeo, timeout_ms));
        }

        loop {
            let event = match read_event(&self.monitor, 0) {
                Ok(Some(e)) => e,
                Ok(None) => return Err(MonitoredSocketError::CouldNotConnect(None)),
                Err(e) => return Err(MonitoredSocketError::EventReadError(e))
            };

            let is_connection = matches!(
                event,
                SocketEvent::CONNECTED | SocketEvent::ACCEPTED
            );
            self.apply_event(event);

            if is_connection {
                break;
            }
        }

        // Back to non-blocking reads for the cyclic updates
        set_sockopts!(self.monitor, (set_rcvtimeo, -1));

        Ok(())
    }

    fn apply_event(&mut self, event: SocketEvent) {
        match event {
            SocketEvent::CONNECTED | SocketEvent::ACCEPTED => {
                if !self.connected {
                    trace!("Socket on {} connected", self.endpoint);
                }
                self.connected = true
            },
            SocketEvent::DISCONNECTED | SocketEvent::CLOSED => {
                if self.connected {
                    trace!("Socket on {} disconnected", self.endpoint);
                }
                self.connected = false
            },
            _ => ()
        }
    }
}

impl std::ops::Deref for MonitoredSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl std::ops::DerefMut for MonitoredSocket {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), MonitoredSocketError> {

        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        match socket.get_socket_type() {
            Ok(SocketType::REQ) => {
                set_sockopts!(
                    socket,
                    (set_req_correlate, self.req_correlate),
                    (set_req_relaxed, self.req_relaxed)
                );
            },
            Ok(SocketType::SUB) => {
                set_sockopts!(socket, (set_subscribe, &self.subscribe));
            },
            _ => ()
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            block_on_first_connect: false,
            subscribe: Vec::new(),
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            recv_timeout: -1,
            req_correlate: false,
            req_relaxed: false,
            send_timeout: -1
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read an event from a monitor socket, `None` if no event is available.
fn read_event(socket: &Socket, flags: i32) -> Result<Option<SocketEvent>, zmq::Error> {

    let msg = match socket.recv_msg(flags) {
        Ok(m) => m,
        Err(zmq::Error::EAGAIN) => return Ok(None),
        Err(e) => return Err(e)
    };

    // First frame is the event ID (u16) followed by the event value (u32)
    if msg.len() < 2 {
        return Err(zmq::Error::EINVAL);
    }
    let event = u16::from_ne_bytes([msg[0], msg[1]]);

    // Second frame is the address, we'll ignore it
    if socket.get_rcvmore()? {
        let _ = socket.recv_msg(0)?;
    }

    Ok(Some(SocketEvent::from_raw(event)))
}
