//! Scripted server peer for simulation tests.
//!
//! Runs inside a turmoil host and speaks the newline-delimited framing of
//! [`SimTransport`](crate::SimTransport).

use std::io;

use serde_json::Value;
use tokio::time::Instant;
use turmoil::net::TcpListener;

use crate::sim_transport::{REQUEST_PREFIX, SimReceiver, SimSender};

/// Port the scripted server listens on.
pub const SERVER_PORT: u16 = 8080;

/// Listening side of the simulated server.
pub struct SimServer {
    listener: TcpListener,
}

impl SimServer {
    /// Bind on all interfaces at [`SERVER_PORT`].
    ///
    /// # Errors
    ///
    /// Returns error if the port is already bound on this host.
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind(format!("0.0.0.0:{SERVER_PORT}").as_str()).await?;
        Ok(Self { listener })
    }

    /// Accept one device connection and read its request line.
    ///
    /// # Errors
    ///
    /// Returns error if accepting fails or the request line is missing or
    /// malformed.
    pub async fn accept(&self) -> io::Result<SimPeer> {
        let (stream, _addr) = self.listener.accept().await?;
        let (reader, writer) = tokio::io::split(stream);
        let mut receiver = SimReceiver::new(reader);

        let line = receiver
            .read_line()
            .await?
            .ok_or_else(|| invalid_data("connection closed before request line"))?;
        let target = line
            .strip_prefix(REQUEST_PREFIX)
            .ok_or_else(|| invalid_data("malformed request line"))?
            .to_string();

        Ok(SimPeer {
            target,
            accepted_at: Instant::now(),
            sender: SimSender::new(writer),
            receiver,
        })
    }
}

/// One accepted device connection, seen from the server.
pub struct SimPeer {
    target: String,
    accepted_at: Instant,
    sender: SimSender,
    receiver: SimReceiver,
}

impl SimPeer {
    /// Request target the device dialed, e.g. `/websocket?deviceId=dev-1`.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Virtual time at which the connection was accepted.
    pub fn accepted_at(&self) -> Instant {
        self.accepted_at
    }

    /// Send a JSON message to the device.
    ///
    /// # Errors
    ///
    /// Returns error if the connection is broken.
    pub async fn send(&mut self, message: &Value) -> io::Result<()> {
        self.sender.write_line(&message.to_string()).await
    }

    /// Send a raw line, e.g. deliberately malformed JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the connection is broken.
    pub async fn send_raw(&mut self, text: &str) -> io::Result<()> {
        self.sender.write_line(text).await
    }

    /// Next message from the device, or `None` once it closed the connection.
    ///
    /// # Errors
    ///
    /// Returns error if the connection is broken or the device sent
    /// something that is not JSON.
    pub async fn recv(&mut self) -> io::Result<Option<Value>> {
        match self.receiver.read_line().await? {
            Some(line) => serde_json::from_str(&line).map(Some).map_err(io::Error::other),
            None => Ok(None),
        }
    }

    /// Next message, failing if the device closed the connection.
    ///
    /// # Errors
    ///
    /// Same as [`SimPeer::recv`], plus [`io::ErrorKind::UnexpectedEof`] on
    /// close.
    pub async fn expect(&mut self) -> io::Result<Value> {
        self.recv()
            .await?
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "device disconnected"))
    }
}

fn invalid_data(reason: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, reason.to_string())
}
