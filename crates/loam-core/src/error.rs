//! Error types for the transport layer.
//!
//! Every variant is recoverable from the device's point of view: the
//! supervisor logs it and reconnects after its backoff. `is_transient`
//! separates ordinary network trouble from peers that speak the transport
//! protocol incorrectly, which is only used to pick a log level.

use std::io;

use thiserror::Error;

/// Errors raised by [`crate::transport`] implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Session could not be established
    #[error("failed to connect to {url}: {reason}")]
    Connect {
        /// Endpoint that was dialled
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// Session is already closed (send after close, or reset by peer)
    #[error("connection closed")]
    Closed,

    /// Socket-level I/O failure
    #[error("transport I/O error: {0}")]
    Io(String),

    /// Peer violated the transport protocol (bad frame, bad handshake)
    #[error("transport protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Returns true if this error is ordinary network trouble.
    ///
    /// Protocol violations are never transient: they indicate a broken or
    /// misconfigured peer. The device still retries them.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Protocol(_))
    }
}

impl From<io::Error> for TransportError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected => Self::Closed,
            _ => Self::Io(err.to_string()),
        }
    }
}
