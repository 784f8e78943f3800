//! Transport abstraction for network I/O.
//!
//! The `Transport` trait abstracts over persistent, message-oriented,
//! full-duplex connections. One inbound or outbound unit is one UTF-8 text
//! message carrying a JSON record.
//!
//! # Implementations
//!
//! - **`WsTransport`** (production, `loam-agent`): WebSocket text frames
//! - **`SimTransport`** (testing, `loam-harness`): newline-delimited text
//!   over Turmoil's deterministic TCP
//!
//! # Why Not Simulate WebSocket Directly?
//!
//! The device protocol lives inside text messages. Turmoil's TCP gives the
//! same ordering and failure semantics (refused connects, resets, clean
//! closes), which is what the supervisor and receive loop react to.
//!
//! # Ownership
//!
//! `connect` hands back separate sender and receiver halves. The receive
//! loop owns the receiver; the sender is shared behind a lock so that the
//! auth reply and the report loop never interleave frames.

use async_trait::async_trait;

use crate::error::TransportError;

/// Dialer for message-oriented sessions.
///
/// # Lifecycle
///
/// ```text
/// connect(url)
///   ↓
/// (MessageSender, MessageReceiver)
///   ↓                    ↓
/// send() ... close()   recv() ... Ok(None)
/// ```
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sending half of an open session.
    type Sender: MessageSender;

    /// Receiving half of an open session.
    type Receiver: MessageReceiver;

    /// Open a session to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connect`] if the endpoint is unreachable,
    /// refuses the connection, or fails the handshake.
    async fn connect(&self, url: &str) -> Result<(Self::Sender, Self::Receiver), TransportError>;
}

/// Sending half of a session.
#[async_trait]
pub trait MessageSender: Send + 'static {
    /// Send one text message.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the session is gone, or another
    /// variant for socket failures.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the session from this side.
    ///
    /// Closing an already-closed session is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake could not be written.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Receiving half of a session.
#[async_trait]
pub trait MessageReceiver: Send + 'static {
    /// Wait for the next text message.
    ///
    /// Returns `Ok(None)` when the peer closed the session cleanly.
    /// Non-text control traffic (pings, binary frames) is skipped by the
    /// implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails. The session is
    /// unusable afterwards.
    async fn recv(&mut self) -> Result<Option<String>, TransportError>;
}
