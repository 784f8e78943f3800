//! Turmoil-based Transport implementation using TCP streams.
//!
//! # Wire format
//!
//! WebSocket framing adds nothing the agent's logic depends on, so the
//! simulation replaces it with newline-delimited text over a turmoil TCP
//! stream:
//!
//! ```text
//! client -> server   GET /websocket?deviceId=<id>\n      (once, on connect)
//! both directions    <json>\n                            (one message per line)
//! ```
//!
//! A clean shutdown of the write half is the equivalent of a close frame.

use std::io;

use async_trait::async_trait;
use loam_core::{
    TransportError,
    transport::{MessageReceiver, MessageSender, Transport},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, ReadHalf, WriteHalf};
use turmoil::net::TcpStream;

/// Prefix of the request line a client sends after connecting.
pub const REQUEST_PREFIX: &str = "GET ";

/// Split a `ws://host:port/path?query` URL into `host:port` and the request
/// target `/path?query`.
///
/// # Errors
///
/// [`TransportError::Connect`] if the URL has no `ws://` scheme or no host.
pub fn split_url(url: &str) -> Result<(&str, &str), TransportError> {
    let invalid = |reason: &str| TransportError::Connect {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let rest = url.strip_prefix("ws://").ok_or_else(|| invalid("expected ws:// scheme"))?;
    let (authority, target) = match rest.find('/') {
        Some(index) => rest.split_at(index),
        None => (rest, "/"),
    };

    if authority.is_empty() {
        return Err(invalid("missing host"));
    }
    Ok((authority, target))
}

/// Client transport dialing turmoil hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimTransport;

/// Write half of a simulated connection.
pub struct SimSender {
    writer: WriteHalf<TcpStream>,
}

/// Read half of a simulated connection.
pub struct SimReceiver {
    lines: Lines<BufReader<ReadHalf<TcpStream>>>,
}

impl SimSender {
    pub(crate) fn new(writer: WriteHalf<TcpStream>) -> Self {
        Self { writer }
    }

    pub(crate) async fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

impl SimReceiver {
    pub(crate) fn new(reader: ReadHalf<TcpStream>) -> Self {
        Self { lines: BufReader::new(reader).lines() }
    }

    pub(crate) async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

#[async_trait]
impl Transport for SimTransport {
    type Sender = SimSender;
    type Receiver = SimReceiver;

    async fn connect(&self, url: &str) -> Result<(Self::Sender, Self::Receiver), TransportError> {
        let (authority, target) = split_url(url)?;

        let stream = TcpStream::connect(authority).await.map_err(|e| TransportError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let (reader, writer) = tokio::io::split(stream);
        let mut sender = SimSender::new(writer);
        sender.write_line(&format!("{REQUEST_PREFIX}{target}")).await?;

        Ok((sender, SimReceiver::new(reader)))
    }
}

#[async_trait]
impl MessageSender for SimSender {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if text.contains('\n') {
            return Err(TransportError::Protocol("message contains a line break".to_string()));
        }
        self.write_line(&text).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl MessageReceiver for SimReceiver {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.read_line().await?)
    }
}
