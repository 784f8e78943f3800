//! WebSocket transport over tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use loam_core::{
    TransportError,
    transport::{MessageReceiver, MessageSender, Transport},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, trace};

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the device endpoint with a WebSocket client handshake.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

/// Write half of a WebSocket connection.
pub struct WsSender {
    sink: SplitSink<Stream, Message>,
}

/// Read half of a WebSocket connection.
pub struct WsReceiver {
    stream: SplitStream<Stream>,
}

#[async_trait]
impl Transport for WsTransport {
    type Sender = WsSender;
    type Receiver = WsReceiver;

    async fn connect(&self, url: &str) -> Result<(Self::Sender, Self::Receiver), TransportError> {
        let (socket, response) = connect_async(url).await.map_err(|e| TransportError::Connect {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!(status = %response.status(), "websocket handshake complete");

        let (sink, stream) = socket.split();
        Ok((WsSender { sink }, WsReceiver { stream }))
    }
}

#[async_trait]
impl MessageSender for WsSender {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        trace!(len = text.len(), "ws send");
        self.sink.send(Message::Text(text)).await.map_err(map_ws_error)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink.close().await.map_err(map_ws_error)
    }
}

#[async_trait]
impl MessageReceiver for WsReceiver {
    async fn recv(&mut self) -> Result<Option<String>, TransportError> {
        while let Some(frame) = self.stream.next().await {
            match frame.map_err(map_ws_error)? {
                Message::Text(text) => return Ok(Some(text)),
                Message::Close(frame) => {
                    debug!(frame = ?frame, "server sent close");
                    return Ok(None);
                },
                // tungstenite answers pings itself; binary frames carry nothing for us
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {},
                Message::Binary(data) => trace!(len = data.len(), "ignoring binary frame"),
            }
        }

        Ok(None)
    }
}

fn map_ws_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::Closed
        },
        tungstenite::Error::Io(e) => TransportError::from(e),
        tungstenite::Error::Protocol(e) => TransportError::Protocol(e.to_string()),
        tungstenite::Error::Utf8 => TransportError::Protocol("invalid UTF-8 in text frame".into()),
        other => TransportError::Io(other.to_string()),
    }
}
