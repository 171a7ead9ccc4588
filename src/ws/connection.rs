//! WebSocket transport
//!
//! One client connection over tokio-tungstenite. Knows nothing about Binance:
//! it opens the socket, writes text frames, yields inbound frames and closes.
//! Once the peer closes or the stream errors, the connection is spent.

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Default connect timeout
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Feed connection state
///
/// Disconnected → Connecting → Connected → Disconnected. There is no
/// reconnecting state: a dropped connection stays down until the next connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    /// Unknown values map to `Disconnected`
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Transport failures
#[derive(Debug, thiserror::Error)]
pub enum WebSocketError {
    #[error("connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
    #[error("connect to {url} timed out after {after:?}")]
    ConnectTimeout { url: String, after: Duration },
    #[error("write failed: {0}")]
    Send(#[source] tungstenite::Error),
    #[error("read failed: {0}")]
    Receive(#[source] tungstenite::Error),
    #[error("connection already closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, WebSocketError>;

/// Single client WebSocket
pub struct WebSocketConnection {
    stream: Stream,
    url: String,
    open: bool,
}

impl WebSocketConnection {
    /// Open `url` (ws:// or wss://), giving up after `limit`
    pub async fn connect(url: &str, limit: Duration) -> Result<Self> {
        let handshake = tokio::time::timeout(limit, connect_async(url)).await;
        let (stream, _response) = match handshake {
            Ok(Ok(pair)) => pair,
            Ok(Err(source)) => {
                return Err(WebSocketError::Connect {
                    url: url.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(WebSocketError::ConnectTimeout {
                    url: url.to_string(),
                    after: limit,
                })
            }
        };

        // Quotes are small; don't let Nagle batch the close frame or pongs
        if let MaybeTlsStream::Plain(tcp) = stream.get_ref() {
            if let Err(e) = tcp.set_nodelay(true) {
                tracing::debug!(target: "ws", "TCP_NODELAY not set: {}", e);
            }
        }

        Ok(Self {
            stream,
            url: url.to_string(),
            open: true,
        })
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        if !self.open {
            return Err(WebSocketError::Closed);
        }
        self.stream
            .send(Message::text(text))
            .await
            .map_err(WebSocketError::Send)
    }

    /// Next inbound frame. `Ok(None)` once the stream has ended.
    ///
    /// Cancel safe, so it can sit in a `select!` next to a shutdown signal.
    pub async fn recv(&mut self) -> Result<Option<Message>> {
        if !self.open {
            return Err(WebSocketError::Closed);
        }

        match self.stream.next().await {
            Some(Ok(msg)) => {
                self.open = !msg.is_close();
                Ok(Some(msg))
            }
            Some(Err(e)) => {
                self.open = false;
                Err(WebSocketError::Receive(e))
            }
            None => {
                self.open = false;
                Ok(None)
            }
        }
    }

    /// Send a close frame. Errors are logged, the connection is spent either way.
    pub async fn close(&mut self) {
        if !std::mem::replace(&mut self.open, false) {
            return;
        }
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(target: "ws", "Close handshake with {} failed: {}", self.url, e);
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }
}
