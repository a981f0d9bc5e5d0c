//! WebSocket peers over `tokio-tungstenite`.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Handshake, Transport, TransportError};

/// How long a peer gets to send its upgrade request, unless overridden.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Listens for WebSocket upgrades on a TCP port.
#[derive(Debug)]
pub struct WebSocketTransport {
    listener: TcpListener,
    closed: AtomicBool,
    handshake_timeout: Duration,
}

impl WebSocketTransport {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr = ?listener.local_addr().ok(), "listening for websocket peers");
        Ok(Self {
            listener,
            closed: AtomicBool::new(false),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        })
    }

    /// Limits how long [`WebSocketHandshake::complete`] waits for a peer.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// The address actually bound, which differs from the requested one
    /// when binding port `0`.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Handshake = WebSocketHandshake;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<WebSocketHandshake, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }

        let (tcp, peer) = self.listener.accept().await.map_err(TransportError::Accept)?;
        tracing::trace!(%peer, "tcp peer connected");
        Ok(WebSocketHandshake {
            tcp,
            peer,
            timeout: self.handshake_timeout,
        })
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!("websocket transport no longer accepting");
        }
        Ok(())
    }
}

/// A TCP peer that still owes us its upgrade request.
#[derive(Debug)]
pub struct WebSocketHandshake {
    tcp: TcpStream,
    peer: SocketAddr,
    timeout: Duration,
}

impl WebSocketHandshake {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl Handshake for WebSocketHandshake {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn complete(self) -> Result<WebSocketConnection, TransportError> {
        let peer = self.peer;
        let ws = tokio::time::timeout(self.timeout, tokio_tungstenite::accept_async(self.tcp))
            .await
            .map_err(|_| TransportError::HandshakeTimeout {
                peer,
                after: self.timeout,
            })?
            .map_err(|e| TransportError::Handshake {
                peer,
                reason: e.to_string(),
            })?;

        let id = ConnectionId::next();
        tracing::debug!(conn_id = %id, %peer, "websocket peer connected");

        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// An upgraded peer. Reading and writing hold separate locks.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocketStream<TcpStream>, Message>>,
    stream: Mutex<SplitStream<WebSocketStream<TcpStream>>>,
}

impl fmt::Debug for WebSocketConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketConnection").field("id", &self.id).finish_non_exhaustive()
    }
}

impl WebSocketConnection {
    fn send_error(&self, e: impl fmt::Display) -> TransportError {
        TransportError::Send {
            conn_id: self.id,
            reason: e.to_string(),
        }
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// UTF-8 payloads go out as text frames, anything else as binary.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let frame = match std::str::from_utf8(data) {
            Ok(text) => Message::Text(text.into()),
            Err(_) => Message::Binary(data.to_vec().into()),
        };
        self.sink
            .lock()
            .await
            .send(frame)
            .await
            .map_err(|e| self.send_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Ok(Some(text.as_bytes().to_vec())),
                Ok(Message::Binary(bytes)) => return Ok(Some(bytes.to_vec())),
                Ok(Message::Close(_)) => return Ok(None),
                // tungstenite answers pings itself
                Ok(_) => {}
                Err(e) => {
                    return Err(TransportError::Receive {
                        conn_id: self.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| self.send_error(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
