//! Frame transport for Gambit.
//!
//! The relay core only ever sees [`Transport`] (hand me the next peer) and
//! [`Connection`] (send a frame, wait for a frame, hang up). Session
//! channels, broadcasts and private delivery live one layer up in
//! `gambit-room`.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_HANDSHAKE_TIMEOUT, WebSocketConnection, WebSocketHandshake, WebSocketTransport,
};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a peer.
///
/// Sessions compare this against their role slots to tell white, black
/// and spectators apart, so two live connections never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Intended for tests and fixtures.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocates a fresh id, never handed out before in this process.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of incoming peers.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Handshake: Handshake<Connection = Self::Connection, Error = Self::Error>;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next peer to open a connection.
    ///
    /// Returns as soon as the peer is there; any protocol handshake is left
    /// to [`Handshake::complete`] so one slow peer cannot hold up the next.
    /// Fails once [`shutdown`](Self::shutdown) has been called.
    async fn accept(&mut self) -> Result<Self::Handshake, Self::Error>;

    /// Refuses any further peers. Connections already handed out stay open.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A peer that has connected but not yet finished its handshake.
pub trait Handshake: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Finishes the handshake, giving up after the transport's time limit.
    async fn complete(self) -> Result<Self::Connection, Self::Error>;
}

/// One peer, exchanging whole frames.
///
/// `send` and `recv` take `&self` and must not block each other: a task
/// parked in `recv` is the normal state of a connection, and outbound
/// broadcasts still have to get through.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next frame from the peer, or `Ok(None)` once it has hung up.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
