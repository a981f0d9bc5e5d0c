use std::net::SocketAddr;
use std::time::Duration;

use crate::ConnectionId;

/// Failures below the protocol layer.
///
/// WebSocket library errors are flattened to their message so this type
/// does not depend on the `websocket` feature.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    #[error("handshake with {peer} timed out after {after:?}")]
    HandshakeTimeout { peer: SocketAddr, after: Duration },

    /// The transport was shut down and takes no more peers.
    #[error("transport is shut down")]
    Shutdown,

    #[error("{conn_id}: send failed: {reason}")]
    Send { conn_id: ConnectionId, reason: String },

    #[error("{conn_id}: receive failed: {reason}")]
    Receive { conn_id: ConnectionId, reason: String },
}
