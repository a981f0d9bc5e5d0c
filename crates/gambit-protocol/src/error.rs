//! Error types for the protocol layer.
//!
//! A `ProtocolError` always means the bytes or the event were at fault,
//! never the connection or the game. The relay's answer to any of them is
//! the same: drop the inbound event and keep the connection open.

/// Errors that can occur while turning events into bytes and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown event name,
    /// a missing field, or a field of the wrong type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event decoded but its contents are unusable, e.g. a join with
    /// a blank session id.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
