//! Codec trait and implementations.
//!
//! The server never calls `serde_json` directly; it holds a [`Codec`] and
//! asks it to turn [`ServerEvent`](crate::ServerEvent)s into frames and
//! frames into [`ClientEvent`](crate::ClientEvent)s. Swapping the wire
//! format means swapping the codec, nothing else.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because one codec is shared by every connection
/// task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that speaks JSON, one event per frame.
///
/// Behind the `json` feature (enabled by default).
///
/// ```rust
/// use gambit_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let frame = br#"{"event":"joinRoom","data":{"roomId":"r1","playerName":"Ann"}}"#;
/// let event: ClientEvent = codec.decode(frame).unwrap();
/// assert!(matches!(event, ClientEvent::JoinRoom(_)));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, ServerEvent};

    #[test]
    fn test_json_codec_encodes_board_state() {
        let bytes = JsonCodec
            .encode(&ServerEvent::BoardState("8/8/8/8/8/8/8/8 w - - 0 1".into()))
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"event":"boardState","data":"8/8/8/8/8/8/8/8 w - - 0 1"}"#
        );
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let err = JsonCodec.decode::<ClientEvent>(b"not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_json_codec_rejects_unknown_event() {
        let err = JsonCodec
            .decode::<ClientEvent>(br#"{"event":"chat","data":"hi"}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }
}
