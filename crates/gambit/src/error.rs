//! Unified error type for the Gambit server.

use gambit_protocol::ProtocolError;
use gambit_room::SessionError;
use gambit_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` conversions let the server and connection handler use `?`
/// across layers.
#[derive(Debug, thiserror::Error)]
pub enum GambitError {
    /// Binding, accepting, sending or receiving failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An event could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session actor was unavailable or refused a request.
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gambit_protocol::SessionId;
    use gambit_room::MoveRefusal;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Receive {
            conn_id: gambit_transport::ConnectionId::new(3),
            reason: "reset by peer".into(),
        };
        let gambit_err: GambitError = err.into();
        assert!(matches!(gambit_err, GambitError::Transport(_)));
        assert_eq!(gambit_err.to_string(), "conn-3: receive failed: reset by peer");
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let gambit_err: GambitError = err.into();
        assert!(matches!(gambit_err, GambitError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::Unavailable(SessionId::from("s1"));
        let gambit_err: GambitError = err.into();
        assert!(matches!(gambit_err, GambitError::Session(_)));
        assert!(gambit_err.to_string().contains("s1"));
    }

    #[test]
    fn test_refusal_message_is_preserved() {
        let err = SessionError::from(MoveRefusal::Spectator);
        let gambit_err: GambitError = err.into();
        assert_eq!(gambit_err.to_string(), "move refused: spectators cannot move");
    }
}
