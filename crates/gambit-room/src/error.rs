//! Error types for the session layer.

use gambit_protocol::SessionId;
use gambit_rules::{Color, RuleViolation};

/// Why a move proposal was dropped.
///
/// Every variant is handled the same way (no state change, no broadcast);
/// they differ only in what gets logged and, when enabled, what the
/// proposer is told.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRefusal {
    /// The proposer never joined this session.
    #[error("connection is not a member of this session")]
    NotMember,

    /// Spectators cannot move.
    #[error("spectators cannot move")]
    Spectator,

    /// The proposer's side is not the side to move.
    #[error("it is {0}'s turn")]
    NotYourTurn(Color),

    /// The rule engine refused the move.
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// The rule engine panicked while evaluating the move.
    #[error("rule engine failed")]
    EngineFault,
}

/// Errors returned by session handles and the registry.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session's actor has stopped or its queue is closed.
    #[error("session {0} is unavailable")]
    Unavailable(SessionId),

    /// A move proposal was dropped.
    #[error("move refused: {0}")]
    Refused(#[from] MoveRefusal),
}
