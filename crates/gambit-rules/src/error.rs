//! Error types for the rules layer.
//!
//! A [`RuleViolation`] is an ordinary outcome, not a fault: the relay treats
//! every variant the same way (the proposal is dropped). The variants exist
//! so logs and the optional rejection notice can say why.

use crate::Square;

/// Why a proposed move was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleViolation {
    /// The piece on the origin square belongs to the side not on move.
    #[error("it is not {0}'s turn")]
    WrongSide(crate::Color),

    /// No piece stands on the origin square.
    #[error("no piece on {0}")]
    EmptySquare(Square),

    /// The move is not legal in the current position.
    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    /// A pawn reaches the last rank but no promotion piece was chosen.
    #[error("move {from}{to} requires a promotion piece")]
    MissingPromotion { from: Square, to: Square },
}

/// Errors produced while parsing text notations (squares, pieces, FEN).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    /// A square was not a file letter `a`-`h` followed by a rank `1`-`8`.
    #[error("invalid square: {0:?}")]
    InvalidSquare(String),

    /// A piece letter was not one of `pnbrqk` (either case).
    #[error("invalid piece: {0:?}")]
    InvalidPiece(String),

    /// A FEN string could not be parsed.
    #[error("invalid FEN ({reason}): {fen:?}")]
    InvalidFen { fen: String, reason: &'static str },
}
