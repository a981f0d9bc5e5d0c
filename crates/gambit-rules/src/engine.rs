//! The `RuleEngine` trait, the seam between a session and the game rules.
//!
//! A session never inspects a board itself. It hands every proposal to its
//! engine and relays whatever the engine reports back, so any game with a
//! "side to move" and a textual state could sit behind a session.

use serde::{Deserialize, Serialize};

use crate::{Color, PieceKind, RuleViolation, Square};

/// A move as proposed by a client: origin, destination and an optional
/// promotion choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    /// Ignored unless the move is a promotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }
}

/// What a successfully applied move produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// The move in Standard Algebraic Notation, e.g. `"Nf3"`.
    pub san: String,
    /// The position after the move.
    pub fen: String,
}

/// Game rules owned by one session.
///
/// `apply_move` must be all-or-nothing: when it returns `Err` the engine's
/// state is exactly what it was before the call.
///
/// Engines need not survive their own panics. A session applies each move
/// to a clone and keeps the clone only when `apply_move` returns `Ok`, so a
/// panic midway through leaves the session's engine untouched.
pub trait RuleEngine: Clone + Send + 'static {
    /// The side whose turn it is.
    fn side_to_move(&self) -> Color;

    /// Validates and, if legal, applies `request`.
    fn apply_move(&mut self, request: &MoveRequest) -> Result<AppliedMove, RuleViolation>;

    /// The current position as FEN.
    fn fen(&self) -> String;

    /// Returns to the standard starting position.
    fn reset(&mut self);
}
