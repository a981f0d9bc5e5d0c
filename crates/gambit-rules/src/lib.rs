//! Game rules for Gambit.
//!
//! A session owns one [`RuleEngine`] and asks it to validate and apply every
//! move proposal. [`Chess`] is the engine shipped here: standard chess with
//! FEN output and SAN move text.
//!
//! # Key types
//!
//! - [`RuleEngine`]: the capability a session needs from its rules
//! - [`Chess`]: standard chess
//! - [`MoveRequest`] / [`AppliedMove`]: what goes in, what comes out
//! - [`Position`]: a board plus side to move, castling, en passant, clocks
//! - [`RuleViolation`]: why a proposal was refused

mod chess;
mod engine;
mod error;
mod movegen;
mod piece;
mod position;
mod san;
mod square;

pub use chess::Chess;
pub use engine::{AppliedMove, MoveRequest, RuleEngine};
pub use error::{NotationError, RuleViolation};
pub use movegen::{Move, MoveKind};
pub use piece::{Color, Piece, PieceKind};
pub use position::{CastlingRights, INITIAL_FEN, Position};
pub use square::Square;
