//! Standard Algebraic Notation for moves.

use crate::movegen::{Move, MoveKind};
use crate::position::Position;

impl Position {
    /// Renders `mv`, a legal move in this position, in SAN.
    pub fn san(&self, mv: &Move) -> String {
        let mut out = match mv.kind {
            MoveKind::CastleKingside => "O-O".to_string(),
            MoveKind::CastleQueenside => "O-O-O".to_string(),
            _ => self.san_body(mv),
        };

        let next = self.play(mv);
        if next.in_check() {
            out.push(if next.legal_moves().is_empty() { '#' } else { '+' });
        }
        out
    }

    fn san_body(&self, mv: &Move) -> String {
        let mut out = String::with_capacity(8);
        match mv.piece.san_letter() {
            Some(letter) => {
                out.push(letter);
                out.push_str(&self.disambiguation(mv));
            }
            None if mv.is_capture() => out.push(mv.from.file_char()),
            None => {}
        }
        if mv.is_capture() {
            out.push('x');
        }
        out.push_str(&mv.to.to_string());
        if let Some(kind) = mv.promotion {
            out.push('=');
            out.push(kind.to_char().to_ascii_uppercase());
        }
        out
    }

    /// Shortest origin hint that tells `mv` apart from other legal moves
    /// of the same piece kind to the same square.
    fn disambiguation(&self, mv: &Move) -> String {
        let rivals: Vec<Move> = self
            .legal_moves()
            .into_iter()
            .filter(|other| other.piece == mv.piece && other.to == mv.to && other.from != mv.from)
            .collect();

        if rivals.is_empty() {
            return String::new();
        }
        let shares_file = rivals.iter().any(|r| r.from.file() == mv.from.file());
        let shares_rank = rivals.iter().any(|r| r.from.rank() == mv.from.rank());

        match (shares_file, shares_rank) {
            (false, _) => mv.from.file_char().to_string(),
            (true, false) => mv.from.rank_char().to_string(),
            (true, true) => mv.from.to_string(),
        }
    }
}
