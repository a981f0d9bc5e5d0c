//! Standard chess behind the [`RuleEngine`] trait.

use tracing::trace;

use crate::engine::{AppliedMove, MoveRequest, RuleEngine};
use crate::movegen::Move;
use crate::position::Position;
use crate::{Color, NotationError, RuleViolation};

/// A game of standard chess.
///
/// Moves are matched by origin and destination, with the promotion piece
/// consulted only when the move actually promotes.
#[derive(Debug, Clone, Default)]
pub struct Chess {
    position: Position,
}

impl Chess {
    /// A game at the standard starting position.
    pub fn new() -> Self {
        Self::default()
    }

    /// A game starting from an arbitrary FEN.
    pub fn from_fen(fen: &str) -> Result<Self, NotationError> {
        Ok(Self {
            position: Position::from_fen(fen)?,
        })
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        self.position.legal_moves()
    }

    pub fn is_check(&self) -> bool {
        self.position.in_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && self.legal_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && self.legal_moves().is_empty()
    }

    /// Resolves `request` to exactly one legal move.
    fn resolve(&self, request: &MoveRequest) -> Result<Move, RuleViolation> {
        let piece = self
            .position
            .piece_at(request.from)
            .ok_or(RuleViolation::EmptySquare(request.from))?;
        if piece.color != self.position.side_to_move() {
            return Err(RuleViolation::WrongSide(piece.color));
        }

        let illegal = RuleViolation::IllegalMove {
            from: request.from,
            to: request.to,
        };
        let candidates: Vec<Move> = self
            .position
            .legal_moves_from(request.from)
            .into_iter()
            .filter(|mv| mv.to == request.to)
            .collect();

        match candidates.first() {
            None => Err(illegal),
            Some(first) if first.promotion.is_none() => Ok(*first),
            Some(_) => {
                let kind = request.promotion.ok_or(RuleViolation::MissingPromotion {
                    from: request.from,
                    to: request.to,
                })?;
                candidates
                    .into_iter()
                    .find(|mv| mv.promotion == Some(kind))
                    .ok_or(illegal)
            }
        }
    }
}

impl RuleEngine for Chess {
    fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    fn apply_move(&mut self, request: &MoveRequest) -> Result<AppliedMove, RuleViolation> {
        let mv = self.resolve(request)?;
        let san = self.position.san(&mv);
        self.position = self.position.play(&mv);
        let fen = self.position.to_fen();
        trace!(%san, %fen, "move applied");
        Ok(AppliedMove { san, fen })
    }

    fn fen(&self) -> String {
        self.position.to_fen()
    }

    fn reset(&mut self) {
        self.position = Position::initial();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{INITIAL_FEN, PieceKind, Square};

    fn req(from: &str, to: &str) -> MoveRequest {
        MoveRequest::new(from.parse::<Square>().unwrap(), to.parse::<Square>().unwrap())
    }

    #[test]
    fn test_apply_move_returns_san_and_fen() {
        let mut game = Chess::new();
        let applied = game.apply_move(&req("e2", "e4")).unwrap();
        assert_eq!(applied.san, "e4");
        assert_eq!(
            applied.fen,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(game.side_to_move(), Color::Black);
    }

    #[test]
    fn test_apply_move_wrong_side_leaves_state() {
        let mut game = Chess::new();
        let err = game.apply_move(&req("e7", "e5")).unwrap_err();
        assert_eq!(err, RuleViolation::WrongSide(Color::Black));
        assert_eq!(game.fen(), INITIAL_FEN);
    }

    #[test]
    fn test_apply_move_empty_square() {
        let mut game = Chess::new();
        let err = game.apply_move(&req("e4", "e5")).unwrap_err();
        assert!(matches!(err, RuleViolation::EmptySquare(_)));
    }

    #[test]
    fn test_apply_move_illegal_destination() {
        let mut game = Chess::new();
        let err = game.apply_move(&req("e2", "e5")).unwrap_err();
        assert!(matches!(err, RuleViolation::IllegalMove { .. }));
        assert_eq!(game.fen(), INITIAL_FEN);
    }

    #[test]
    fn test_promotion_piece_ignored_for_normal_move() {
        let mut game = Chess::new();
        let applied = game
            .apply_move(&req("g1", "f3").with_promotion(PieceKind::Queen))
            .unwrap();
        assert_eq!(applied.san, "Nf3");
    }

    #[test]
    fn test_promotion_required_when_promoting() {
        let mut game = Chess::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let err = game.apply_move(&req("a7", "a8")).unwrap_err();
        assert!(matches!(err, RuleViolation::MissingPromotion { .. }));

        let applied = game
            .apply_move(&req("a7", "a8").with_promotion(PieceKind::Knight))
            .unwrap();
        assert_eq!(applied.san, "a8=N");
    }

    #[test]
    fn test_reset_restores_start() {
        let mut game = Chess::new();
        game.apply_move(&req("d2", "d4")).unwrap();
        game.reset();
        assert_eq!(game.fen(), INITIAL_FEN);
    }

    #[test]
    fn test_status_queries() {
        let mate =
            Chess::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert!(mate.is_check());
        assert!(mate.is_checkmate());
        assert!(!mate.is_stalemate());

        let stale = Chess::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!stale.is_check());
        assert!(stale.is_stalemate());
    }
}
