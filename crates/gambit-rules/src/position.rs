//! A chess position and its FEN encoding.
//!
//! [`Position`] is a plain value (`Copy`): playing a move produces a new
//! position and leaves the old one untouched, which is what lets the engine
//! apply a move all-or-nothing.

use std::fmt;
use std::str::FromStr;

use crate::{Color, NotationError, Piece, PieceKind, Square};

/// FEN of the standard starting position.
pub const INITIAL_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Which castling moves are still available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: Self = Self {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub(crate) fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// Drops the right tied to a rook's home corner, if `square` is one.
    pub(crate) fn clear_corner(&mut self, square: Square) {
        match square.index() {
            0 => self.white_queenside = false,
            7 => self.white_kingside = false,
            56 => self.black_queenside = false,
            63 => self.black_kingside = false,
            _ => {}
        }
    }

    fn to_fen(self) -> String {
        let mut out = String::new();
        if self.white_kingside {
            out.push('K');
        }
        if self.white_queenside {
            out.push('Q');
        }
        if self.black_kingside {
            out.push('k');
        }
        if self.black_queenside {
            out.push('q');
        }
        if out.is_empty() {
            out.push('-');
        }
        out
    }
}

/// Full game state needed to generate legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub(crate) board: [Option<Piece>; 64],
    pub(crate) side: Color,
    pub(crate) castling: CastlingRights,
    /// Square a pawn skipped over on the previous move, if any.
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
}

impl Position {
    /// The standard starting position.
    pub fn initial() -> Self {
        let mut board = [None; 64];
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            board[file] = Some(Piece::new(Color::White, kind));
            board[8 + file] = Some(Piece::new(Color::White, PieceKind::Pawn));
            board[48 + file] = Some(Piece::new(Color::Black, PieceKind::Pawn));
            board[56 + file] = Some(Piece::new(Color::Black, kind));
        }
        Self {
            board,
            side: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parses a FEN string.
    ///
    /// The halfmove clock and fullmove number may be omitted; they default
    /// to `0` and `1`. Each side must have exactly one king.
    pub fn from_fen(fen: &str) -> Result<Self, NotationError> {
        let invalid = |reason| NotationError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };

        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(invalid("expected 4 to 6 fields"));
        }

        let mut board = [None; 64];
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid("placement must have 8 ranks"));
        }
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file: u8 = 0;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(invalid("bad empty-square count"));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or_else(|| invalid("bad piece letter"))?;
                    let square =
                        Square::from_coords(file, rank).ok_or_else(|| invalid("rank too long"))?;
                    board[square.index()] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(invalid("rank too long"));
                }
            }
            if file != 8 {
                return Err(invalid("rank too short"));
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board
                .iter()
                .filter(|p| **p == Some(Piece::new(color, PieceKind::King)))
                .count();
            if kings != 1 {
                return Err(invalid("each side needs exactly one king"));
            }
        }

        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(invalid("side to move must be w or b")),
        };

        let mut castling = CastlingRights::default();
        if fields[2] != "-" {
            for c in fields[2].chars() {
                match c {
                    'K' => castling.white_kingside = true,
                    'Q' => castling.white_queenside = true,
                    'k' => castling.black_kingside = true,
                    'q' => castling.black_queenside = true,
                    _ => return Err(invalid("bad castling field")),
                }
            }
        }

        let en_passant = match fields[3] {
            "-" => None,
            text => {
                let square = Square::from_str(text).map_err(|_| invalid("bad en passant square"))?;
                if square.rank() != 2 && square.rank() != 5 {
                    return Err(invalid("en passant square must be on rank 3 or 6"));
                }
                Some(square)
            }
        };

        let halfmove_clock = match fields.get(4) {
            Some(text) => text.parse().map_err(|_| invalid("bad halfmove clock"))?,
            None => 0,
        };
        let fullmove_number = match fields.get(5) {
            Some(text) => text.parse().map_err(|_| invalid("bad fullmove number"))?,
            None => 1,
        };
        if fullmove_number == 0 {
            return Err(invalid("fullmove number starts at 1"));
        }

        Ok(Self {
            board,
            side,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Serializes to FEN.
    ///
    /// The en passant square is only written when a pawn of the side to
    /// move actually stands ready to capture on it.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at_coords(file, rank) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        placement.push(piece.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let en_passant = self
            .en_passant
            .filter(|sq| self.en_passant_capturable(*sq))
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{} {} {} {} {} {}",
            placement,
            self.side.to_char(),
            self.castling.to_fen(),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// The piece on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }

    fn piece_at_coords(&self, file: u8, rank: u8) -> Option<Piece> {
        Square::from_coords(file, rank).and_then(|sq| self.piece_at(sq))
    }

    pub fn side_to_move(&self) -> Color {
        self.side
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub(crate) fn king_square(&self, color: Color) -> Option<Square> {
        let king = Some(Piece::new(color, PieceKind::King));
        Square::all().find(|sq| self.board[sq.index()] == king)
    }

    fn en_passant_capturable(&self, target: Square) -> bool {
        let pawn = Some(Piece::new(self.side, PieceKind::Pawn));
        let behind = -self.side.forward();
        [-1, 1]
            .into_iter()
            .filter_map(|df| target.offset(df, behind))
            .any(|sq| self.piece_at(sq) == pawn)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::initial()
    }
}

impl FromStr for Position {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_position_serializes_to_standard_fen() {
        assert_eq!(Position::initial().to_fen(), INITIAL_FEN);
    }

    #[test]
    fn test_from_fen_round_trips_initial() {
        let pos = Position::from_fen(INITIAL_FEN).unwrap();
        assert_eq!(pos, Position::initial());
    }

    #[test]
    fn test_from_fen_keeps_capturable_en_passant() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn test_to_fen_hides_uncapturable_en_passant() {
        let pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
        assert_eq!(
            pos.to_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_from_fen_defaults_move_counters() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - -").unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
        assert_eq!(pos.castling(), CastlingRights::default());
    }

    #[test]
    fn test_from_fen_rejects_malformed() {
        let bad = [
            "",
            "8/8/8/8/8/8/8/8 w - - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0",
            "rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        ];
        for fen in bad {
            assert!(Position::from_fen(fen).is_err(), "{fen:?} should be rejected");
        }
    }

    #[test]
    fn test_king_square_lookup() {
        let pos = Position::initial();
        assert_eq!(pos.king_square(Color::White).unwrap().to_string(), "e1");
        assert_eq!(pos.king_square(Color::Black).unwrap().to_string(), "e8");
    }
}
