//! Move generation, attack detection and move application.

use crate::position::Position;
use crate::{Color, Piece, PieceKind, Square};

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

const PROMOTION_KINDS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// How a move changes the board beyond lifting and placing one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Normal,
    /// A pawn advancing two squares from its starting rank.
    DoublePush,
    EnPassant,
    CastleKingside,
    CastleQueenside,
}

/// A fully described move in a specific position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub kind: MoveKind,
}

impl Move {
    fn quiet(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            captured: None,
            promotion: None,
            kind: MoveKind::Normal,
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

impl Position {
    /// Whether any piece of `by` attacks `target`.
    pub fn is_attacked(&self, target: Square, by: Color) -> bool {
        let holds = |sq: Option<Square>, kind: PieceKind| {
            sq.and_then(|s| self.piece_at(s)) == Some(Piece::new(by, kind))
        };

        // Pawns of `by` attack diagonally forward, so look one rank behind.
        let behind = -by.forward();
        if holds(target.offset(-1, behind), PieceKind::Pawn)
            || holds(target.offset(1, behind), PieceKind::Pawn)
        {
            return true;
        }

        if KNIGHT_OFFSETS
            .iter()
            .any(|&(df, dr)| holds(target.offset(df, dr), PieceKind::Knight))
        {
            return true;
        }

        if KING_OFFSETS
            .iter()
            .any(|&(df, dr)| holds(target.offset(df, dr), PieceKind::King))
        {
            return true;
        }

        let slider_hits = |dirs: &[(i8, i8)], kinds: [PieceKind; 2]| {
            dirs.iter().any(|&(df, dr)| {
                match self.first_piece_along(target, df, dr) {
                    Some(piece) => piece.color == by && kinds.contains(&piece.kind),
                    None => false,
                }
            })
        };

        slider_hits(&ROOK_DIRS, [PieceKind::Rook, PieceKind::Queen])
            || slider_hits(&BISHOP_DIRS, [PieceKind::Bishop, PieceKind::Queen])
    }

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.king_square(self.side)
            .is_some_and(|king| self.is_attacked(king, self.side.opponent()))
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        let us = self.side;
        self.pseudo_legal_moves()
            .into_iter()
            .filter(|mv| {
                let next = self.play(mv);
                next.king_square(us)
                    .is_some_and(|king| !next.is_attacked(king, us.opponent()))
            })
            .collect()
    }

    /// Legal moves starting on `from`.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        self.legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from)
            .collect()
    }

    /// Returns the position after `mv`.
    ///
    /// `mv` must come from this position's move list; nothing is
    /// re-validated here.
    pub fn play(&self, mv: &Move) -> Position {
        let mut next = *self;
        let us = self.side;
        next.board[mv.from.index()] = None;

        match mv.kind {
            MoveKind::EnPassant => {
                if let Some(victim) = Square::from_coords(mv.to.file(), mv.from.rank()) {
                    next.board[victim.index()] = None;
                }
            }
            MoveKind::CastleKingside => next.shift_rook(us, 7, 5),
            MoveKind::CastleQueenside => next.shift_rook(us, 0, 3),
            MoveKind::Normal | MoveKind::DoublePush => {}
        }

        let placed = mv.promotion.unwrap_or(mv.piece);
        next.board[mv.to.index()] = Some(Piece::new(us, placed));

        next.en_passant = match mv.kind {
            MoveKind::DoublePush => mv.from.offset(0, us.forward()),
            _ => None,
        };

        if mv.piece == PieceKind::King {
            next.castling.clear(us);
        }
        next.castling.clear_corner(mv.from);
        next.castling.clear_corner(mv.to);

        if mv.piece == PieceKind::Pawn || mv.is_capture() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }
        if us == Color::Black {
            next.fullmove_number += 1;
        }
        next.side = us.opponent();
        next
    }

    fn shift_rook(&mut self, color: Color, from_file: u8, to_file: u8) {
        let rank = color.back_rank();
        if let (Some(from), Some(to)) = (
            Square::from_coords(from_file, rank),
            Square::from_coords(to_file, rank),
        ) {
            self.board[to.index()] = self.board[from.index()].take();
        }
    }

    fn first_piece_along(&self, start: Square, df: i8, dr: i8) -> Option<Piece> {
        let mut current = start;
        while let Some(next) = current.offset(df, dr) {
            if let Some(piece) = self.piece_at(next) {
                return Some(piece);
            }
            current = next;
        }
        None
    }

    fn pseudo_legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for from in Square::all() {
            let Some(piece) = self.piece_at(from) else {
                continue;
            };
            if piece.color != self.side {
                continue;
            }
            match piece.kind {
                PieceKind::Pawn => self.pawn_moves(from, &mut moves),
                PieceKind::Knight => self.step_moves(from, piece.kind, &KNIGHT_OFFSETS, &mut moves),
                PieceKind::Bishop => self.slide_moves(from, piece.kind, &BISHOP_DIRS, &mut moves),
                PieceKind::Rook => self.slide_moves(from, piece.kind, &ROOK_DIRS, &mut moves),
                PieceKind::Queen => {
                    self.slide_moves(from, piece.kind, &ROOK_DIRS, &mut moves);
                    self.slide_moves(from, piece.kind, &BISHOP_DIRS, &mut moves);
                }
                PieceKind::King => {
                    self.step_moves(from, piece.kind, &KING_OFFSETS, &mut moves);
                    self.castle_moves(from, &mut moves);
                }
            }
        }
        moves
    }

    fn pawn_moves(&self, from: Square, moves: &mut Vec<Move>) {
        let us = self.side;
        let fwd = us.forward();

        if let Some(one) = from.offset(0, fwd).filter(|sq| self.piece_at(*sq).is_none()) {
            push_pawn_move(moves, Move::quiet(from, one, PieceKind::Pawn), us);
            if from.rank() == us.pawn_rank() {
                if let Some(two) = one.offset(0, fwd).filter(|sq| self.piece_at(*sq).is_none()) {
                    moves.push(Move {
                        kind: MoveKind::DoublePush,
                        ..Move::quiet(from, two, PieceKind::Pawn)
                    });
                }
            }
        }

        for df in [-1, 1] {
            let Some(to) = from.offset(df, fwd) else {
                continue;
            };
            match self.piece_at(to) {
                Some(target) if target.color != us => {
                    let mv = Move {
                        captured: Some(target.kind),
                        ..Move::quiet(from, to, PieceKind::Pawn)
                    };
                    push_pawn_move(moves, mv, us);
                }
                None if self.en_passant == Some(to) => moves.push(Move {
                    captured: Some(PieceKind::Pawn),
                    kind: MoveKind::EnPassant,
                    ..Move::quiet(from, to, PieceKind::Pawn)
                }),
                _ => {}
            }
        }
    }

    fn step_moves(&self, from: Square, kind: PieceKind, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in offsets {
            let Some(to) = from.offset(df, dr) else {
                continue;
            };
            match self.piece_at(to) {
                None => moves.push(Move::quiet(from, to, kind)),
                Some(target) if target.color != self.side => moves.push(Move {
                    captured: Some(target.kind),
                    ..Move::quiet(from, to, kind)
                }),
                Some(_) => {}
            }
        }
    }

    fn slide_moves(&self, from: Square, kind: PieceKind, dirs: &[(i8, i8)], moves: &mut Vec<Move>) {
        for &(df, dr) in dirs {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                match self.piece_at(to) {
                    None => moves.push(Move::quiet(from, to, kind)),
                    Some(target) => {
                        if target.color != self.side {
                            moves.push(Move {
                                captured: Some(target.kind),
                                ..Move::quiet(from, to, kind)
                            });
                        }
                        break;
                    }
                }
                current = to;
            }
        }
    }

    fn castle_moves(&self, from: Square, moves: &mut Vec<Move>) {
        let us = self.side;
        let them = us.opponent();
        let rank = us.back_rank();
        if from.rank() != rank || from.file() != 4 {
            return;
        }
        if self.is_attacked(from, them) {
            return;
        }
        let rook = Some(Piece::new(us, PieceKind::Rook));
        let empty = |files: &[u8]| {
            files.iter().all(|&f| {
                Square::from_coords(f, rank).is_some_and(|sq| self.piece_at(sq).is_none())
            })
        };
        let safe = |files: &[u8]| {
            files.iter().all(|&f| {
                Square::from_coords(f, rank).is_some_and(|sq| !self.is_attacked(sq, them))
            })
        };
        let rook_on = |file: u8| Square::from_coords(file, rank).and_then(|sq| self.piece_at(sq)) == rook;

        if self.castling.kingside(us) && rook_on(7) && empty(&[5, 6]) && safe(&[5, 6]) {
            if let Some(to) = Square::from_coords(6, rank) {
                moves.push(Move {
                    kind: MoveKind::CastleKingside,
                    ..Move::quiet(from, to, PieceKind::King)
                });
            }
        }
        if self.castling.queenside(us) && rook_on(0) && empty(&[1, 2, 3]) && safe(&[2, 3]) {
            if let Some(to) = Square::from_coords(2, rank) {
                moves.push(Move {
                    kind: MoveKind::CastleQueenside,
                    ..Move::quiet(from, to, PieceKind::King)
                });
            }
        }
    }
}

fn push_pawn_move(moves: &mut Vec<Move>, mv: Move, us: Color) {
    if mv.to.rank() == us.promotion_rank() {
        for kind in PROMOTION_KINDS {
            moves.push(Move {
                promotion: Some(kind),
                ..mv
            });
        }
    } else {
        moves.push(mv);
    }
}
