//! Fog-of-war: what one side is allowed to see of a position.
//!
//! An observer sees the squares its own pieces stand on and every square one of its
//! legal moves lands on. Everything else is unknown. The view is a separate masked copy;
//! the board it was built from is never modified.

use std::fmt;

use itertools::Itertools;

use crate::bitboard::{contains, sq_to_bb, AttackTables};
use crate::board::Board;
use crate::movegen::legal_moves;
use crate::moves::{Move, UNKNOWN_START, UNKNOWN_TARGET};
use crate::types::*;

/// Contents of a square as seen through the fog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogSquare {
    Unknown,
    Empty,
    Piece(Piece),
}

#[derive(Debug, Clone)]
pub struct FogOfWarView {
    observer: Color,
    side_to_move: Color,
    visibility: Bitboard,
    squares: [FogSquare; 64],
    kingside_castle: bool,
    queenside_castle: bool,
}

/// Squares `observer` can see: its own pieces plus the targets of its legal moves.
///
/// When the observer is not to move, its moves are taken from a cloned board after a
/// null move.
pub fn visibility_set(board: &Board, tables: &AttackTables, observer: Color) -> Bitboard {
    let moves = if board.side_to_move() == observer {
        legal_moves(board, tables)
    } else {
        let mut scratch = board.clone();
        scratch.make_null_move();
        legal_moves(&scratch, tables)
    };
    moves
        .iter()
        .fold(board.color_bb(observer), |visible, mv| visible | sq_to_bb(mv.target()))
}

impl FogOfWarView {
    pub fn new(board: &Board, tables: &AttackTables, observer: Color) -> Self {
        let visibility = visibility_set(board, tables, observer);
        let squares = std::array::from_fn(|idx| {
            let sq = idx as Square;
            if !contains(visibility, sq) {
                FogSquare::Unknown
            } else {
                match board.piece_at(sq) {
                    Some(piece) => FogSquare::Piece(piece),
                    None => FogSquare::Empty,
                }
            }
        });

        FogOfWarView {
            observer,
            side_to_move: board.side_to_move(),
            visibility,
            squares,
            kingside_castle: board.has_kingside_castle_right(observer),
            queenside_castle: board.has_queenside_castle_right(observer),
        }
    }

    pub fn observer(&self) -> Color {
        self.observer
    }

    pub fn visibility(&self) -> Bitboard {
        self.visibility
    }

    #[inline]
    pub fn square(&self, sq: Square) -> FogSquare {
        self.squares[sq as usize]
    }

    pub fn is_visible(&self, sq: Square) -> bool {
        contains(self.visibility, sq)
    }

    /// Masked FEN: placement with `?` for unseen squares, then `-W`/`-B` for the side to
    /// move and the observer's own castling rights as `K`/`-` and `Q`/`-`.
    ///
    /// Only runs of known-empty squares collapse into digits.
    pub fn to_fen(&self) -> String {
        let placement = (1..=8u8)
            .rev()
            .map(|rank| {
                (1..=8u8)
                    .map(|file| self.square(pos_to_sq(rank, file)))
                    .dedup_by_with_count(|a, b| *a == FogSquare::Empty && *b == FogSquare::Empty)
                    .map(|(count, square)| match square {
                        FogSquare::Empty => count.to_string(),
                        FogSquare::Unknown => "?".to_string(),
                        FogSquare::Piece(piece) => piece.to_char().to_string(),
                    })
                    .collect::<String>()
            })
            .join("/");

        format!(
            "{placement}-{}{}{}",
            self.side_to_move.to_char().to_ascii_uppercase(),
            if self.kingside_castle { 'K' } else { '-' },
            if self.queenside_castle { 'Q' } else { '-' },
        )
    }

    /// How `mv` looks to this observer. Unseen start or target squares are zeroed and
    /// marked in the uncertainty bits, and the flag is dropped once anything is hidden.
    pub fn observe_move(&self, mv: Move) -> Move {
        let start_seen = self.is_visible(mv.start());
        let target_seen = self.is_visible(mv.target());
        match (start_seen, target_seen) {
            (true, true) => mv,
            (true, false) => Move::pack(mv.start(), 0, 0, UNKNOWN_TARGET),
            (false, true) => Move::pack(0, mv.target(), 0, UNKNOWN_START),
            (false, false) => Move::pack(0, 0, 0, UNKNOWN_START | UNKNOWN_TARGET),
        }
    }
}

impl fmt::Display for FogOfWarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (1..=8).rev() {
            write!(f, "{rank} ")?;
            for file in 1..=8 {
                match self.square(pos_to_sq(rank, file)) {
                    FogSquare::Unknown => write!(f, "? ")?,
                    FogSquare::Empty => write!(f, ". ")?,
                    FogSquare::Piece(piece) => write!(f, "{} ", piece.to_symbol())?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")?;
        write!(f, "{} sees, {} to move", self.observer.to_human(), self.side_to_move.to_human())
    }
}
