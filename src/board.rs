//! Canonical position: bitboards plus a mailbox, with reversible `push`/`pop`.

use std::fmt;
use std::str::FromStr;

use color_eyre::eyre::{bail, eyre, Report, Result, WrapErr};

use crate::bitboard::{sq_to_bb, AttackTables, BitboardIter};
use crate::moves::{Move, MoveFlag};
use crate::types::*;
use crate::zobrist::ZOBRIST_KEYS;

/// Castling rights as a 4-bit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const WHITE_KINGSIDE: u8 = 0b0001;
    pub const WHITE_QUEENSIDE: u8 = 0b0010;
    pub const BLACK_KINGSIDE: u8 = 0b0100;
    pub const BLACK_QUEENSIDE: u8 = 0b1000;
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    pub const fn from_bits(bits: u8) -> Self {
        CastlingRights(bits & 0b1111)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub fn kingside(&self, color: Color) -> bool {
        self.0 & kingside_bit(color) != 0
    }

    pub fn queenside(&self, color: Color) -> bool {
        self.0 & queenside_bit(color) != 0
    }

    /// FEN castling field, `-` when no rights are left.
    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for (bit, c) in [
            (Self::WHITE_KINGSIDE, 'K'),
            (Self::WHITE_QUEENSIDE, 'Q'),
            (Self::BLACK_KINGSIDE, 'k'),
            (Self::BLACK_QUEENSIDE, 'q'),
        ] {
            if self.0 & bit != 0 {
                s.push(c);
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

const fn kingside_bit(color: Color) -> u8 {
    match color {
        Color::White => CastlingRights::WHITE_KINGSIDE,
        Color::Black => CastlingRights::BLACK_KINGSIDE,
    }
}

const fn queenside_bit(color: Color) -> u8 {
    match color {
        Color::White => CastlingRights::WHITE_QUEENSIDE,
        Color::Black => CastlingRights::BLACK_QUEENSIDE,
    }
}

/// Rights that survive a move touching each square. A move clears the rights
/// tied to its start and target squares.
const CASTLING_KEEP: [u8; 64] = {
    let mut keep = [0b1111u8; 64];
    keep[0] = !CastlingRights::WHITE_QUEENSIDE & 0b1111; // a1
    keep[4] = !(CastlingRights::WHITE_KINGSIDE | CastlingRights::WHITE_QUEENSIDE) & 0b1111; // e1
    keep[7] = !CastlingRights::WHITE_KINGSIDE & 0b1111; // h1
    keep[56] = !CastlingRights::BLACK_QUEENSIDE & 0b1111; // a8
    keep[60] = !(CastlingRights::BLACK_KINGSIDE | CastlingRights::BLACK_QUEENSIDE) & 0b1111; // e8
    keep[63] = !CastlingRights::BLACK_KINGSIDE & 0b1111; // h8
    keep
};

/// Information needed to undo a move. Stored by `push`, consumed by `pop`.
#[derive(Debug, Clone, Copy)]
pub struct UndoInfo {
    pub mv: Move,
    pub captured: Option<PieceType>,
    pub castling: CastlingRights,
    pub en_passant_file: u8,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub hash: u64,
}

/// Information needed to undo a null move (pass to opponent without moving)
#[derive(Debug, Clone, Copy)]
pub struct NullMoveUndo {
    pub en_passant_file: u8,
    pub hash: u64,
}

#[derive(Clone)]
pub struct Board {
    /// pieces[color][piece_type]
    pieces: [[Bitboard; 6]; 2],
    colors: [Bitboard; 2],
    occupied: Bitboard,
    squares: [Option<Piece>; 64],
    king_squares: [Square; 2],
    side_to_move: Color,
    castling: CastlingRights,
    /// 0 for none, otherwise the 1-indexed file of the pawn that just double pushed
    en_passant_file: u8,
    // number of half moves since last capture or pawn advance
    halfmove_clock: u32,
    // number of full moves. Starts at 1, and gets incremented after every black move
    fullmove_number: u32,
    hash: u64,
    history: Vec<UndoInfo>,
}

impl Board {
    /// The standard starting position
    pub fn new() -> Self {
        Self::from_fen(STARTING_POSITION_FEN).expect("starting position FEN is valid")
    }

    fn empty() -> Self {
        Board {
            pieces: [[0; 6]; 2],
            colors: [0; 2],
            occupied: 0,
            squares: [None; 64],
            king_squares: [0; 2],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant_file: 0,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            history: Vec::new(),
        }
    }

    /// Parse a FEN string. The halfmove and fullmove fields may be omitted.
    pub fn from_fen(fen: &str) -> Result<Board> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&parts.len()) {
            bail!("FEN must have 4 to 6 space delimited fields, got {}: `{fen}`", parts.len());
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            bail!("FEN piece placement must have 8 ranks, got {}", ranks.len());
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 8 - i as u8;
            let mut file = 1u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        bail!("Invalid empty-square count `{c}` on rank {rank}");
                    }
                    file += skip as u8;
                    if file > 9 {
                        bail!("Rank {rank} has more than 8 squares");
                    }
                } else {
                    if file > 8 {
                        bail!("Rank {rank} has more than 8 squares");
                    }
                    let piece = Piece::from_char(c).wrap_err_with(|| format!("on rank {rank}"))?;
                    board.put_piece(pos_to_sq(rank, file), piece);
                    file += 1;
                }
            }
            if file != 9 {
                bail!("Rank {rank} has {} squares, expected 8", file - 1);
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board.piece_bb(color, PieceType::King);
            if kings.count_ones() != 1 {
                bail!("Position must have exactly one {} king", color.to_human());
            }
            board.king_squares[color.index()] = kings.trailing_zeros() as u8;
        }

        let mut side_chars = parts[1].chars();
        board.side_to_move = match (side_chars.next(), side_chars.next()) {
            (Some(c), None) => Color::from_char(c)?,
            _ => bail!("Side to move must be `w` or `b`, got `{}`", parts[1]),
        };

        let mut castling = 0u8;
        if parts[2] != "-" {
            for c in parts[2].chars() {
                castling |= match c {
                    'K' => CastlingRights::WHITE_KINGSIDE,
                    'Q' => CastlingRights::WHITE_QUEENSIDE,
                    'k' => CastlingRights::BLACK_KINGSIDE,
                    'q' => CastlingRights::BLACK_QUEENSIDE,
                    other => bail!("Unexpected castling flag `{other}`"),
                };
            }
        }
        board.castling = CastlingRights::from_bits(castling);

        board.en_passant_file = if parts[3] == "-" {
            0
        } else {
            let sq = square_from_algebraic(parts[3]).wrap_err("Invalid en passant square")?;
            let expected_rank = match board.side_to_move {
                Color::White => 6,
                Color::Black => 3,
            };
            if sq_rank(sq) != expected_rank {
                bail!("En passant square {} is on the wrong rank", parts[3]);
            }
            sq_file(sq)
        };

        if let Some(halfmove) = parts.get(4) {
            board.halfmove_clock = halfmove
                .parse()
                .map_err(|_| eyre!("Halfmove clock should be a u32, got `{halfmove}`"))?;
        }
        if let Some(fullmove) = parts.get(5) {
            board.fullmove_number = fullmove
                .parse()
                .map_err(|_| eyre!("Fullmove number should be a u32, got `{fullmove}`"))?;
        }

        board.hash = board.compute_hash();
        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (1..=8).rev() {
            let mut empty = 0;
            for file in 1..=8 {
                match self.squares[pos_to_sq(rank, file) as usize] {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 1 {
                placement.push('/');
            }
        }

        let en_passant = match self.en_passant_square() {
            Some(sq) => square_to_algebraic(sq),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement,
            self.side_to_move.to_char(),
            self.castling.to_fen(),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline(always)]
    pub fn piece_bb(&self, color: Color, piece_type: PieceType) -> Bitboard {
        self.pieces[color.index()][piece_type.index()]
    }

    #[inline(always)]
    pub fn color_bb(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    /// Rooks and queens
    #[inline(always)]
    pub fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        self.piece_bb(color, PieceType::Rook) | self.piece_bb(color, PieceType::Queen)
    }

    /// Bishops and queens
    #[inline(always)]
    pub fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.piece_bb(color, PieceType::Bishop) | self.piece_bb(color, PieceType::Queen)
    }

    #[inline(always)]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq as usize]
    }

    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Square {
        self.king_squares[color.index()]
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    pub fn has_kingside_castle_right(&self, color: Color) -> bool {
        self.castling.kingside(color)
    }

    pub fn has_queenside_castle_right(&self, color: Color) -> bool {
        self.castling.queenside(color)
    }

    /// 0 when no en passant capture is possible, otherwise the file (1-8) of the
    /// pawn that just made a double push.
    pub fn en_passant_file(&self) -> u8 {
        self.en_passant_file
    }

    /// The square a capturing pawn would land on, if any
    pub fn en_passant_square(&self) -> Option<Square> {
        if self.en_passant_file == 0 {
            return None;
        }
        let rank = match self.side_to_move {
            Color::White => 6,
            Color::Black => 3,
        };
        Some(pos_to_sq(rank, self.en_passant_file))
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline(always)]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|undo| undo.mv)
    }

    /// Hash recomputed from scratch. Matches [`Board::hash`] whenever the incremental
    /// updates are correct.
    pub fn compute_hash(&self) -> u64 {
        let keys = &*ZOBRIST_KEYS;
        let mut hash = 0u64;
        for sq in BitboardIter(self.occupied) {
            if let Some(piece) = self.squares[sq as usize] {
                hash ^= keys.piece_key(piece.color, piece.piece_type, sq);
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= keys.side_to_move;
        }
        hash ^= keys.castling[self.castling.bits() as usize];
        hash ^= keys.en_passant_key(self.en_passant_file);
        hash
    }

    // =========================================================================
    // Attacks
    // =========================================================================

    /// All pieces of `by` attacking `sq`, with the given occupancy.
    pub fn attackers_to(
        &self,
        sq: Square,
        by: Color,
        occupied: Bitboard,
        tables: &AttackTables,
    ) -> Bitboard {
        let idx = sq as usize;
        (tables.pawn[by.other_color().index()][idx] & self.piece_bb(by, PieceType::Pawn))
            | (tables.knight[idx] & self.piece_bb(by, PieceType::Knight))
            | (tables.king[idx] & self.piece_bb(by, PieceType::King))
            | (tables.rook_attacks(sq, occupied) & self.orthogonal_sliders(by))
            | (tables.bishop_attacks(sq, occupied) & self.diagonal_sliders(by))
    }

    pub fn is_square_attacked(&self, sq: Square, by: Color, tables: &AttackTables) -> bool {
        self.attackers_to(sq, by, self.occupied, tables) != 0
    }

    /// Is the side to move in check
    pub fn is_in_check(&self, tables: &AttackTables) -> bool {
        let us = self.side_to_move;
        self.is_square_attacked(self.king_square(us), us.other_color(), tables)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    fn put_piece(&mut self, sq: Square, piece: Piece) {
        let bb = sq_to_bb(sq);
        self.pieces[piece.color.index()][piece.piece_type.index()] |= bb;
        self.colors[piece.color.index()] |= bb;
        self.occupied |= bb;
        self.squares[sq as usize] = Some(piece);
        self.hash ^= ZOBRIST_KEYS.piece_key(piece.color, piece.piece_type, sq);
    }

    fn remove_piece(&mut self, sq: Square) -> Piece {
        let piece = match self.squares[sq as usize].take() {
            Some(piece) => piece,
            None => panic!("No piece to remove on {}", square_to_algebraic(sq)),
        };
        let bb = sq_to_bb(sq);
        self.pieces[piece.color.index()][piece.piece_type.index()] &= !bb;
        self.colors[piece.color.index()] &= !bb;
        self.occupied &= !bb;
        self.hash ^= ZOBRIST_KEYS.piece_key(piece.color, piece.piece_type, sq);
        piece
    }

    fn move_piece(&mut self, from: Square, to: Square) {
        let piece = self.remove_piece(from);
        self.put_piece(to, piece);
    }

    /// Rook start and target squares for a castle landing the king on `king_target`
    fn castling_rook_squares(king_target: Square) -> (Square, Square) {
        if sq_file(king_target) == 7 {
            (king_target + 1, king_target - 1)
        } else {
            (king_target - 2, king_target + 1)
        }
    }

    /// Play a move. The move must be legal in this position, typically one produced by
    /// the move generator; legality is not re-checked, but obvious contract violations
    /// panic instead of corrupting the board.
    pub fn push(&mut self, mv: Move) {
        assert!(
            mv.is_fully_known(),
            "Cannot play a move with unknown squares: {mv:?}"
        );
        let us = self.side_to_move;
        let them = us.other_color();
        let (start, target, flag) = (mv.start(), mv.target(), mv.flag());

        let moving = match self.squares[start as usize] {
            Some(piece) => piece,
            None => panic!("No piece on {} for move {mv}", square_to_algebraic(start)),
        };
        assert!(
            moving.color == us,
            "Move {mv} moves a {} piece but it is {} to move",
            moving.color.to_human(),
            us.to_human()
        );

        let captured_sq = if flag == MoveFlag::EnPassantCapture {
            mv.en_passant_capture_square()
        } else {
            target
        };
        let captured = self.squares[captured_sq as usize];
        if let Some(piece) = captured {
            assert!(piece.color == them, "Move {mv} captures its own piece");
        }

        self.history.push(UndoInfo {
            mv,
            captured: captured.map(|p| p.piece_type),
            castling: self.castling,
            en_passant_file: self.en_passant_file,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
        });

        let keys = &*ZOBRIST_KEYS;
        self.hash ^= keys.castling[self.castling.bits() as usize];
        self.hash ^= keys.en_passant_key(self.en_passant_file);

        if captured.is_some() {
            self.remove_piece(captured_sq);
        }
        self.move_piece(start, target);

        if let Some(promoted) = flag.promotion_piece() {
            self.remove_piece(target);
            self.put_piece(target, Piece::new(us, promoted));
        }

        if flag == MoveFlag::Castle {
            let (rook_from, rook_to) = Self::castling_rook_squares(target);
            self.move_piece(rook_from, rook_to);
        }

        if moving.piece_type == PieceType::King {
            self.king_squares[us.index()] = target;
        }

        self.castling = CastlingRights::from_bits(
            self.castling.bits() & CASTLING_KEEP[start as usize] & CASTLING_KEEP[target as usize],
        );
        self.en_passant_file = if flag == MoveFlag::PawnDoublePush {
            sq_file(start)
        } else {
            0
        };

        if moving.piece_type == PieceType::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = them;
        self.hash ^= keys.side_to_move;
        self.hash ^= keys.castling[self.castling.bits() as usize];
        self.hash ^= keys.en_passant_key(self.en_passant_file);
    }

    /// Undo the last pushed move, returning it. `None` if nothing was pushed.
    pub fn pop(&mut self) -> Option<Move> {
        let undo = self.history.pop()?;
        let mv = undo.mv;
        let them = self.side_to_move;
        let us = them.other_color();
        let (start, target, flag) = (mv.start(), mv.target(), mv.flag());

        if flag.promotion_piece().is_some() {
            self.remove_piece(target);
            self.put_piece(target, Piece::new(us, PieceType::Pawn));
        }
        if flag == MoveFlag::Castle {
            let (rook_from, rook_to) = Self::castling_rook_squares(target);
            self.move_piece(rook_to, rook_from);
        }
        self.move_piece(target, start);

        if let Some(piece_type) = undo.captured {
            let captured_sq = if flag == MoveFlag::EnPassantCapture {
                mv.en_passant_capture_square()
            } else {
                target
            };
            self.put_piece(captured_sq, Piece::new(them, piece_type));
        }

        if let Some(Piece { piece_type: PieceType::King, .. }) = self.squares[start as usize] {
            self.king_squares[us.index()] = start;
        }

        self.side_to_move = us;
        self.castling = undo.castling;
        self.en_passant_file = undo.en_passant_file;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
        self.hash = undo.hash;
        Some(mv)
    }

    /// Pass the turn without moving. Clears any en passant file.
    pub fn make_null_move(&mut self) -> NullMoveUndo {
        let undo = NullMoveUndo {
            en_passant_file: self.en_passant_file,
            hash: self.hash,
        };
        let keys = &*ZOBRIST_KEYS;
        self.hash ^= keys.en_passant_key(self.en_passant_file);
        self.en_passant_file = 0;
        self.side_to_move = self.side_to_move.other_color();
        self.hash ^= keys.side_to_move;
        undo
    }

    pub fn unmake_null_move(&mut self, undo: NullMoveUndo) {
        self.side_to_move = self.side_to_move.other_color();
        self.en_passant_file = undo.en_passant_file;
        self.hash = undo.hash;
    }

    pub fn draw_board(&self) -> String {
        let mut res = String::new();
        for rank in (1..=8).rev() {
            res.push_str(&format!("{rank} "));
            for file in 1..=8 {
                match self.squares[pos_to_sq(rank, file) as usize] {
                    Some(piece) => res.push_str(piece.to_symbol()),
                    None => res.push('.'),
                }
                res.push(' ');
            }
            res.push('\n');
        }
        res.push_str("  a b c d e f g h\n");
        res
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for Board {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self> {
        Board::from_fen(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.draw_board())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({})", self.to_fen())
    }
}
