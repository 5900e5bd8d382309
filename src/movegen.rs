//! Legal move generation.
//!
//! The generator works out, once per position, which enemy pieces give check, which
//! friendly pieces are pinned to the king and which squares the opponent attacks. Every
//! emitted move is then legal by construction:
//!
//! - king moves never land on an attacked square (the king itself is transparent to
//!   enemy sliders, so stepping back along a checking ray is caught),
//! - in double check only the king moves,
//! - in single check every other move must land on the check ray (capture the checker
//!   or block it),
//! - pinned pieces only move along the line through their king,
//! - en passant is re-checked against sliders once both pawns leave the board.

use crate::bitboard::{
    contains, pawn_attacks_bb, shift, sq_to_bb, AttackTables, BitboardIter, NOT_FILE_A,
    NOT_FILE_H, RANK_1, RANK_4, RANK_5, RANK_8,
};
use crate::board::Board;
use crate::movelist::MoveList;
use crate::moves::{Move, MoveFlag};
use crate::types::*;

/// Which under-promotions to emit alongside the queen promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromotionMode {
    /// Queen, knight, rook and bishop
    #[default]
    All,
    /// Queen and knight
    QueenAndKnight,
    /// Queen only
    QueenOnly,
}

/// Caller-owned scratch for move generation.
///
/// Everything cached here describes the position of the last [`MoveGenerator::generate`]
/// call and is recomputed on each call; reusing one generator across positions only saves
/// the allocation.
#[derive(Debug, Clone)]
pub struct MoveGenerator {
    pub promotion_mode: PromotionMode,
    include_quiet: bool,
    us: Color,
    them: Color,
    king_sq: Square,

    friendly: Bitboard,
    enemy: Bitboard,
    all: Bitboard,
    empty: Bitboard,
    empty_or_enemy: Bitboard,
    // If only captures should be generated, this has 1s only on enemy pieces.
    // Otherwise it has 1s everywhere.
    move_type_mask: Bitboard,

    in_check: bool,
    in_double_check: bool,
    // Squares that resolve a single check: the checker and the squares between it and
    // the king. All ones when not in check.
    check_ray_mask: Bitboard,
    pinned: Bitboard,
    opponent_attack_map: Bitboard,
    opponent_pawn_attack_map: Bitboard,
}

impl MoveGenerator {
    pub fn new() -> Self {
        Self::with_promotion_mode(PromotionMode::All)
    }

    pub fn with_promotion_mode(promotion_mode: PromotionMode) -> Self {
        Self {
            promotion_mode,
            include_quiet: true,
            us: Color::White,
            them: Color::Black,
            king_sq: 0,
            friendly: 0,
            enemy: 0,
            all: 0,
            empty: 0,
            empty_or_enemy: 0,
            move_type_mask: 0,
            in_check: false,
            in_double_check: false,
            check_ray_mask: 0,
            pinned: 0,
            opponent_attack_map: 0,
            opponent_pawn_attack_map: 0,
        }
    }

    /// Fill `list` with the legal moves of the side to move.
    ///
    /// With `include_quiet` false only captures are produced (plus queen promotions that
    /// capture), as used by quiescence search.
    pub fn generate(
        &mut self,
        board: &Board,
        tables: &AttackTables,
        include_quiet: bool,
        list: &mut MoveList,
    ) {
        list.clear();
        self.init(board, tables, include_quiet);

        self.generate_king_moves(board, tables, list);

        // Only king moves are valid in a double check position
        if self.in_double_check {
            return;
        }

        self.generate_sliding_moves(board, tables, list);
        self.generate_knight_moves(board, tables, list);
        self.generate_pawn_moves(board, tables, list);
    }

    /// Is the side to move of the last generated position in check
    pub fn in_check(&self) -> bool {
        self.in_check
    }

    pub fn in_double_check(&self) -> bool {
        self.in_double_check
    }

    /// Every square the opponent attacks, computed with the friendly king removed
    pub fn opponent_attack_map(&self) -> Bitboard {
        self.opponent_attack_map
    }

    pub fn opponent_pawn_attack_map(&self) -> Bitboard {
        self.opponent_pawn_attack_map
    }

    fn init(&mut self, board: &Board, tables: &AttackTables, include_quiet: bool) {
        self.include_quiet = include_quiet;
        self.us = board.side_to_move();
        self.them = self.us.other_color();
        self.king_sq = board.king_square(self.us);

        self.friendly = board.color_bb(self.us);
        self.enemy = board.color_bb(self.them);
        self.all = board.occupied();
        self.empty = !self.all;
        self.empty_or_enemy = self.empty | self.enemy;
        self.move_type_mask = if include_quiet { !0 } else { self.enemy };

        self.calculate_attack_data(board, tables);
    }

    fn calculate_attack_data(&mut self, board: &Board, tables: &AttackTables) {
        let them = self.them;
        let king = self.king_sq;

        // Sliders see through our king, so it cannot step back along a checking ray
        let occupied_no_king = self.all & !sq_to_bb(king);
        let mut attack_map = 0u64;
        for sq in BitboardIter(board.orthogonal_sliders(them)) {
            attack_map |= tables.rook_attacks(sq, occupied_no_king);
        }
        for sq in BitboardIter(board.diagonal_sliders(them)) {
            attack_map |= tables.bishop_attacks(sq, occupied_no_king);
        }
        for sq in BitboardIter(board.piece_bb(them, PieceType::Knight)) {
            attack_map |= tables.knight[sq as usize];
        }
        attack_map |= tables.king[board.king_square(them) as usize];

        self.opponent_pawn_attack_map = pawn_attacks_bb(board.piece_bb(them, PieceType::Pawn), them);
        self.opponent_attack_map = attack_map | self.opponent_pawn_attack_map;

        // Knight and pawn checkers are found by looking back from the king
        let mut checkers = (tables.knight[king as usize] & board.piece_bb(them, PieceType::Knight))
            | (tables.pawn[self.us.index()][king as usize] & board.piece_bb(them, PieceType::Pawn));
        let mut check_ray = checkers;

        // Enemy sliders with only friendly pieces (or nothing) between them and the king
        let snipers = (tables.rook_attacks(king, self.enemy) & board.orthogonal_sliders(them))
            | (tables.bishop_attacks(king, self.enemy) & board.diagonal_sliders(them));
        self.pinned = 0;
        for sniper in BitboardIter(snipers) {
            let between = tables.between(king, sniper);
            let blockers = between & self.all;
            if blockers == 0 {
                checkers |= sq_to_bb(sniper);
                check_ray |= between | sq_to_bb(sniper);
            } else if blockers.count_ones() == 1 {
                self.pinned |= blockers;
            }
        }

        self.in_check = checkers != 0;
        self.in_double_check = checkers.count_ones() > 1;
        self.check_ray_mask = if self.in_check { check_ray } else { !0 };
    }

    #[inline(always)]
    fn is_pinned(&self, sq: Square) -> bool {
        contains(self.pinned, sq)
    }

    /// A pinned piece may only move along the line through its king
    #[inline(always)]
    fn respects_pin(&self, tables: &AttackTables, start: Square, target: Square) -> bool {
        !self.is_pinned(start) || contains(tables.line(self.king_sq, start), target)
    }

    // =========================================================================
    // King moves
    // =========================================================================

    fn generate_king_moves(&self, board: &Board, tables: &AttackTables, list: &mut MoveList) {
        let king = self.king_sq;
        let legal_mask = !(self.opponent_attack_map | self.friendly);
        let targets = tables.king[king as usize] & legal_mask & self.move_type_mask;
        for target in BitboardIter(targets) {
            list.push(Move::new(king, target, MoveFlag::None));
        }

        if !self.include_quiet || self.in_check {
            return;
        }

        let home = match self.us {
            Color::White => 0,
            Color::Black => 56,
        };
        if king != home + 4 {
            return;
        }
        let castle_blockers = self.opponent_attack_map | self.all;
        let rooks = board.piece_bb(self.us, PieceType::Rook);

        // Kingside (e -> g): f and g empty and unattacked
        if board.has_kingside_castle_right(self.us) && contains(rooks, home + 7) {
            let path = sq_to_bb(home + 5) | sq_to_bb(home + 6);
            if path & castle_blockers == 0 {
                list.push(Move::new(king, home + 6, MoveFlag::Castle));
            }
        }

        // Queenside (e -> c): c and d empty and unattacked, b only empty
        if board.has_queenside_castle_right(self.us) && contains(rooks, home) {
            let path = sq_to_bb(home + 2) | sq_to_bb(home + 3);
            if path & castle_blockers == 0 && sq_to_bb(home + 1) & self.all == 0 {
                list.push(Move::new(king, home + 2, MoveFlag::Castle));
            }
        }
    }

    // =========================================================================
    // Sliding pieces
    // =========================================================================

    fn generate_sliding_moves(&self, board: &Board, tables: &AttackTables, list: &mut MoveList) {
        // Limit movement to empty or enemy squares, and must block check if king is in check.
        let move_mask = self.empty_or_enemy & self.check_ray_mask & self.move_type_mask;

        let mut orthogonal_sliders = board.orthogonal_sliders(self.us);
        let mut diagonal_sliders = board.diagonal_sliders(self.us);

        // Pinned pieces cannot move if king is in check
        if self.in_check {
            orthogonal_sliders &= !self.pinned;
            diagonal_sliders &= !self.pinned;
        }

        for start in BitboardIter(orthogonal_sliders) {
            let mut targets = tables.rook_attacks(start, self.all) & move_mask;
            if self.is_pinned(start) {
                targets &= tables.line(self.king_sq, start);
            }
            for target in BitboardIter(targets) {
                list.push(Move::new(start, target, MoveFlag::None));
            }
        }

        for start in BitboardIter(diagonal_sliders) {
            let mut targets = tables.bishop_attacks(start, self.all) & move_mask;
            if self.is_pinned(start) {
                targets &= tables.line(self.king_sq, start);
            }
            for target in BitboardIter(targets) {
                list.push(Move::new(start, target, MoveFlag::None));
            }
        }
    }

    // =========================================================================
    // Knights
    // =========================================================================

    fn generate_knight_moves(&self, board: &Board, tables: &AttackTables, list: &mut MoveList) {
        // A pinned knight can never stay on its pin line
        let knights = board.piece_bb(self.us, PieceType::Knight) & !self.pinned;
        let move_mask = self.empty_or_enemy & self.check_ray_mask & self.move_type_mask;

        for start in BitboardIter(knights) {
            let targets = tables.knight[start as usize] & move_mask;
            for target in BitboardIter(targets) {
                list.push(Move::new(start, target, MoveFlag::None));
            }
        }
    }

    // =========================================================================
    // Pawns
    // =========================================================================

    fn generate_pawn_moves(&self, board: &Board, tables: &AttackTables, list: &mut MoveList) {
        let white = self.us == Color::White;
        let push_dir: i32 = if white { 1 } else { -1 };
        let push_offset = push_dir * 8;

        let pawns = board.piece_bb(self.us, PieceType::Pawn);
        let promotion_rank = if white { RANK_8 } else { RANK_1 };

        let single_push = shift(pawns, push_offset) & self.empty;
        let push_promotions = single_push & promotion_rank & self.check_ray_mask;

        // Capture "a" goes towards the a-file for white, the h-file for black
        let (edge_a, edge_b) = if white {
            (NOT_FILE_A, NOT_FILE_H)
        } else {
            (NOT_FILE_H, NOT_FILE_A)
        };
        let mut capture_a = shift(pawns & edge_a, push_dir * 7) & self.enemy & self.check_ray_mask;
        let mut capture_b = shift(pawns & edge_b, push_dir * 9) & self.enemy & self.check_ray_mask;

        let single_push_no_promotions = single_push & !promotion_rank & self.check_ray_mask;

        let capture_promotions_a = capture_a & promotion_rank;
        let capture_promotions_b = capture_b & promotion_rank;
        capture_a &= !promotion_rank;
        capture_b &= !promotion_rank;

        let from = |target: Square, offset: i32| (target as i32 - offset) as Square;

        // Single / double push
        if self.include_quiet {
            for target in BitboardIter(single_push_no_promotions) {
                let start = from(target, push_offset);
                if self.respects_pin(tables, start, target) {
                    list.push(Move::new(start, target, MoveFlag::None));
                }
            }

            let double_push_rank = if white { RANK_4 } else { RANK_5 };
            let double_push =
                shift(single_push, push_offset) & self.empty & double_push_rank & self.check_ray_mask;
            for target in BitboardIter(double_push) {
                let start = from(target, push_offset * 2);
                if self.respects_pin(tables, start, target) {
                    list.push(Move::new(start, target, MoveFlag::PawnDoublePush));
                }
            }
        }

        // Captures
        for target in BitboardIter(capture_a) {
            let start = from(target, push_dir * 7);
            if self.respects_pin(tables, start, target) {
                list.push(Move::new(start, target, MoveFlag::None));
            }
        }
        for target in BitboardIter(capture_b) {
            let start = from(target, push_dir * 9);
            if self.respects_pin(tables, start, target) {
                list.push(Move::new(start, target, MoveFlag::None));
            }
        }

        // Promotions
        if self.include_quiet {
            for target in BitboardIter(push_promotions) {
                let start = from(target, push_offset);
                if self.respects_pin(tables, start, target) {
                    self.generate_promotions(start, target, list);
                }
            }
        }
        for target in BitboardIter(capture_promotions_a) {
            let start = from(target, push_dir * 7);
            if self.respects_pin(tables, start, target) {
                self.generate_promotions(start, target, list);
            }
        }
        for target in BitboardIter(capture_promotions_b) {
            let start = from(target, push_dir * 9);
            if self.respects_pin(tables, start, target) {
                self.generate_promotions(start, target, list);
            }
        }

        self.generate_en_passant(board, tables, pawns, push_offset, list);
    }

    fn generate_en_passant(
        &self,
        board: &Board,
        tables: &AttackTables,
        pawns: Bitboard,
        push_offset: i32,
        list: &mut MoveList,
    ) {
        let ep_file = board.en_passant_file();
        if ep_file == 0 {
            return;
        }
        let ep_rank_index = if self.us == Color::White { 5 } else { 2 };
        let target = ep_rank_index * 8 + (ep_file - 1);
        let captured_pawn_sq = (target as i32 - push_offset) as Square;

        if !contains(board.piece_bb(self.them, PieceType::Pawn), captured_pawn_sq)
            || contains(self.all, target)
        {
            return;
        }
        // In check, the capture must remove the checker or block on the target square
        if self.check_ray_mask & (sq_to_bb(captured_pawn_sq) | sq_to_bb(target)) == 0 {
            return;
        }

        // Reverse lookup: our pawns that attack the target are those an enemy pawn on the
        // target would attack
        let capturers = pawns & tables.pawn[self.them.index()][target as usize];
        for start in BitboardIter(capturers) {
            if !self.respects_pin(tables, start, target) {
                continue;
            }
            if !self.in_check_after_en_passant(board, tables, start, target, captured_pawn_sq) {
                list.push(Move::new(start, target, MoveFlag::EnPassantCapture));
            }
        }
    }

    /// Both pawns leave their squares at once, which can uncover a slider the pin
    /// detection never saw (two pieces stood between it and the king).
    fn in_check_after_en_passant(
        &self,
        board: &Board,
        tables: &AttackTables,
        start: Square,
        target: Square,
        captured_pawn_sq: Square,
    ) -> bool {
        let occupied =
            (self.all ^ sq_to_bb(start) ^ sq_to_bb(captured_pawn_sq)) | sq_to_bb(target);
        tables.rook_attacks(self.king_sq, occupied) & board.orthogonal_sliders(self.them) != 0
            || tables.bishop_attacks(self.king_sq, occupied) & board.diagonal_sliders(self.them) != 0
    }

    fn generate_promotions(&self, start: Square, target: Square, list: &mut MoveList) {
        list.push(Move::new(start, target, MoveFlag::PromoteToQueen));
        // Don't generate non-queen promotions in capture-only mode
        if !self.include_quiet {
            return;
        }
        match self.promotion_mode {
            PromotionMode::All => {
                list.push(Move::new(start, target, MoveFlag::PromoteToKnight));
                list.push(Move::new(start, target, MoveFlag::PromoteToRook));
                list.push(Move::new(start, target, MoveFlag::PromoteToBishop));
            }
            PromotionMode::QueenAndKnight => {
                list.push(Move::new(start, target, MoveFlag::PromoteToKnight));
            }
            PromotionMode::QueenOnly => {}
        }
    }
}

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Legal moves of the side to move with a fresh scratch context.
pub fn generate_moves(
    board: &Board,
    tables: &AttackTables,
    include_quiet: bool,
    promotion_mode: PromotionMode,
) -> MoveList {
    let mut list = MoveList::new();
    MoveGenerator::with_promotion_mode(promotion_mode).generate(board, tables, include_quiet, &mut list);
    list
}

/// All legal moves, every promotion piece included
pub fn legal_moves(board: &Board, tables: &AttackTables) -> MoveList {
    generate_moves(board, tables, true, PromotionMode::All)
}
