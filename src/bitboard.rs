//! Bitboard helpers and precomputed attack tables for move generation.
//!
//! A bitboard is a 64-bit integer where each bit represents a square on the chess board.
//! Square indexing: a1 = 0, b1 = 1, ..., h1 = 7, a2 = 8, ..., h8 = 63
//!
//! Magic bitboards are used for O(1) sliding piece attack lookups. Each square has a
//! "magic number" that maps the relevant blockers to an attack set via a perfect hash.
//! The magics are found when the tables are built, from a fixed seed, so every process
//! builds identical tables.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Bitboard, Color, Square};

pub const FILE_A: Bitboard = 0x0101_0101_0101_0101;
pub const FILE_H: Bitboard = FILE_A << 7;
pub const NOT_FILE_A: Bitboard = !FILE_A;
pub const NOT_FILE_H: Bitboard = !FILE_H;

pub const RANK_1: Bitboard = 0xff;
pub const RANK_4: Bitboard = RANK_1 << (3 * 8);
pub const RANK_5: Bitboard = RANK_1 << (4 * 8);
pub const RANK_8: Bitboard = RANK_1 << (7 * 8);

const MAGIC_SEED: u64 = 0x1234_5678_90AB_CDEF;

/// Convert a square index to a bitboard with that single bit set
#[inline(always)]
pub const fn sq_to_bb(sq: Square) -> Bitboard {
    1u64 << sq
}

#[inline(always)]
pub const fn contains(bb: Bitboard, sq: Square) -> bool {
    bb & sq_to_bb(sq) != 0
}

/// Shift every bit by `offset` squares, towards h8 when positive.
#[inline(always)]
pub const fn shift(bb: Bitboard, offset: i32) -> Bitboard {
    if offset > 0 {
        bb << offset
    } else {
        bb >> -offset
    }
}

/// Iterate over set bits in a bitboard, returning square indices
pub struct BitboardIter(pub Bitboard);

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 == 0 {
            None
        } else {
            let sq = self.0.trailing_zeros() as u8;
            self.0 &= self.0 - 1; // Clear the lowest set bit
            Some(sq)
        }
    }
}

/// Squares attacked by every pawn in `pawns` of the given color.
#[inline]
pub fn pawn_attacks_bb(pawns: Bitboard, color: Color) -> Bitboard {
    match color {
        Color::White => ((pawns & NOT_FILE_A) << 7) | ((pawns & NOT_FILE_H) << 9),
        Color::Black => ((pawns & NOT_FILE_H) >> 7) | ((pawns & NOT_FILE_A) >> 9),
    }
}

/// Magic lookup parameters for one square of one slider type.
#[derive(Debug, Clone, Copy, Default)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline(always)]
    fn index(&self, occupied: Bitboard) -> usize {
        self.offset + ((occupied & self.mask).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Precomputed attack tables. Immutable once built.
pub struct AttackTables {
    /// Knight attacks for each square
    pub knight: [Bitboard; 64],
    /// King attacks for each square
    pub king: [Bitboard; 64],
    /// Pawn attacks for each color and square: pawn[color.index()][square]
    pub pawn: [[Bitboard; 64]; 2],
    rook_magics: [Magic; 64],
    bishop_magics: [Magic; 64],
    /// Attack sets for all rook then bishop entries, addressed through the magics
    slider_attacks: Vec<Bitboard>,
    between: Vec<[Bitboard; 64]>,
    line: Vec<[Bitboard; 64]>,
}

impl AttackTables {
    pub fn new() -> Self {
        let mut knight = [0u64; 64];
        let mut king = [0u64; 64];
        let mut pawn = [[0u64; 64]; 2];

        // Knight move deltas: (rank_delta, file_delta)
        const KNIGHT_DELTAS: [(i8, i8); 8] = [
            (-2, -1), (-2, 1), (-1, -2), (-1, 2),
            (1, -2), (1, 2), (2, -1), (2, 1),
        ];

        // King move deltas
        const KING_DELTAS: [(i8, i8); 8] = [
            (-1, -1), (-1, 0), (-1, 1),
            (0, -1),           (0, 1),
            (1, -1),  (1, 0),  (1, 1),
        ];

        for sq in 0..64u8 {
            knight[sq as usize] = Self::offsets_from(sq, &KNIGHT_DELTAS);
            king[sq as usize] = Self::offsets_from(sq, &KING_DELTAS);
            pawn[Color::White.index()][sq as usize] = Self::offsets_from(sq, &[(1, -1), (1, 1)]);
            pawn[Color::Black.index()][sq as usize] = Self::offsets_from(sq, &[(-1, -1), (-1, 1)]);
        }

        let mut rng = StdRng::seed_from_u64(MAGIC_SEED);
        let mut slider_attacks = Vec::new();
        let mut rook_magics = [Magic::default(); 64];
        let mut bishop_magics = [Magic::default(); 64];
        for sq in 0..64u8 {
            rook_magics[sq as usize] =
                Self::find_magic(sq, &ROOK_DIRECTIONS, &mut rng, &mut slider_attacks);
        }
        for sq in 0..64u8 {
            bishop_magics[sq as usize] =
                Self::find_magic(sq, &BISHOP_DIRECTIONS, &mut rng, &mut slider_attacks);
        }

        let mut tables = AttackTables {
            knight,
            king,
            pawn,
            rook_magics,
            bishop_magics,
            slider_attacks,
            between: vec![[0u64; 64]; 64],
            line: vec![[0u64; 64]; 64],
        };
        tables.init_lines();
        tables
    }

    /// Bitboard of the squares reached from `sq` by single steps, dropping off-board ones
    fn offsets_from(sq: Square, deltas: &[(i8, i8)]) -> Bitboard {
        let rank = (sq >> 3) as i8;
        let file = (sq & 7) as i8;
        let mut bb = 0u64;
        for (dr, df) in deltas {
            let (nr, nf) = (rank + dr, file + df);
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                bb |= 1u64 << (nr * 8 + nf);
            }
        }
        bb
    }

    /// Find a collision-free magic for `sq` and append its attack table to `attacks`.
    fn find_magic(
        sq: Square,
        directions: &[(i32, i32); 4],
        rng: &mut StdRng,
        attacks: &mut Vec<Bitboard>,
    ) -> Magic {
        let mask = relevant_mask(sq, directions);
        let bits = mask.count_ones();
        let size = 1usize << bits;

        let occupancies: Vec<Bitboard> = all_subsets(mask).collect();
        let reference: Vec<Bitboard> = occupancies
            .iter()
            .map(|&occ| sliding_attacks(sq, occ, directions))
            .collect();

        let mut table = vec![0u64; size];
        // Epoch per slot instead of clearing the table on every failed candidate
        let mut epoch = vec![0u32; size];
        let mut attempt = 0u32;

        loop {
            let magic = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
            if (mask.wrapping_mul(magic) >> 56).count_ones() < 6 {
                continue;
            }
            attempt += 1;

            let candidate = Magic {
                mask,
                magic,
                shift: 64 - bits,
                offset: 0,
            };
            let mut ok = true;
            for (occ, &attack) in occupancies.iter().zip(reference.iter()) {
                let idx = candidate.index(*occ);
                if epoch[idx] < attempt {
                    epoch[idx] = attempt;
                    table[idx] = attack;
                } else if table[idx] != attack {
                    ok = false;
                    break;
                }
            }

            if ok {
                let offset = attacks.len();
                attacks.extend_from_slice(&table);
                return Magic { offset, ..candidate };
            }
        }
    }

    fn init_lines(&mut self) {
        for a in 0..64u8 {
            for b in 0..64u8 {
                if a == b {
                    continue;
                }
                let (a_bb, b_bb) = (sq_to_bb(a), sq_to_bb(b));
                if self.rook_attacks(a, 0) & b_bb != 0 {
                    self.between[a as usize][b as usize] =
                        self.rook_attacks(a, b_bb) & self.rook_attacks(b, a_bb);
                    self.line[a as usize][b as usize] =
                        (self.rook_attacks(a, 0) & self.rook_attacks(b, 0)) | a_bb | b_bb;
                } else if self.bishop_attacks(a, 0) & b_bb != 0 {
                    self.between[a as usize][b as usize] =
                        self.bishop_attacks(a, b_bb) & self.bishop_attacks(b, a_bb);
                    self.line[a as usize][b as usize] =
                        (self.bishop_attacks(a, 0) & self.bishop_attacks(b, 0)) | a_bb | b_bb;
                }
            }
        }
    }

    /// Get rook attacks using magic lookup
    #[inline(always)]
    pub fn rook_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.slider_attacks[self.rook_magics[sq as usize].index(occupied)]
    }

    /// Get bishop attacks using magic lookup
    #[inline(always)]
    pub fn bishop_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.slider_attacks[self.bishop_magics[sq as usize].index(occupied)]
    }

    /// Get queen attacks (combines bishop and rook)
    #[inline(always)]
    pub fn queen_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.rook_attacks(sq, occupied) | self.bishop_attacks(sq, occupied)
    }

    /// Blocker squares that matter for a rook on `sq`
    pub fn rook_mask(&self, sq: Square) -> Bitboard {
        self.rook_magics[sq as usize].mask
    }

    /// Blocker squares that matter for a bishop on `sq`
    pub fn bishop_mask(&self, sq: Square) -> Bitboard {
        self.bishop_magics[sq as usize].mask
    }

    /// Squares strictly between two squares sharing a rank, file or diagonal; empty otherwise.
    #[inline(always)]
    pub fn between(&self, a: Square, b: Square) -> Bitboard {
        self.between[a as usize][b as usize]
    }

    /// The whole rank, file or diagonal through both squares; empty if they are not aligned.
    #[inline(always)]
    pub fn line(&self, a: Square, b: Square) -> Bitboard {
        self.line[a as usize][b as usize]
    }
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide tables, built on first use. Concurrent first callers block until the
/// single initialization finishes.
pub static ATTACK_TABLES: Lazy<AttackTables> = Lazy::new(AttackTables::new);

#[inline]
pub fn attack_tables() -> &'static AttackTables {
    &ATTACK_TABLES
}

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Blocker mask for a slider: its rays, minus the board edge each ray runs into.
fn relevant_mask(sq: Square, directions: &[(i32, i32); 4]) -> Bitboard {
    let rank = (sq >> 3) as i32;
    let file = (sq & 7) as i32;
    let mut mask = 0u64;
    for &(dr, df) in directions {
        let mut r = rank + dr;
        let mut f = file + df;
        // Stop one short of the edge in the direction of travel
        while (0..8).contains(&(r + dr)) && (0..8).contains(&(f + df)) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

/// Slow ray walk, used only while building the tables
fn sliding_attacks(sq: Square, occupied: Bitboard, directions: &[(i32, i32); 4]) -> Bitboard {
    let rank = (sq >> 3) as i32;
    let file = (sq & 7) as i32;
    let mut attacks = 0u64;
    for &(dr, df) in directions {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target = 1u64 << (r * 8 + f);
            attacks |= target;
            if occupied & target != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

/// Generate all subsets of a mask using Carry-Rippler technique
fn all_subsets(mask: Bitboard) -> impl Iterator<Item = Bitboard> {
    let mut subset = 0u64;
    let mut done = false;
    std::iter::from_fn(move || {
        if done {
            return None;
        }
        let current = subset;
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            done = true;
        }
        Some(current)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::pos_to_sq;

    #[test]
    fn test_knight_attacks() {
        // Knight on e4 should attack d2, f2, c3, g3, c5, g5, d6, f6
        let sq = pos_to_sq(4, 5);
        let attacks = attack_tables().knight[sq as usize];

        for (rank, file) in [(2, 4), (2, 6), (3, 3), (3, 7), (5, 3), (5, 7), (6, 4), (6, 6)] {
            assert!(contains(attacks, pos_to_sq(rank, file)));
        }
        assert_eq!(attacks.count_ones(), 8);
    }

    #[test]
    fn test_knight_corner() {
        // Knight on a1 should only attack b3 and c2
        let attacks = attack_tables().knight[pos_to_sq(1, 1) as usize];
        assert!(contains(attacks, pos_to_sq(2, 3)));
        assert!(contains(attacks, pos_to_sq(3, 2)));
        assert_eq!(attacks.count_ones(), 2);
    }

    #[test]
    fn test_king_attacks() {
        let tables = attack_tables();
        assert_eq!(tables.king[pos_to_sq(4, 5) as usize].count_ones(), 8);
        assert_eq!(tables.king[pos_to_sq(1, 1) as usize].count_ones(), 3);
        assert_eq!(tables.king[pos_to_sq(8, 4) as usize].count_ones(), 5);
    }

    #[test]
    fn test_pawn_attacks() {
        let tables = attack_tables();
        // White pawn on e4 attacks d5 and f5
        let attacks = tables.pawn[Color::White.index()][pos_to_sq(4, 5) as usize];
        assert_eq!(attacks, sq_to_bb(pos_to_sq(5, 4)) | sq_to_bb(pos_to_sq(5, 6)));

        // Black pawn on a5 attacks only b4
        let attacks = tables.pawn[Color::Black.index()][pos_to_sq(5, 1) as usize];
        assert_eq!(attacks, sq_to_bb(pos_to_sq(4, 2)));

        // Set-wise attacks agree with the per-square table
        for sq in 0..64u8 {
            for color in [Color::White, Color::Black] {
                assert_eq!(
                    pawn_attacks_bb(sq_to_bb(sq), color),
                    tables.pawn[color.index()][sq as usize]
                );
            }
        }
    }

    #[test]
    fn test_relevant_masks() {
        let tables = attack_tables();
        assert_eq!(tables.rook_mask(pos_to_sq(1, 1)).count_ones(), 12);
        assert_eq!(tables.rook_mask(pos_to_sq(4, 5)).count_ones(), 10);
        assert_eq!(tables.bishop_mask(pos_to_sq(1, 1)).count_ones(), 6);
        assert_eq!(tables.bishop_mask(pos_to_sq(4, 5)).count_ones(), 9);
        // Edges are never relevant for a central rook
        assert_eq!(tables.rook_mask(pos_to_sq(4, 5)) & (RANK_1 | RANK_8 | FILE_A | FILE_H), 0);
    }

    #[test]
    fn test_rook_attacks_with_blockers() {
        // Rook on e4, with pieces on e2 and g4
        let sq = pos_to_sq(4, 5);
        let occupied = sq_to_bb(pos_to_sq(2, 5)) | sq_to_bb(pos_to_sq(4, 7));
        let attacks = attack_tables().rook_attacks(sq, occupied);

        assert!(contains(attacks, pos_to_sq(2, 5))); // e2 (blocker)
        assert!(contains(attacks, pos_to_sq(4, 7))); // g4 (blocker)
        assert!(!contains(attacks, pos_to_sq(1, 5))); // e1 (blocked)
        assert!(!contains(attacks, pos_to_sq(4, 8))); // h4 (blocked)
        assert_eq!(attack_tables().rook_attacks(sq, 0).count_ones(), 14);
    }

    #[test]
    fn test_bishop_and_queen_attacks() {
        let sq = pos_to_sq(4, 5);
        let tables = attack_tables();
        assert_eq!(tables.bishop_attacks(sq, 0).count_ones(), 13);
        assert_eq!(tables.queen_attacks(sq, 0).count_ones(), 27);

        let occupied = sq_to_bb(pos_to_sq(2, 3)) | sq_to_bb(pos_to_sq(6, 7)); // c2, g6
        let attacks = tables.bishop_attacks(sq, occupied);
        assert!(contains(attacks, pos_to_sq(2, 3)));
        assert!(contains(attacks, pos_to_sq(6, 7)));
        assert!(!contains(attacks, pos_to_sq(1, 2)));
        assert!(!contains(attacks, pos_to_sq(7, 8)));
    }

    #[test]
    fn test_magic_matches_ray_walk_for_every_subset() {
        let tables = attack_tables();
        for sq in 0..64u8 {
            let mask = tables.rook_mask(sq);
            for occ in all_subsets(mask).step_by(7) {
                // Squares outside the mask must not change the result
                let noisy = occ | !mask & 0x8100_0000_0000_0081;
                assert_eq!(
                    tables.rook_attacks(sq, noisy),
                    sliding_attacks(sq, noisy, &ROOK_DIRECTIONS)
                );
            }
            let mask = tables.bishop_mask(sq);
            for occ in all_subsets(mask) {
                assert_eq!(
                    tables.bishop_attacks(sq, occ),
                    sliding_attacks(sq, occ, &BISHOP_DIRECTIONS)
                );
            }
        }
    }

    #[test]
    fn test_between_and_line() {
        let tables = attack_tables();
        let (a1, d1, h8, c3, b3) = (0u8, 3u8, 63u8, pos_to_sq(3, 3), pos_to_sq(3, 2));
        assert_eq!(tables.between(a1, d1), sq_to_bb(1) | sq_to_bb(2));
        assert_eq!(tables.between(a1, c3), sq_to_bb(pos_to_sq(2, 2)));
        assert_eq!(tables.between(a1, b3), 0);
        assert_eq!(tables.line(a1, b3), 0);
        assert_eq!(tables.line(c3, h8).count_ones(), 8);
        assert_eq!(tables.line(a1, d1), RANK_1);
        assert_eq!(tables.between(d1, a1), tables.between(a1, d1));
    }

    #[test]
    fn test_shift() {
        assert_eq!(shift(sq_to_bb(12), 8), sq_to_bb(20));
        assert_eq!(shift(sq_to_bb(12), -8), sq_to_bb(4));
    }

    #[test]
    fn test_bitboard_iter() {
        let bb = sq_to_bb(0) | sq_to_bb(7) | sq_to_bb(63);
        let squares: Vec<u8> = BitboardIter(bb).collect();
        assert_eq!(squares, vec![0, 7, 63]);
    }
}
