use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Color, PieceType, Square};

/// Zobrist hashing keys for chess positions.
/// These are pseudo-random u64 values XORed together to create a unique hash for each position.
pub struct ZobristKeys {
    /// Keys for each (color, piece_type, square) combination: 2 * 6 * 64 = 768 keys
    /// Indexed as: pieces[color][piece_type][square]
    pub pieces: [[[u64; 64]; 6]; 2],
    /// Key for side to move (XORed when it's black's turn)
    pub side_to_move: u64,
    /// One key per castling-rights bitset, so a change is a single XOR pair
    pub castling: [u64; 16],
    /// Keys for en passant file (0-7 for files a-h)
    pub en_passant: [u64; 8],
}

impl ZobristKeys {
    /// Initialize Zobrist keys with deterministic pseudo-random values,
    /// seeded with a fixed value for reproducibility.
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x1234567890ABCDEF);

        let mut pieces = [[[0u64; 64]; 6]; 2];
        for color in pieces.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side_to_move = rng.gen();

        // Rights 0 (none left) hash as nothing
        let mut castling = [0u64; 16];
        for key in castling.iter_mut().skip(1) {
            *key = rng.gen();
        }

        let mut en_passant = [0u64; 8];
        for key in en_passant.iter_mut() {
            *key = rng.gen();
        }

        ZobristKeys {
            pieces,
            side_to_move,
            castling,
            en_passant,
        }
    }

    /// Get the key for a piece on a square
    #[inline]
    pub fn piece_key(&self, color: Color, piece_type: PieceType, sq: Square) -> u64 {
        self.pieces[color.index()][piece_type.index()][sq as usize]
    }

    /// Key for an en passant file, 1-8. File 0 means none and hashes as nothing.
    #[inline]
    pub fn en_passant_key(&self, file: u8) -> u64 {
        if file == 0 {
            0
        } else {
            self.en_passant[(file - 1) as usize]
        }
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// Global static Zobrist keys (initialized once)
pub static ZOBRIST_KEYS: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);
