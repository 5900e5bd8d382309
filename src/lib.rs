pub mod types;
pub mod moves;
pub mod zobrist;
pub mod bitboard;
pub mod board;
pub mod movelist;
pub mod movegen;
pub mod fog;
pub mod protocol;
pub mod perft;
