//! Perft suites from https://www.chessprogramming.org/Perft_Results
//!
//! Run with: cargo test --release --test perft

use fog_chess::bitboard::attack_tables;
use fog_chess::board::Board;
use fog_chess::perft::{perft, perft_parallel};

fn check_perft(fen: &str, expected: &[u64]) {
    let tables = attack_tables();
    let mut board = Board::from_fen(fen).unwrap();
    for (i, &nodes) in expected.iter().enumerate() {
        let depth = (i + 1) as u8;
        assert_eq!(perft(&mut board, tables, depth), nodes, "{fen} at depth {depth}");
    }
    // push/pop must leave the position exactly as it was
    assert_eq!(board.to_fen(), Board::from_fen(fen).unwrap().to_fen());
    assert_eq!(board.hash(), board.compute_hash());
}

#[test]
fn perft_start_position() {
    check_perft(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        &[20, 400, 8902, 197_281],
    );
}

#[test]
fn perft_kiwipete() {
    check_perft(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        &[48, 2039, 97_862],
    );
}

#[test]
fn perft_position_3() {
    check_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", &[14, 191, 2812, 43_238]);
}

#[test]
fn perft_position_4() {
    check_perft(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        &[6, 264, 9467],
    );
}

#[test]
fn perft_position_4_mirrored() {
    check_perft(
        "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
        &[6, 264, 9467],
    );
}

#[test]
fn perft_position_5() {
    check_perft(
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        &[44, 1486, 62_379],
    );
}

#[test]
fn perft_position_6() {
    check_perft(
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        &[46, 2079, 89_890],
    );
}

#[test]
fn perft_parallel_position_3() {
    let board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
    assert_eq!(perft_parallel(&board, attack_tables(), 5), 674_624);
}
