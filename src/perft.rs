use rayon::prelude::*;

use crate::bitboard::AttackTables;
use crate::board::Board;
use crate::movegen::MoveGenerator;
use crate::movelist::MoveList;
use crate::moves::Move;

/// Count the leaf nodes of the legal move tree `depth` plies deep.
pub fn perft(board: &mut Board, tables: &AttackTables, depth: u8) -> u64 {
    let mut generator = MoveGenerator::new();
    perft_with(board, tables, &mut generator, depth)
}

fn perft_with(board: &mut Board, tables: &AttackTables, generator: &mut MoveGenerator, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    generator.generate(board, tables, true, &mut moves);
    // Bulk counting: every legal move is one leaf
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for m in &moves {
        board.push(m);
        nodes += perft_with(board, tables, generator, depth - 1);
        board.pop();
    }
    nodes
}

/// Node counts below each root move, in generation order.
pub fn perft_divide(board: &mut Board, tables: &AttackTables, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let mut generator = MoveGenerator::new();
    let mut moves = MoveList::new();
    generator.generate(board, tables, true, &mut moves);

    let mut res = Vec::with_capacity(moves.len());
    for m in &moves {
        board.push(m);
        let nodes = perft_with(board, tables, &mut generator, depth - 1);
        board.pop();
        res.push((m, nodes));
    }
    res
}

/// Same count as [`perft`], with the root moves spread over the rayon thread pool.
/// Every task works on its own clone of the board.
pub fn perft_parallel(board: &Board, tables: &AttackTables, depth: u8) -> u64 {
    if depth <= 1 {
        return perft(&mut board.clone(), tables, depth);
    }
    let mut moves = MoveList::new();
    MoveGenerator::new().generate(board, tables, true, &mut moves);

    moves
        .as_slice()
        .par_iter()
        .map(|&m| {
            let mut child = board.clone();
            child.push(m);
            perft(&mut child, tables, depth - 1)
        })
        .sum()
}

/// Perft from starting position
///
/// https://www.chessprogramming.org/Perft_Results
///
/// | Depth | Nodes         | Captures  | E.p. | Castles | Checks  | Checkmates |
/// | ----- | ------------- | --------- | ---- | ------- | ------- | ---------- |
/// | 1     | 20            | 0         | 0    | 0       | 0       | 0          |
/// | 2     | 400           | 0         | 0    | 0       | 0       | 0          |
/// | 3     | 8,902         | 34        | 0    | 0       | 12      | 0          |
/// | 4     | 197,281       | 1576      | 0    | 0       | 469     | 8          |
/// | 5     | 4,865,609     | 82,719    | 258  | 0       | 27,351  | 347        |
/// | 6     | 119,060,324   | 2,812,008 | 5248 | 0       | 809,099 | 10,828     |
pub fn expected_start_position_nodes(depth: u8) -> Option<u64> {
    match depth {
        0 => Some(1),
        1 => Some(20),
        2 => Some(400),
        3 => Some(8902),
        4 => Some(197_281),
        5 => Some(4_865_609),
        6 => Some(119_060_324),
        7 => Some(3_195_901_860),
        8 => Some(84_998_978_956),
        9 => Some(2_439_530_234_167),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::attack_tables;

    const MAX_DEPTH: u8 = 3;

    #[test]
    fn perft_start() {
        let mut board = Board::new();
        for depth in 0..=MAX_DEPTH {
            println!("Depth {}", depth);
            let expected_node_count = expected_start_position_nodes(depth).unwrap();
            let node_count = perft(&mut board, attack_tables(), depth);
            assert_eq!(expected_node_count, node_count);
        }
        assert_eq!(board.to_fen(), Board::new().to_fen());
    }

    /// Run the perft test on the "position 5" from
    /// https://www.chessprogramming.org/Perft_Results
    ///
    /// Depth | Nodes
    /// ----- | -----
    /// 1     | 44
    /// 2     | 1,486
    /// 3     | 62,379
    /// 4     | 2,103,487
    #[test]
    fn perft_pos_5() {
        let mut board =
            Board::from_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8").unwrap();

        let expected = [0, 44, 1_486, 62_379];

        for depth in 1..expected.len() {
            println!("Depth {}", depth);
            let node_count = perft(&mut board, attack_tables(), depth as u8);
            assert_eq!(expected[depth], node_count);
        }
    }

    #[test]
    fn perft_divide_sums_to_perft() {
        let tables = attack_tables();
        let mut board = Board::new();
        let divided = perft_divide(&mut board, tables, 3);
        assert_eq!(divided.len(), 20);
        assert_eq!(divided.iter().map(|(_, n)| n).sum::<u64>(), 8902);
        let e2e4 = divided.iter().find(|(m, _)| m.to_uci() == "e2e4").unwrap();
        assert_eq!(e2e4.1, 600);
    }

    #[test]
    fn perft_parallel_matches_serial() {
        let tables = attack_tables();
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(perft_parallel(&board, tables, 2), 2039);
        assert_eq!(perft(&mut board.clone(), tables, 2), 2039);
    }
}
