//! End-to-end checks through the public API: generation, board updates and fog views.

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fog_chess::bitboard::{attack_tables, BitboardIter};
use fog_chess::board::Board;
use fog_chess::fog::{FogOfWarView, FogSquare};
use fog_chess::movegen::{generate_moves, legal_moves, MoveGenerator, PromotionMode};
use fog_chess::movelist::{MoveList, MAX_MOVES};
use fog_chess::moves::{Move, MoveFlag};
use fog_chess::protocol::{parse_reply, GameStateMessage};
use fog_chess::types::*;

fn sq(s: &str) -> Square {
    square_from_algebraic(s).unwrap()
}

#[test]
fn start_position_has_twenty_moves() {
    let moves = legal_moves(&Board::new(), attack_tables());
    assert_eq!(moves.len(), 20);
    let mut uci: Vec<String> = moves.iter().map(|m| m.to_uci()).collect();
    uci.sort();
    assert_eq!(&uci[..4], &["a2a3", "a2a4", "b1a3", "b1c3"]);
}

#[test]
fn pinned_bishop_has_no_moves() {
    let board = Board::from_fen("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    let moves = legal_moves(&board, attack_tables());
    assert!(moves.iter().all(|m| m.start() != sq("e2")));

    // Without the pin the bishop is free again
    let free = Board::from_fen("6k1/8/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
    let moves = legal_moves(&free, attack_tables());
    assert_eq!(moves.iter().filter(|m| m.start() == sq("e2")).count(), 9);
}

#[test]
fn promotion_counts_by_mode() {
    let tables = attack_tables();
    let board = Board::from_fen("8/4P3/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
    let from_e7 = |quiet: bool, mode: PromotionMode| {
        generate_moves(&board, tables, quiet, mode)
            .iter()
            .filter(|m| m.start() == sq("e7"))
            .collect::<Vec<Move>>()
    };

    let all = from_e7(true, PromotionMode::All);
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|m| m.is_promotion()));
    assert_eq!(from_e7(true, PromotionMode::QueenAndKnight).len(), 2);
    assert!(from_e7(false, PromotionMode::All).is_empty());
}

#[test]
fn en_passant_after_double_push() {
    let tables = attack_tables();
    let mut board = Board::from_fen("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1").unwrap();
    let push = legal_moves(&board, tables)
        .iter()
        .find(|m| m.to_uci() == "d7d5")
        .unwrap();
    assert_eq!(push.flag(), MoveFlag::PawnDoublePush);
    board.push(push);

    let ep: Vec<Move> = legal_moves(&board, tables).iter().filter(|m| m.is_en_passant()).collect();
    assert_eq!(ep.len(), 1);
    assert_eq!(ep[0].target(), sq("d6"));
    assert_eq!(ep[0].en_passant_capture_square(), sq("d5"));

    board.push(ep[0]);
    assert_eq!(board.piece_at(sq("d5")), None);
    assert_eq!(board.to_fen(), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 2");
}

#[test]
fn hidden_rook_and_empty_run_in_masked_fen() {
    let board = Board::from_fen("4k2r/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
    let view = FogOfWarView::new(&board, attack_tables(), Color::White);
    assert_eq!(view.square(sq("h8")), FogSquare::Unknown);
    let fen = view.to_fen();
    assert!(fen.ends_with("/1??3??/R3K1??-W-Q"), "{fen}");
    assert!(!fen.contains('r'));
}

#[test]
fn fog_game_exchange() {
    let tables = attack_tables();
    let mut board = Board::new();
    let mut previous: [Option<FogOfWarView>; 2] = [None, None];

    for reply in ["e2e4", "e7e5", "g1f3", "b8c6"] {
        let side = board.side_to_move();
        let view = FogOfWarView::new(&board, tables, side);
        let request = GameStateMessage::new(&view, previous[side.index()].as_ref(), 1000, 0);
        assert_eq!(request.prev.is_some(), board.history_len() >= 2);
        assert!(request.to_string().starts_with(&format!("fen {}", view.to_fen())));

        let mv = parse_reply(&board, tables, reply);
        assert!(!mv.is_null(), "{reply} should be legal");

        // The opponent only learns what its view lets it see
        let opponent_view = FogOfWarView::new(&board, tables, side.other_color());
        let seen = opponent_view.observe_move(mv);
        assert_eq!(seen.is_start_unknown(), !opponent_view.is_visible(mv.start()));
        assert_eq!(seen.is_target_unknown(), !opponent_view.is_visible(mv.target()));
        if board.history_len() == 0 {
            assert!(seen.is_fully_unknown());
        }

        board.push(mv);
        previous[side.index()] = Some(view);
    }

    assert_eq!(parse_reply(&board, tables, "a1a1"), Move::NULL);
}

/// Random games checking board invariants after every move
#[test]
fn random_playouts_keep_invariants() {
    let tables = attack_tables();
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut generator = MoveGenerator::new();
    let mut moves = MoveList::new();

    for _ in 0..40 {
        let mut board = Board::new();
        let mut fens = vec![board.to_fen()];

        for _ in 0..120 {
            generator.generate(&board, tables, true, &mut moves);
            assert!(moves.len() <= MAX_MOVES);
            if moves.is_empty() {
                assert_eq!(board.is_in_check(tables), generator.in_check());
                break;
            }

            // Every capture-only move is also a full-generation move
            let captures = generate_moves(&board, tables, false, PromotionMode::All);
            for c in &captures {
                assert!(moves.contains(c), "{c} missing from full list");
            }

            for m in &moves {
                let mover = board.side_to_move();
                board.push(m);
                assert!(
                    !board.is_square_attacked(board.king_square(mover), mover.other_color(), tables),
                    "{m} leaves the king in check in {}",
                    fens.last().unwrap()
                );
                board.pop();
            }

            let mv = moves[rng.gen_range(0..moves.len())];
            board.push(mv);
            assert_eq!(board.hash(), board.compute_hash());
            fens.push(board.to_fen());

            let observer = board.side_to_move();
            let view = FogOfWarView::new(&board, tables, observer);
            for own in BitboardIter(board.color_bb(observer)) {
                assert!(view.is_visible(own));
            }
        }

        // Unwind the whole game
        while board.pop().is_some() {
            fens.pop();
            assert_eq!(&board.to_fen(), fens.last().unwrap());
        }
        assert_eq!(board.to_fen(), Board::new().to_fen());
        assert_eq!(board.hash(), board.compute_hash());
    }
}
