//! Board-level integration tests: FEN, make/undo, hashing, notation.

use rand::prelude::*;

use riposte::board::{Board, Color, Move};

const TEST_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P3/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "8/k7/3p4/p2P1p2/P2P1P2/8/8/K7 w - - 0 1",
];

#[test]
fn fen_round_trips() {
    for fen in TEST_FENS {
        let board = Board::from_fen(fen).unwrap();
        assert!(board.is_ok(), "{fen}");
        assert_eq!(&board.to_fen(), fen);
    }
}

#[test]
fn legal_moves_never_leave_check_anywhere() {
    for fen in TEST_FENS {
        let mut board = Board::from_fen(fen).unwrap();
        let before_fen = board.to_fen();
        for mv in board.generate_moves().iter().copied() {
            board.make_move(mv);
            assert!(board.is_ok(), "{fen}: {mv:?}");
            board.undo_move();
            assert_eq!(board.to_fen(), before_fen, "{fen}: {mv:?}");
        }
    }
}

/// Play random legal moves to a fixed depth, checking the incremental
/// state against a from-scratch recompute at every step, then unwind and
/// compare the board with its start state.
#[test]
fn random_walks_keep_state_consistent() {
    let mut rng = StdRng::seed_from_u64(20_260_801);
    for fen in TEST_FENS {
        for _ in 0..8 {
            let mut board = Board::from_fen(fen).unwrap();
            let start_fen = board.to_fen();
            let mut depth = 0;
            for _ in 0..40 {
                let list = board.generate_moves();
                if list.is_empty() {
                    break;
                }
                let mv = list.get(rng.gen_range(0..list.len()));
                board.make_move(mv);
                depth += 1;

                assert!(board.is_ok());
                assert_eq!(board.in_check(), board.compute_in_check());
                let (key, pawn_key) = board.computed_keys();
                assert_eq!(board.key(), key, "{fen}");
                assert_eq!(board.pawn_key(), pawn_key, "{fen}");
            }
            for _ in 0..depth {
                board.undo_move();
            }
            assert_eq!(board.to_fen(), start_fen);
        }
    }
}

#[test]
fn coordinate_notation_round_trips_everywhere() {
    for fen in TEST_FENS {
        let board = Board::from_fen(fen).unwrap();
        for mv in board.generate_moves().iter().copied() {
            let coord = mv.to_coord();
            assert_eq!(board.parse_move(&coord), Ok(mv), "{fen}: {coord}");
        }
    }
}

#[test]
fn en_passant_capture_is_legal_in_spec_position() {
    let board =
        Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
    let list = board.generate_moves();
    let ep: Vec<&Move> = list
        .iter()
        .filter(|m| m.is_en_passant())
        .collect();
    assert_eq!(ep.len(), 1);
    assert_eq!(ep[0].to_coord(), "e5f6");
}

#[test]
fn queenside_castling_blocked_through_check() {
    // A rook on d8 guards the d1 transit square.
    let board = Board::from_fen("r2rk2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let castles: Vec<String> = board
        .generate_moves()
        .iter()
        .filter(|m| m.is_castling())
        .map(|m| m.to_coord())
        .collect();
    assert_eq!(castles, vec!["e1g1".to_string()]);
}

#[test]
fn null_move_flips_side_and_restores() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    let key_before = board.key();
    board.make_nullmove();
    assert_eq!(board.side_to_move(), Color::Black);
    assert_ne!(board.key(), key_before);
    let (recomputed, _) = board.computed_keys();
    assert_eq!(board.key(), recomputed);
    board.undo_nullmove();
    assert_eq!(board.side_to_move(), Color::White);
    assert_eq!(board.key(), key_before);
}

#[test]
fn threefold_sequence_counts_repeats() {
    let mut board = Board::new();
    for coord in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
        let mv = board.parse_move(coord).unwrap();
        board.make_move(mv);
    }
    assert!(board.repetition_count(3) >= 2);
}

#[test]
fn checkmate_has_no_moves_and_check() {
    let board = Board::from_fen("R5k1/5ppp/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert!(board.in_check());
    assert!(board.generate_moves().is_empty());
    assert!(board.is_mate());
}

#[test]
fn stalemate_has_no_moves_and_no_check() {
    let board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(!board.in_check());
    assert!(board.generate_moves().is_empty());
    assert!(!board.is_mate());
}

mod properties {
    use proptest::prelude::*;
    use riposte::board::Board;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Arbitrary games never break the board invariants or the
        /// incrementally maintained hash keys.
        #[test]
        fn random_play_preserves_invariants(
            choices in prop::collection::vec(0usize..4096, 0..48),
        ) {
            let mut board = Board::new();
            for &choice in &choices {
                let list = board.generate_moves();
                if list.is_empty() {
                    break;
                }
                let mv = list.get(choice % list.len());
                board.make_move(mv);
                prop_assert!(board.is_ok());
                prop_assert_eq!(board.in_check(), board.compute_in_check());
                let (key, pawn_key) = board.computed_keys();
                prop_assert_eq!(board.key(), key);
                prop_assert_eq!(board.pawn_key(), pawn_key);
            }
        }

        /// Unwinding a random game restores the exact starting state.
        #[test]
        fn random_play_unwinds(
            choices in prop::collection::vec(0usize..4096, 1..32),
        ) {
            let mut board = Board::new();
            let start = board.to_fen();
            let mut made = 0;
            for &choice in &choices {
                let list = board.generate_moves();
                if list.is_empty() {
                    break;
                }
                board.make_move(list.get(choice % list.len()));
                made += 1;
            }
            for _ in 0..made {
                board.undo_move();
            }
            prop_assert_eq!(board.to_fen(), start);
        }
    }
}
