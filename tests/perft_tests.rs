//! Perft counts for the standard reference positions.
//!
//! The heavyweight depths are ignored by default; run them with
//! `cargo test --release -- --ignored`.

use riposte::board::Board;
use riposte::perft::{perft, perft_root};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

#[test]
fn startpos_depth_5() {
    let board = Board::new();
    assert_eq!(perft_root(&board, 5, 4, false), 4_865_609);
}

#[test]
fn kiwipete_depths_1_to_4() {
    let board = Board::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft(&board, 1), 48);
    assert_eq!(perft(&board, 2), 2039);
    assert_eq!(perft(&board, 3), 97_862);
    assert_eq!(perft_root(&board, 4, 4, false), 4_085_603);
}

#[test]
#[ignore = "heavy; run with --release -- --ignored"]
fn kiwipete_depth_5() {
    let board = Board::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft_root(&board, 5, 8, false), 193_690_690);
}

#[test]
#[ignore = "very heavy; run with --release -- --ignored"]
fn kiwipete_depth_6() {
    let board = Board::from_fen(KIWIPETE).unwrap();
    assert_eq!(perft_root(&board, 6, 8, false), 8_031_647_685);
}

#[test]
fn parallel_and_single_threaded_agree() {
    let positions = [
        Board::new(),
        Board::from_fen(KIWIPETE).unwrap(),
        Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P3/8 w - - 0 1").unwrap(),
    ];
    for board in &positions {
        let single = perft_root(board, 4, 1, false);
        let threaded = perft_root(board, 4, 4, false);
        assert_eq!(single, threaded, "{}", board.to_fen());
    }
}

#[test]
fn cpw_position_4_shallow() {
    let board =
        Board::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
            .unwrap();
    assert_eq!(perft(&board, 1), 6);
    assert_eq!(perft(&board, 2), 264);
    assert_eq!(perft(&board, 3), 9467);
    assert_eq!(perft_root(&board, 4, 4, false), 422_333);
}

#[test]
fn cpw_position_5_shallow() {
    let board =
        Board::from_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8").unwrap();
    assert_eq!(perft(&board, 1), 44);
    assert_eq!(perft(&board, 2), 1486);
    assert_eq!(perft(&board, 3), 62_379);
}
