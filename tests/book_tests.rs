//! Opening-book contract tests against real book files.

use std::path::PathBuf;

use riposte::board::Board;
use riposte::book::Book;
use riposte::config::BookMode;

fn temp_book_path(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("riposte-tests");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(format!("{tag}-{}.bin", std::process::id()))
}

fn write_records(path: &PathBuf, records: &[(u64, u16, u16)]) {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.0);
    let mut bytes = Vec::new();
    for (key, games, wins) in sorted {
        bytes.extend_from_slice(&key.to_le_bytes());
        bytes.extend_from_slice(&games.to_le_bytes());
        bytes.extend_from_slice(&wins.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

fn child_key(board: &mut Board, coord: &str) -> u64 {
    let mv = board.parse_move(coord).unwrap();
    board.make_move(mv);
    let key = board.key();
    board.undo_move();
    key
}

#[test]
fn single_record_book_scores_one_move() {
    // A book holding only the position after e2e4 with games=10, wins=7:
    // its score is 7*7/10 = 4 by integer division, everything else is
    // unknown.
    let mut board = Board::new();
    let key = child_key(&mut board, "e2e4");

    let path = temp_book_path("single");
    write_records(&path, &[(key, 10, 7)]);

    for mode in [BookMode::Mem, BookMode::Disk] {
        let book = Book::open(mode, &path);
        let moves = book.list_moves(&mut board);
        assert_eq!(moves.len(), 20);
        for bm in &moves {
            if bm.mv.to_coord() == "e2e4" {
                assert_eq!(bm.score, Some(4), "{mode:?}");
            } else {
                assert_eq!(bm.score, None, "{mode:?}");
            }
        }
        // Weighted selection can only ever pick the one scored move.
        let picked = book.pick_move(&mut board).unwrap();
        assert_eq!(picked.to_coord(), "e2e4");
    }

    std::fs::remove_file(&path).ok();
}

#[test]
fn zero_total_weight_gives_no_book_move() {
    // games=10, wins=0 scores zero; a zero total means no book move.
    let mut board = Board::new();
    let key = child_key(&mut board, "e2e4");

    let path = temp_book_path("zero");
    write_records(&path, &[(key, 10, 0)]);

    let book = Book::open(BookMode::Mem, &path);
    let moves = book.list_moves(&mut board);
    assert_eq!(
        moves.iter().filter(|bm| bm.score.is_some()).count(),
        1,
        "the child is known"
    );
    assert_eq!(book.pick_move(&mut board), None);

    std::fs::remove_file(&path).ok();
}

#[test]
fn disk_binary_search_over_many_records() {
    let mut board = Board::new();
    let e4 = child_key(&mut board, "e2e4");
    let d4 = child_key(&mut board, "d2d4");

    // Surround the interesting keys with filler records.
    let mut records = vec![(e4, 20, 18), (d4, 30, 3)];
    for i in 0..200u64 {
        records.push((i.wrapping_mul(0x9E37_79B9_7F4A_7C15), 5, 1));
    }
    let path = temp_book_path("many");
    write_records(&path, &records);

    let book = Book::open(BookMode::Disk, &path);
    let moves = book.list_moves(&mut board);
    for bm in &moves {
        match bm.mv.to_coord().as_str() {
            "e2e4" => assert_eq!(bm.score, Some(18 * 18 / 20)),
            "d2d4" => assert_eq!(bm.score, Some(3 * 3 / 30)),
            _ => {}
        }
    }

    std::fs::remove_file(&path).ok();
}

#[test]
fn learned_book_survives_a_save_and_reload() {
    let path = temp_book_path("learn");
    std::fs::remove_file(&path).ok();

    let mut game = Board::new();
    for coord in ["e2e4", "c7c5", "g1f3", "d7d6"] {
        let mv = game.parse_move(coord).unwrap();
        game.make_move(mv);
    }

    {
        let mut book = Book::empty(&path);
        book.learn_game(&game, riposte::board::Color::White);
        book.save().unwrap();
    }

    let book = Book::open(BookMode::Mem, &path);
    assert!(!book.is_empty());
    // The position after 1.e4 was reached by the winner's move.
    let mut board = Board::new();
    let key = child_key(&mut board, "e2e4");
    let entry = book.lookup(key).unwrap();
    assert_eq!(entry.games, 1);
    assert_eq!(entry.wins, 1);

    // The position after 1...c5 was the loser's doing.
    let mv = board.parse_move("e2e4").unwrap();
    board.make_move(mv);
    let key = child_key(&mut board, "c7c5");
    let entry = book.lookup(key).unwrap();
    assert_eq!(entry.games, 1);
    assert_eq!(entry.wins, 0);

    std::fs::remove_file(&path).ok();
}
