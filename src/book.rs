//! The opening book.
//!
//! Positions are keyed by Zobrist hash and carry a game count and a win
//! count. Two modes: the whole book in memory (an ordered map, mutated by
//! end-of-game learning and written back on exit), or on disk where each
//! lookup binary-searches the sorted record file without loading it.
//!
//! On-disk format, little-endian regardless of host, sorted ascending by
//! key:
//!   u64 key    -- position hash
//!   u16 games  -- times the position was reached
//!   u16 wins   -- times reaching it turned into a win

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::Rng;

use crate::board::types::{Color, Move, MoveList};
use crate::board::Board;
use crate::config::BookMode;

const BOOK_NODE_SIZE: u64 = 8 + 2 + 2;

/// Positions of the first 26 half moves feed the learning pass.
const LEARN_PLY_LIMIT: usize = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub games: u16,
    pub wins: u16,
}

impl BookEntry {
    /// Book score of a position: wins squared over games.
    #[must_use]
    fn score(self) -> i32 {
        debug_assert!(self.games > 0);
        (i32::from(self.wins) * i32::from(self.wins)) / i32::from(self.games)
    }
}

/// A root move with its book score, if the child position is known.
#[derive(Debug, Clone, Copy)]
pub struct BookMove {
    pub mv: Move,
    /// `None` means the position is unknown to the book.
    pub score: Option<i32>,
}

pub struct Book {
    mode: BookMode,
    path: PathBuf,
    tree: BTreeMap<u64, BookEntry>,
    modified: bool,
}

fn read_record(file: &mut File) -> std::io::Result<(u64, BookEntry)> {
    let mut buf = [0u8; BOOK_NODE_SIZE as usize];
    file.read_exact(&mut buf)?;
    let key = u64::from_le_bytes([
        buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7],
    ]);
    let games = u16::from_le_bytes([buf[8], buf[9]]);
    let wins = u16::from_le_bytes([buf[10], buf[11]]);
    Ok((key, BookEntry { games, wins }))
}

fn record_count(file: &mut File) -> std::io::Result<u64> {
    let len = file.seek(SeekFrom::End(0))?;
    Ok(len / BOOK_NODE_SIZE)
}

/// Binary search of the sorted record file for `key`.
fn find_disk_pos(file: &mut File, key: u64, npos: u64) -> Option<BookEntry> {
    let mut left = 0i64;
    let mut right = npos as i64 - 1;
    while right >= left {
        let mid = (left + right) / 2;
        if file
            .seek(SeekFrom::Start(mid as u64 * BOOK_NODE_SIZE))
            .is_err()
        {
            return None;
        }
        let (mid_key, entry) = read_record(file).ok()?;
        if key < mid_key {
            right = mid - 1;
        } else if key > mid_key {
            left = mid + 1;
        } else {
            return Some(entry);
        }
    }
    None
}

impl Book {
    /// Open the book in the configured mode. A missing file downgrades
    /// to a disabled book (or an empty one in memory mode, which learning
    /// can populate).
    #[must_use]
    pub fn open(mode: BookMode, path: &Path) -> Self {
        let mut book = Book {
            mode,
            path: path.to_path_buf(),
            tree: BTreeMap::new(),
            modified: false,
        };
        match mode {
            BookMode::Off => {}
            BookMode::Mem => {
                if path.exists() {
                    if let Err(err) = book.load() {
                        warn!("can't read book file {}: {err}", path.display());
                    } else {
                        info!("opening book loaded: {} positions", book.tree.len());
                    }
                } else {
                    info!("no opening book was found");
                }
            }
            BookMode::Disk => {
                if !path.exists() {
                    info!("no opening book was found");
                    book.mode = BookMode::Off;
                }
            }
        }
        book
    }

    /// An empty in-memory book (tests, PGN-less bootstrap).
    #[must_use]
    pub fn empty(path: &Path) -> Self {
        Book {
            mode: BookMode::Mem,
            path: path.to_path_buf(),
            tree: BTreeMap::new(),
            modified: false,
        }
    }

    #[must_use]
    pub fn mode(&self) -> BookMode {
        self.mode
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn load(&mut self) -> std::io::Result<()> {
        let mut file = File::open(&self.path)?;
        let npos = record_count(&mut file)?;
        file.seek(SeekFrom::Start(0))?;
        self.tree.clear();
        for _ in 0..npos {
            let (key, entry) = read_record(&mut file)?;
            self.tree.insert(key, entry);
        }
        Ok(())
    }

    /// Write the in-memory book back, ascending by key. A no-op unless
    /// learning changed something.
    pub fn save(&mut self) -> std::io::Result<()> {
        if self.mode != BookMode::Mem || !self.modified || self.tree.is_empty() {
            return Ok(());
        }
        let mut file = File::create(&self.path)?;
        for (key, entry) in &self.tree {
            file.write_all(&key.to_le_bytes())?;
            file.write_all(&entry.games.to_le_bytes())?;
            file.write_all(&entry.wins.to_le_bytes())?;
        }
        self.modified = false;
        info!("book file saved: {}", self.path.display());
        Ok(())
    }

    /// Look a position key up in whichever backing store is active.
    #[must_use]
    pub fn lookup(&self, key: u64) -> Option<BookEntry> {
        match self.mode {
            BookMode::Off => None,
            BookMode::Mem => self.tree.get(&key).copied(),
            BookMode::Disk => {
                let mut file = match File::open(&self.path) {
                    Ok(file) => file,
                    Err(err) => {
                        warn!("can't open book file {}: {err}", self.path.display());
                        return None;
                    }
                };
                let npos = record_count(&mut file).ok()?;
                if npos == 0 {
                    return None;
                }
                find_disk_pos(&mut file, key, npos)
            }
        }
    }

    /// Score every legal root move by the book. Child positions that
    /// repeat the game history are treated as unknown so the book never
    /// steers into a repetition.
    #[must_use]
    pub fn list_moves(&self, board: &mut Board) -> Vec<BookMove> {
        let list: MoveList = board.generate_moves();
        let mut moves = Vec::with_capacity(list.len());
        for mv in list.iter().copied() {
            board.make_move(mv);
            let score = if board.repetition_count(1) == 0 {
                self.lookup(board.key()).map(BookEntry::score)
            } else {
                None
            };
            board.undo_move();
            moves.push(BookMove { mv, score });
        }
        moves
    }

    /// Pick a book move, weighted by score. `None` when the book has
    /// nothing (or only zero-score moves) here.
    #[must_use]
    pub fn pick_move(&self, board: &mut Board) -> Option<Move> {
        if self.mode == BookMode::Off {
            return None;
        }
        let moves = self.list_moves(board);
        let tot_score: i32 = moves.iter().filter_map(|bm| bm.score).sum();
        if tot_score <= 0 {
            return None;
        }

        let mut rng = rand::thread_rng();
        let rand_val = rng.gen_range(0..tot_score);
        let mut cur_score = 0;
        for bm in &moves {
            if let Some(score) = bm.score {
                cur_score += score;
                if cur_score > rand_val {
                    return Some(bm.mv);
                }
            }
        }
        None
    }

    /// Store one position outcome. `points` is 2 when the game's winner
    /// made the move into the position, else 0.
    pub fn save_pos(&mut self, key: u64, points: u32) {
        debug_assert!(points == 0 || points == 2);
        self.modified = true;
        let wins = if points == 2 { 1 } else { 0 };
        match self.tree.get_mut(&key) {
            Some(entry) => {
                if entry.games < u16::MAX {
                    entry.games += 1;
                    entry.wins += wins;
                }
            }
            None => {
                self.tree.insert(
                    key,
                    BookEntry {
                        games: 1,
                        wins,
                    },
                );
            }
        }
    }

    /// Learn from a finished game: walk its positions up to move 26 and
    /// credit the ones the winner's moves produced.
    pub fn learn_game(&mut self, board: &Board, winner: Color) {
        if self.tree.is_empty() {
            info!("creating a new opening book");
        }
        for i in 1..board.ply() {
            if i > LEARN_PLY_LIMIT {
                break;
            }
            let info = board.history(i);
            if info.key == 0 {
                continue;
            }
            // Odd plies were reached by a White move.
            let mover_is_white = i % 2 == 1;
            let points = if (winner == Color::White) == mover_is_white {
                2
            } else {
                0
            };
            self.save_pos(info.key, points);
        }
    }
}
