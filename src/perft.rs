//! Perft: leaf counting over legal move generation and make/undo.
//!
//! A standard correctness and benchmark tool. The root splits its moves
//! over a worker pool; each worker pops job indices from a shared queue
//! and runs a single-threaded perft on its own board copy. The
//! memoization table is shared: stores are mutex-guarded, probes are
//! lock-free over per-field atomics, and a stale or torn read is harmless
//! because the entry's own key and depth are always re-checked.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::board::types::Move;
use crate::board::Board;

const PERFT_HASH_SIZE: usize = 0x20_0000;

struct PerftEntry {
    key: AtomicU64,
    depth: AtomicI32,
    nnodes: AtomicU64,
}

struct PerftTable {
    entries: Vec<PerftEntry>,
    store_lock: Mutex<()>,
}

impl PerftTable {
    fn new() -> Self {
        let mut entries = Vec::with_capacity(PERFT_HASH_SIZE);
        for _ in 0..PERFT_HASH_SIZE {
            entries.push(PerftEntry {
                key: AtomicU64::new(0),
                depth: AtomicI32::new(0),
                nnodes: AtomicU64::new(0),
            });
        }
        PerftTable {
            entries,
            store_lock: Mutex::new(()),
        }
    }

    fn probe(&self, key: u64, depth: i32) -> u64 {
        let entry = &self.entries[(key % PERFT_HASH_SIZE as u64) as usize];
        if entry.key.load(Ordering::Relaxed) == key && entry.depth.load(Ordering::Relaxed) == depth
        {
            return entry.nnodes.load(Ordering::Relaxed);
        }
        0
    }

    fn store(&self, key: u64, nnodes: u64, depth: i32) {
        let entry = &self.entries[(key % PERFT_HASH_SIZE as u64) as usize];
        let _guard = self.store_lock.lock();
        if depth >= entry.depth.load(Ordering::Relaxed) {
            entry.depth.store(depth, Ordering::Relaxed);
            entry.key.store(key, Ordering::Relaxed);
            entry.nnodes.store(nnodes, Ordering::Relaxed);
        }
    }
}

fn perft_walk(board: &mut Board, depth: i32, table: &PerftTable) -> u64 {
    debug_assert!(depth >= 0);

    if depth == 0 {
        return 1;
    }

    if depth > 1 {
        let nnodes = table.probe(board.key(), depth);
        if nnodes > 0 {
            return nnodes;
        }
    }

    let list = board.generate_moves();
    if depth == 1 || list.is_empty() {
        return list.len() as u64;
    }

    let mut nnodes = 0;
    for mv in list.iter().copied() {
        board.make_move(mv);
        nnodes += perft_walk(board, depth - 1, table);
        board.undo_move();
    }

    if depth > 1 {
        table.store(board.key(), nnodes, depth);
    }

    nnodes
}

/// Count leaf positions `depth` plies below `board`, splitting the root
/// moves over `nthreads` workers. With `divide`, print the per-root-move
/// counts as they complete.
#[must_use]
pub fn perft_root(board: &Board, depth: i32, nthreads: usize, divide: bool) -> u64 {
    if depth <= 0 {
        return 0;
    }

    let list = board.generate_moves();
    if list.is_empty() {
        return 0;
    }
    if depth == 1 {
        return list.len() as u64;
    }

    let table = PerftTable::new();
    let jobs: Vec<Move> = list.as_slice().to_vec();
    let next_job: Mutex<usize> = Mutex::new(0);
    let total: Mutex<u64> = Mutex::new(0);
    let nthreads = nthreads.max(1).min(jobs.len());

    std::thread::scope(|scope| {
        for _ in 0..nthreads {
            scope.spawn(|| loop {
                let index = {
                    let mut next = next_job.lock();
                    if *next >= jobs.len() {
                        return;
                    }
                    let index = *next;
                    *next += 1;
                    index
                };

                let mv = jobs[index];
                let mut work_board = board.clone();
                work_board.make_move(mv);
                let nnodes = perft_walk(&mut work_board, depth - 1, &table);

                let mut total = total.lock();
                if divide {
                    println!("{} {}", mv.to_coord(), nnodes);
                }
                *total += nnodes;
            });
        }
    });

    total.into_inner()
}

/// Single-threaded perft without output, for tests and benchmarks.
#[must_use]
pub fn perft(board: &Board, depth: i32) -> u64 {
    perft_root(board, depth, 1, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_shallow() {
        let board = Board::new();
        assert_eq!(perft(&board, 1), 20);
        assert_eq!(perft(&board, 2), 400);
        assert_eq!(perft(&board, 3), 8902);
        assert_eq!(perft(&board, 4), 197_281);
    }

    #[test]
    fn kiwipete_shallow() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        assert_eq!(perft(&board, 1), 48);
        assert_eq!(perft(&board, 2), 2039);
        assert_eq!(perft(&board, 3), 97_862);
    }

    #[test]
    fn parallel_matches_single_threaded() {
        let board = Board::from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        )
        .unwrap();
        let single = perft_root(&board, 3, 1, false);
        let parallel = perft_root(&board, 3, 4, false);
        assert_eq!(single, parallel);
        assert_eq!(single, 97_862);
    }

    #[test]
    fn positions_with_promotions_and_pins() {
        // A classic promotion-heavy perft position.
        let board = Board::from_fen("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1").unwrap();
        assert_eq!(perft(&board, 1), 24);
        assert_eq!(perft(&board, 2), 496);
        assert_eq!(perft(&board, 3), 9483);
    }

    #[test]
    fn en_passant_position() {
        // Position 3 from the CPW perft suite.
        let board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P3/8 w - - 0 1").unwrap();
        assert_eq!(perft(&board, 1), 14);
        assert_eq!(perft(&board, 2), 191);
        assert_eq!(perft(&board, 3), 2812);
        assert_eq!(perft(&board, 4), 43_238);
        assert_eq!(perft(&board, 5), 674_624);
    }

    #[test]
    fn zero_depth_and_mate() {
        let board = Board::new();
        assert_eq!(perft(&board, 0), 0);
        // A checkmated position has no moves.
        let board = Board::from_fen("R5k1/5ppp/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(perft(&board, 1), 0);
    }
}
