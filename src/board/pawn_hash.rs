//! Pawn-structure hash table.
//!
//! Always-replace on key mismatch, keep on equal key. Empty slots carry
//! key 1, which no pawn structure hashes to.

pub(crate) const PHASH_SIZE: usize = 32768;

#[derive(Clone, Copy)]
struct PawnHashEntry {
    passers: u64,
    key: u64,
    op: i32,
    eg: i32,
}

pub struct PawnHash {
    entries: Box<[PawnHashEntry]>,
}

impl PawnHash {
    #[must_use]
    pub fn new() -> Self {
        PawnHash {
            entries: vec![
                PawnHashEntry {
                    passers: 0,
                    key: 1,
                    op: 0,
                    eg: 0,
                };
                PHASH_SIZE
            ]
            .into_boxed_slice(),
        }
    }

    /// Cached `(passers, opening, endgame)` for `key`, if present.
    #[must_use]
    pub(crate) fn probe(&self, key: u64) -> Option<(u64, i32, i32)> {
        if key == 1 {
            return None;
        }
        let entry = &self.entries[(key % PHASH_SIZE as u64) as usize];
        if entry.key == key {
            Some((entry.passers, entry.op, entry.eg))
        } else {
            None
        }
    }

    pub(crate) fn store(&mut self, key: u64, passers: u64, op: i32, eg: i32) {
        let entry = &mut self.entries[(key % PHASH_SIZE as u64) as usize];
        if entry.key != key {
            *entry = PawnHashEntry {
                passers,
                key,
                op,
                eg,
            };
        }
    }
}

impl Default for PawnHash {
    fn default() -> Self {
        PawnHash::new()
    }
}
