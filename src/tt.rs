//! Transposition table.
//!
//! Packed fixed-size entries keyed by the Zobrist key, replace-by-priority
//! where priority is the root ply at store time plus the entry depth, with
//! a bonus for exact entries. Mate scores are adjusted by ply on the way
//! in and out so a forced mate found in one subtree stays valid in others.

use crate::board::Move;
use crate::search::values::{VAL_AVOID_NULL, VAL_BITBASE, VAL_NONE};

/// Priority bonus for exact (PV) entries, which also bounds how stale an
/// entry may look before its priority is reset.
const PV_PRIORITY: i32 = 3;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i8)]
pub enum Bound {
    None = 0,
    Exact = 1,
    /// Fail low: the score is an upper bound (value <= alpha).
    Alpha = 2,
    /// Fail high: the score is a lower bound (value >= beta).
    Beta = 3,
}

#[derive(Clone, Copy)]
struct Entry {
    depth: i8,
    priority: i16,
    flag: Bound,
    val: i16,
    best: u32,
    key: u64,
}

const EMPTY_ENTRY: Entry = Entry {
    depth: 0,
    priority: 0,
    flag: Bound::None,
    val: 0,
    best: 0,
    key: 0,
};

pub struct TranspositionTable {
    entries: Vec<Entry>,
}

/// Errors out when the requested table cannot be allocated, which the
/// engine treats as fatal at startup.
#[derive(Debug)]
pub struct TtAllocError;

impl std::fmt::Display for TtAllocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "can't allocate the transposition table")
    }
}

impl std::error::Error for TtAllocError {}

/// Convert a stored value into a search value.
fn val_from_tt(val: i32, ply: i32) -> i32 {
    if val < -VAL_BITBASE {
        val + ply
    } else if val > VAL_BITBASE {
        val - ply
    } else {
        val
    }
}

/// Convert a search value into a storable value.
pub(crate) fn val_to_tt(val: i32, ply: i32) -> i32 {
    if val < -VAL_BITBASE {
        val - ply
    } else if val > VAL_BITBASE {
        val + ply
    } else {
        val
    }
}

impl TranspositionTable {
    /// Allocate a table of roughly `size_mb` megabytes.
    pub fn new(size_mb: usize) -> Result<Self, TtAllocError> {
        let nentries = (size_mb * 0x0010_0000) / std::mem::size_of::<Entry>();
        let nentries = nentries.max(1);
        let mut entries = Vec::new();
        entries
            .try_reserve_exact(nentries)
            .map_err(|_| TtAllocError)?;
        entries.resize(nentries, EMPTY_ENTRY);
        Ok(TranspositionTable { entries })
    }

    pub fn clear(&mut self) {
        self.entries.fill(EMPTY_ENTRY);
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key % self.entries.len() as u64) as usize
    }

    /// Best move stored for `key`, or the null move.
    #[must_use]
    pub fn hash_move(&self, key: u64) -> Move {
        let entry = &self.entries[self.index(key)];
        if entry.key == key {
            Move::from_u32(entry.best)
        } else {
            Move::NULL
        }
    }

    /// Probe for a usable score. Returns `VAL_NONE` on a miss or when the
    /// stored depth is too shallow, `VAL_AVOID_NULL` for an upper-bound
    /// entry strictly inside the window (a hint that the null move is
    /// pointless here), or a score cut to the window. The stored best
    /// move is returned in all hit cases.
    pub fn probe(
        &self,
        depth: i32,
        alpha: i32,
        beta: i32,
        key: u64,
        ply: i32,
        best_move: &mut Move,
    ) -> i32 {
        let entry = &self.entries[self.index(key)];
        if entry.key != key {
            return VAL_NONE;
        }
        *best_move = Move::from_u32(entry.best);
        if i32::from(entry.depth) >= depth {
            let val = val_from_tt(i32::from(entry.val), ply);
            match entry.flag {
                Bound::Exact => return val,
                Bound::Alpha => {
                    if val <= alpha {
                        return alpha;
                    }
                    if val < beta {
                        return VAL_AVOID_NULL;
                    }
                }
                Bound::Beta => {
                    if val >= beta {
                        return beta;
                    }
                }
                Bound::None => {}
            }
        }
        VAL_NONE
    }

    /// Store an entry if its priority beats the stored one. Entries whose
    /// age shows they predate the current game have their priority reset.
    pub fn store(&mut self, depth: i32, val: i32, flag: Bound, key: u64, best: Move, root_ply: i32) {
        let idx = self.index(key);
        let entry = &mut self.entries[idx];

        let mut priority = root_ply + depth;
        if flag == Bound::Exact {
            priority += PV_PRIORITY;
        }

        if i32::from(entry.priority) - i32::from(entry.depth) > root_ply + PV_PRIORITY {
            entry.priority = 0;
        }

        if priority >= i32::from(entry.priority) {
            if (key != entry.key || entry.best == 0) || (!best.is_null() && flag != Bound::Alpha) {
                entry.best = best.as_u32();
            }
            entry.key = key;
            entry.val = val as i16;
            entry.flag = flag;
            entry.depth = depth as i8;
            entry.priority = priority as i16;
        }
    }
}
