//! Magic attack tables for the sliding pieces.
//!
//! The magic multipliers are found once at startup by a seeded random
//! search. Every candidate is verified against ray-walked reference
//! attacks for all blocker subsets of its square before it is accepted, so
//! the tables are correct by construction.

use once_cell::sync::Lazy;
use rand::prelude::*;

use super::bits::{bit, popcount};

struct SquareMagic {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

struct MagicTable {
    squares: [SquareMagic; 64],
    attacks: Vec<u64>,
}

const ROOK_DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Attacks from `sq` along `dirs`, stopping at (and including) blockers.
fn ray_attacks(sq: usize, occ: u64, dirs: &[(i32, i32); 4]) -> u64 {
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;
    let mut attacks = 0u64;
    for (dr, df) in dirs {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let b = bit((r * 8 + f) as usize);
            attacks |= b;
            if occ & b != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

/// Relevant occupancy mask: the rays without their edge squares.
fn relevant_mask(sq: usize, dirs: &[(i32, i32); 4]) -> u64 {
    let rank = (sq / 8) as i32;
    let file = (sq % 8) as i32;
    let mut mask = 0u64;
    for (dr, df) in dirs {
        let mut r = rank + dr;
        let mut f = file + df;
        while (0..8).contains(&(r + dr)) && (0..8).contains(&(f + df)) {
            mask |= bit((r * 8 + f) as usize);
            r += dr;
            f += df;
        }
    }
    mask
}

/// The `index`-th subset of the set bits in `mask`.
fn occupancy_subset(index: usize, mask: u64) -> u64 {
    let mut occ = 0u64;
    let mut m = mask;
    let mut i = 0;
    while m != 0 {
        let sq = m.trailing_zeros() as usize;
        m &= m - 1;
        if index & (1 << i) != 0 {
            occ |= bit(sq);
        }
        i += 1;
    }
    occ
}

fn build_table(dirs: &[(i32, i32); 4], seed: u64) -> MagicTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut attacks: Vec<u64> = Vec::new();
    let squares: [SquareMagic; 64] = std::array::from_fn(|sq| {
        let mask = relevant_mask(sq, dirs);
        let nbits = popcount(mask) as u32;
        let size = 1usize << nbits;
        let shift = 64 - nbits;

        let occs: Vec<u64> = (0..size).map(|i| occupancy_subset(i, mask)).collect();
        let refs: Vec<u64> = occs.iter().map(|&occ| ray_attacks(sq, occ, dirs)).collect();

        let offset = attacks.len();
        attacks.resize(offset + size, 0);
        let magic = loop {
            // Sparse candidates converge much faster than uniform ones.
            let candidate = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
            if popcount(mask.wrapping_mul(candidate) & 0xFF00_0000_0000_0000) < 6 {
                continue;
            }
            let table = &mut attacks[offset..offset + size];
            table.fill(0);
            let mut ok = true;
            for (i, &occ) in occs.iter().enumerate() {
                let idx = (occ.wrapping_mul(candidate) >> shift) as usize;
                if table[idx] == 0 {
                    table[idx] = refs[i];
                } else if table[idx] != refs[i] {
                    ok = false;
                    break;
                }
            }
            if ok {
                break candidate;
            }
        };

        SquareMagic {
            mask,
            magic,
            shift,
            offset,
        }
    });

    MagicTable { squares, attacks }
}

static ROOK_TABLE: Lazy<MagicTable> = Lazy::new(|| build_table(&ROOK_DIRS, 0x9d3c_17a6));
static BISHOP_TABLE: Lazy<MagicTable> = Lazy::new(|| build_table(&BISHOP_DIRS, 0x51ce_f0b2));

#[inline]
fn lookup(table: &MagicTable, sq: usize, occ: u64) -> u64 {
    let m = &table.squares[sq];
    let idx = ((occ & m.mask).wrapping_mul(m.magic) >> m.shift) as usize;
    table.attacks[m.offset + idx]
}

/// Rook attacks from `sq` with blockers `occ`.
#[inline]
#[must_use]
pub fn rook_attacks(sq: usize, occ: u64) -> u64 {
    lookup(&ROOK_TABLE, sq, occ)
}

/// Bishop attacks from `sq` with blockers `occ`.
#[inline]
#[must_use]
pub fn bishop_attacks(sq: usize, occ: u64) -> u64 {
    lookup(&BISHOP_TABLE, sq, occ)
}

/// Queen attacks from `sq` with blockers `occ`.
#[inline]
#[must_use]
pub fn queen_attacks(sq: usize, occ: u64) -> u64 {
    rook_attacks(sq, occ) | bishop_attacks(sq, occ)
}

/// Force table construction. Called once from engine startup so the first
/// search does not pay for it.
pub fn init() {
    Lazy::force(&ROOK_TABLE);
    Lazy::force(&BISHOP_TABLE);
}
