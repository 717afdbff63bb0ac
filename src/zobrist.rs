//! Zobrist hashing for chess positions.
//!
//! Random 64-bit values for everything that goes into a position key: side
//! to move, piece placements, en passant square and castling rights. The
//! keys are generated once from a fixed seed so hashes are reproducible
//! across runs.

use once_cell::sync::Lazy;
use rand::prelude::*;

use crate::board::types::{Color, Piece, Square};

pub(crate) struct ZobristKeys {
    pub(crate) color: u64,
    /// `pc[color][piece][square]`, piece indexed 1..=6 (slot 0 unused).
    pub(crate) pc: [[[u64; 64]; 7]; 2],
    pub(crate) enpassant: [u64; 64],
    /// `castle[color][side]`, side 0 = kingside.
    pub(crate) castle: [[u64; 2]; 2],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x5EED_CAB1_E5);
        let mut pc = [[[0u64; 64]; 7]; 2];
        let mut enpassant = [0u64; 64];
        let mut castle = [[0u64; 2]; 2];

        for color in &mut pc {
            for piece in color.iter_mut().skip(1) {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }
        let color = rng.gen();
        for key in &mut enpassant {
            *key = rng.gen();
        }
        for side in &mut castle {
            for key in side.iter_mut() {
                *key = rng.gen();
            }
        }

        ZobristKeys {
            color,
            pc,
            enpassant,
            castle,
        }
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[inline]
pub(crate) fn piece_key(color: Color, pc: Piece, sq: Square) -> u64 {
    ZOBRIST.pc[color.index()][pc.index()][sq]
}

#[inline]
pub(crate) fn enpassant_key(sq: Square) -> u64 {
    ZOBRIST.enpassant[sq]
}

#[inline]
pub(crate) fn castle_key(color: Color, side: usize) -> u64 {
    ZOBRIST.castle[color.index()][side]
}

#[inline]
pub(crate) fn color_key() -> u64 {
    ZOBRIST.color
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_stable_and_distinct() {
        assert_eq!(
            piece_key(Color::White, Piece::Pawn, 0),
            piece_key(Color::White, Piece::Pawn, 0)
        );
        assert_ne!(
            piece_key(Color::White, Piece::Pawn, 0),
            piece_key(Color::Black, Piece::Pawn, 0)
        );
        assert_ne!(
            piece_key(Color::White, Piece::Pawn, 0),
            piece_key(Color::White, Piece::Knight, 0)
        );
        assert_ne!(color_key(), 0);
    }
}
