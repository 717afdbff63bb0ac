//! Static exchange evaluation.
//!
//! Plays out the capture sequence a move starts on its destination square,
//! both sides always capturing with their least valuable attacker, sliders
//! revealed by x-ray as attackers are removed. A final pass over the
//! captured-value stack applies the "either side may stop" minimax.

use super::bits::bit;
use super::magics::{bishop_attacks, rook_attacks};
use super::masks::{MASKS, SEVENTH_RANK};
use super::pst::PC_VAL;
use super::state::Board;
use super::types::piece::{ALL, BQ, RQ};
use super::types::{Color, Move, Piece};

const MAX_CAPTURES: usize = 32;

impl Board {
    /// Net material outcome in centipawns of the exchange begun by `mv`
    /// (not necessarily a capture) for `color`, the side playing it.
    #[must_use]
    pub fn see(&self, mv: Move, color: Color) -> i32 {
        debug_assert!(!mv.is_null());

        let from = mv.from();
        let to = mv.to();
        let ep_victim = mv.ep_victim();

        let mut occ = self.all_pcs;
        if ep_victim != 0 {
            occ ^= bit(ep_victim);
        }

        let whites = &self.pcs[0];
        let blacks = &self.pcs[1];
        let bq = whites[BQ] | blacks[BQ];
        let rq = whites[RQ] | blacks[RQ];

        // Everything attacking the destination, for both sides.
        let mut attacks = (MASKS.pawn_capt[0][to] & blacks[Piece::Pawn.index()])
            | (MASKS.pawn_capt[1][to] & whites[Piece::Pawn.index()])
            | (MASKS.knight[to] & (whites[Piece::Knight.index()] | blacks[Piece::Knight.index()]))
            | (bishop_attacks(to, occ) & bq)
            | (rook_attacks(to, occ) & rq)
            | (MASKS.king[to] & (whites[Piece::King.index()] | blacks[Piece::King.index()]));

        let mut gain = [0i32; MAX_CAPTURES];
        let mut nc = 1;
        let mut val = 0;
        if let Some(capt) = mv.captured() {
            val += PC_VAL[capt.index()];
        }
        if let Some(prom) = mv.promotion() {
            val += PC_VAL[prom.index()] - PC_VAL[Piece::Pawn.index()];
        }
        gain[0] = val;

        // The piece that lands on the destination becomes the next victim.
        let mut color = color.opponent();
        let mut capt = match mv.promotion() {
            Some(prom) => PC_VAL[prom.index()],
            None => PC_VAL[mv.piece().index()],
        };
        attacks ^= bit(from);
        occ ^= bit(from);

        // A slider move may clear the way for other sliders.
        attacks |= bishop_attacks(to, occ) & occ & bq;
        attacks |= rook_attacks(to, occ) & occ & rq;

        while attacks != 0 {
            if self.pcs[color.index()][ALL] & attacks == 0 {
                break;
            }

            // Least valuable attacker of the side on the move.
            let mut pc = Piece::Pawn;
            let mut from_mask = 0u64;
            for pc_idx in Piece::Pawn.index()..=Piece::King.index() {
                let candidates = self.pcs[color.index()][pc_idx] & attacks;
                if candidates != 0 {
                    from_mask = candidates & candidates.wrapping_neg();
                    pc = match Piece::from_index(pc_idx) {
                        Some(pc) => pc,
                        None => unreachable!(),
                    };
                    break;
                }
            }

            debug_assert!(nc < MAX_CAPTURES);
            let mut val = 0;
            // A capturing pawn on its seventh rank promotes.
            if pc == Piece::Pawn && from_mask & SEVENTH_RANK[color.index()] != 0 {
                val = PC_VAL[Piece::Queen.index()] - PC_VAL[Piece::Pawn.index()];
                pc = Piece::Queen;
            }

            val += capt;
            gain[nc] = -gain[nc - 1] + val;
            nc += 1;
            // A king capture ends it all.
            if capt == PC_VAL[Piece::King.index()] {
                break;
            }
            capt = PC_VAL[pc.index()];

            attacks ^= from_mask;
            occ ^= from_mask;
            attacks |= bishop_attacks(to, occ) & occ & bq;
            attacks |= rook_attacks(to, occ) & occ & rq;

            color = color.opponent();
        }

        // Decide where the capture sequence actually stops.
        while nc > 1 {
            nc -= 1;
            if gain[nc] > -gain[nc - 1] {
                gain[nc - 1] = -gain[nc];
            }
        }

        gain[0]
    }
}
