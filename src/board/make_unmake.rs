//! Making and unmaking moves.
//!
//! `make_move` pushes a new position-info entry and updates every piece of
//! board state incrementally: bitboards, mailbox, king squares, castling
//! rights, en passant, the fifty counter, material, phase and both hash
//! keys. `undo_move` reverses from the move word and the popped entry
//! without recomputing anything from scratch.

use super::bits::bit;
use super::pst::{PC_VAL, PHASE_VAL};
use super::state::{Board, MAX_GAME_PLIES};
use super::types::castling::{ALL_RIGHTS, C_FROM, C_KSIDE, C_QSIDE, C_TO, RIGHTS, ROOK_SQ};
use super::types::piece::{ALL, BQ, RQ};
use super::types::{Move, Piece, Square};
use crate::zobrist;

/// The position before a reversible move can be reached again, so only
/// reversible moves extend the fifty counter.
fn is_reversible(mv: Move) -> bool {
    mv.piece() != Piece::Pawn && !mv.is_capture() && !mv.is_castling()
}

impl Board {
    fn make_pawn_move(&mut self, mv: Move) {
        let color = self.color;
        let c = color.index();
        let from = mv.from();
        let to = mv.to();
        let ep_victim = mv.ep_victim();

        self.pcs[c][Piece::Pawn.index()] ^= bit(from);
        self.pos[self.nmoves].pawn_key ^= zobrist::piece_key(color, Piece::Pawn, from);
        if let Some(prom) = mv.promotion() {
            self.mailbox[to] = Some(prom);
            self.pcs[c][prom.index()] ^= bit(to);
            self.material[c] += PC_VAL[prom.index()];
            self.phase -= PHASE_VAL[prom.index()];
            self.pos[self.nmoves].key ^= zobrist::piece_key(color, prom, to);
        } else {
            self.mailbox[to] = Some(Piece::Pawn);
            self.pcs[c][Piece::Pawn.index()] ^= bit(to);
            self.pos[self.nmoves].key ^= zobrist::piece_key(color, Piece::Pawn, to);
            self.pos[self.nmoves].pawn_key ^= zobrist::piece_key(color, Piece::Pawn, to);
        }

        if ep_victim != 0 {
            let opp = color.opponent();
            self.mailbox[ep_victim] = None;
            self.pcs[opp.index()][Piece::Pawn.index()] ^= bit(ep_victim);
            self.pcs[opp.index()][ALL] ^= bit(ep_victim);
            self.pos[self.nmoves].key ^= zobrist::piece_key(opp, Piece::Pawn, ep_victim);
            self.pos[self.nmoves].pawn_key ^= zobrist::piece_key(opp, Piece::Pawn, ep_victim);
        }

        // A double step opens an en passant chance for the opponent.
        if color.sign() * (to as i32 - from as i32) == -16 {
            let ep_sq = (to as i32 + color.sign() * 8) as Square;
            self.pos[self.nmoves].ep_sq = ep_sq;
            self.pos[self.nmoves].key ^= zobrist::enpassant_key(ep_sq);
        }
    }

    fn make_rook_move(&mut self, mv: Move) {
        let color = self.color;
        let c = color.index();
        let from = mv.from();

        for side in [C_KSIDE, C_QSIDE] {
            if from == ROOK_SQ[c][side][C_FROM]
                && self.pos[self.nmoves].castle_rights & RIGHTS[c][side] != 0
            {
                self.pos[self.nmoves].key ^= zobrist::castle_key(color, side);
                self.pos[self.nmoves].castle_rights &= !RIGHTS[c][side];
                break;
            }
        }
    }

    fn make_king_move(&mut self, mv: Move) {
        let color = self.color;
        let c = color.index();

        if self.pos[self.nmoves].castle_rights & ALL_RIGHTS[c] != 0 {
            for side in [C_KSIDE, C_QSIDE] {
                if self.pos[self.nmoves].castle_rights & RIGHTS[c][side] != 0 {
                    self.pos[self.nmoves].key ^= zobrist::castle_key(color, side);
                }
            }
            self.pos[self.nmoves].castle_rights &= !ALL_RIGHTS[c];
        }
        self.king_sq[c] = mv.to();

        if mv.is_castling() {
            let side = mv.castle_side();
            let rook_from = ROOK_SQ[c][side][C_FROM];
            let rook_to = ROOK_SQ[c][side][C_TO];
            let rook_mask = bit(rook_from) | bit(rook_to);

            self.mailbox[rook_from] = None;
            self.mailbox[rook_to] = Some(Piece::Rook);
            self.pcs[c][Piece::Rook.index()] ^= rook_mask;
            self.pcs[c][ALL] ^= rook_mask;
            self.pos[self.nmoves].key ^= zobrist::piece_key(color, Piece::Rook, rook_from);
            self.pos[self.nmoves].key ^= zobrist::piece_key(color, Piece::Rook, rook_to);
        }
    }

    /// Apply a legal move to the board.
    pub fn make_move(&mut self, mv: Move) {
        debug_assert!(!mv.is_null());
        debug_assert!(self.nmoves + 1 < MAX_GAME_PLIES);

        let color = self.color;
        let c = color.index();
        let opp = color.opponent();
        let from = mv.from();
        let to = mv.to();
        let pc = mv.piece();
        let from_to = bit(from) | bit(to);

        // Push a new position seeded from the current one.
        self.pos[self.nmoves + 1] = self.pos[self.nmoves];
        self.nmoves += 1;
        self.pos[self.nmoves].mv = mv;
        self.pos[self.nmoves].in_check = mv.is_check();
        self.pos[self.nmoves].fifty = if is_reversible(mv) {
            self.pos[self.nmoves - 1].fifty + 1
        } else {
            0
        };

        self.pos[self.nmoves].key ^= zobrist::piece_key(color, pc, from);

        // The old en passant chance expires.
        let old_ep = self.pos[self.nmoves].ep_sq;
        if old_ep != 0 {
            self.pos[self.nmoves].key ^= zobrist::enpassant_key(old_ep);
            self.pos[self.nmoves].ep_sq = 0;
        }

        if pc == Piece::Pawn {
            self.make_pawn_move(mv);
        } else {
            self.mailbox[to] = Some(pc);
            self.pcs[c][pc.index()] ^= from_to;
            if pc == Piece::King {
                self.make_king_move(mv);
            } else if pc == Piece::Rook {
                self.make_rook_move(mv);
            }
            self.pos[self.nmoves].key ^= zobrist::piece_key(color, pc, to);
        }
        self.pcs[c][ALL] ^= from_to;
        self.mailbox[from] = None;

        // En passant captures were handled by make_pawn_move; this is for
        // all other captures.
        if !mv.is_en_passant() {
            if let Some(capt) = mv.captured() {
                self.pcs[opp.index()][capt.index()] ^= bit(to);
                self.pcs[opp.index()][ALL] ^= bit(to);
                if capt != Piece::Pawn {
                    self.material[opp.index()] -= PC_VAL[capt.index()];
                    self.phase += PHASE_VAL[capt.index()];
                } else {
                    self.pos[self.nmoves].pawn_key ^= zobrist::piece_key(opp, Piece::Pawn, to);
                }
                self.pos[self.nmoves].key ^= zobrist::piece_key(opp, capt, to);
            }
        }
        // A captured rook on its home square takes a castling right along.
        if let Some(Piece::Rook) = mv.captured() {
            let oc = opp.index();
            for side in [C_KSIDE, C_QSIDE] {
                if to == ROOK_SQ[oc][side][C_FROM]
                    && self.pos[self.nmoves].castle_rights & RIGHTS[oc][side] != 0
                {
                    self.pos[self.nmoves].key ^= zobrist::castle_key(opp, side);
                    self.pos[self.nmoves].castle_rights &= !RIGHTS[oc][side];
                }
            }
        }

        self.pcs[c][BQ] = self.pcs[c][Piece::Bishop.index()] | self.pcs[c][Piece::Queen.index()];
        self.pcs[c][RQ] = self.pcs[c][Piece::Rook.index()] | self.pcs[c][Piece::Queen.index()];
        let oc = opp.index();
        self.pcs[oc][BQ] = self.pcs[oc][Piece::Bishop.index()] | self.pcs[oc][Piece::Queen.index()];
        self.pcs[oc][RQ] = self.pcs[oc][Piece::Rook.index()] | self.pcs[oc][Piece::Queen.index()];
        self.all_pcs = self.pcs[c][ALL] | self.pcs[oc][ALL];
        self.pos[self.nmoves].key ^= zobrist::color_key();

        self.color = opp;
    }

    fn undo_pawn_move(&mut self, mv: Move) {
        let color = self.color.opponent();
        let c = color.index();
        let from = mv.from();
        let to = mv.to();
        let ep_victim = mv.ep_victim();

        self.pcs[c][Piece::Pawn.index()] ^= bit(from);
        if let Some(prom) = mv.promotion() {
            self.pcs[c][prom.index()] ^= bit(to);
            self.material[c] -= PC_VAL[prom.index()];
            self.phase += PHASE_VAL[prom.index()];
        } else {
            self.pcs[c][Piece::Pawn.index()] ^= bit(to);
        }

        if ep_victim != 0 {
            let opp = color.opponent();
            self.mailbox[ep_victim] = Some(Piece::Pawn);
            self.pcs[opp.index()][Piece::Pawn.index()] ^= bit(ep_victim);
            self.pcs[opp.index()][ALL] ^= bit(ep_victim);
        }
    }

    fn undo_king_move(&mut self, mv: Move) {
        let color = self.color.opponent();
        let c = color.index();
        self.king_sq[c] = mv.from();

        if mv.is_castling() {
            let side = mv.castle_side();
            let rook_from = ROOK_SQ[c][side][C_FROM];
            let rook_to = ROOK_SQ[c][side][C_TO];
            let rook_mask = bit(rook_from) | bit(rook_to);

            self.mailbox[rook_to] = None;
            self.mailbox[rook_from] = Some(Piece::Rook);
            self.pcs[c][Piece::Rook.index()] ^= rook_mask;
            self.pcs[c][ALL] ^= rook_mask;
        }
    }

    /// Revert the last move made with [`Board::make_move`].
    pub fn undo_move(&mut self) {
        debug_assert!(self.nmoves > 0);
        let mv = self.pos[self.nmoves].mv;
        debug_assert!(!mv.is_null());

        let color = self.color.opponent();
        let c = color.index();
        let opp = self.color;
        let from = mv.from();
        let to = mv.to();
        let pc = mv.piece();
        let from_to = bit(from) | bit(to);

        if pc == Piece::Pawn {
            self.undo_pawn_move(mv);
        } else {
            self.pcs[c][pc.index()] ^= from_to;
            if pc == Piece::King {
                self.undo_king_move(mv);
            }
        }
        self.pcs[c][ALL] ^= from_to;
        self.mailbox[from] = Some(pc);

        match mv.captured() {
            Some(capt) if !mv.is_en_passant() => {
                self.mailbox[to] = Some(capt);
                self.pcs[opp.index()][capt.index()] ^= bit(to);
                self.pcs[opp.index()][ALL] ^= bit(to);
                if capt != Piece::Pawn {
                    self.material[opp.index()] += PC_VAL[capt.index()];
                    self.phase -= PHASE_VAL[capt.index()];
                }
            }
            _ => self.mailbox[to] = None,
        }

        self.pcs[c][BQ] = self.pcs[c][Piece::Bishop.index()] | self.pcs[c][Piece::Queen.index()];
        self.pcs[c][RQ] = self.pcs[c][Piece::Rook.index()] | self.pcs[c][Piece::Queen.index()];
        let oc = opp.index();
        self.pcs[oc][BQ] = self.pcs[oc][Piece::Bishop.index()] | self.pcs[oc][Piece::Queen.index()];
        self.pcs[oc][RQ] = self.pcs[oc][Piece::Rook.index()] | self.pcs[oc][Piece::Queen.index()];
        self.all_pcs = self.pcs[c][ALL] | self.pcs[oc][ALL];

        self.color = color;
        self.nmoves -= 1;
    }

    /// Pass the move: flip the side, clear any en passant chance and reset
    /// the fifty counter so repetition lookups never cross the null.
    pub fn make_nullmove(&mut self) {
        debug_assert!(!self.pos().in_check);
        debug_assert!(self.nmoves + 1 < MAX_GAME_PLIES);

        self.pos[self.nmoves + 1] = self.pos[self.nmoves];
        self.nmoves += 1;
        self.pos[self.nmoves].mv = Move::NULL;
        self.pos[self.nmoves].fifty = 0;

        self.pos[self.nmoves].key ^= zobrist::color_key();
        self.color = self.color.opponent();
        let ep_sq = self.pos[self.nmoves].ep_sq;
        if ep_sq != 0 {
            self.pos[self.nmoves].key ^= zobrist::enpassant_key(ep_sq);
            self.pos[self.nmoves].ep_sq = 0;
        }
    }

    pub fn undo_nullmove(&mut self) {
        debug_assert!(self.nmoves > 0);
        debug_assert!(self.pos().mv.is_null());

        self.color = self.color.opponent();
        self.nmoves -= 1;
    }

    /// How many earlier positions of the game equal the current one,
    /// stopping early once `max` repeats are found. Walks only within the
    /// fifty-move window, so irreversible moves (and null moves) cut the
    /// search off.
    #[must_use]
    pub fn repetition_count(&self, max: u32) -> u32 {
        let fifty = self.pos[self.nmoves].fifty as usize;
        debug_assert!(self.nmoves >= fifty);

        // Fewer than four reversible moves cannot repeat anything.
        if fifty < 4 {
            return 0;
        }

        let key = self.pos[self.nmoves].key;
        let mut nrepeats = 0;
        for i in 1..=fifty {
            if self.pos[self.nmoves - i].key == key {
                nrepeats += 1;
                if nrepeats >= max {
                    return nrepeats;
                }
            }
        }
        nrepeats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::{sq, Color};

    fn snapshot(board: &Board) -> (u64, [[u64; 9]; 2], [Option<Piece>; 64], [i32; 2], i32, u64, u64) {
        (
            board.all_pcs,
            board.pcs,
            board.mailbox,
            board.material,
            board.phase,
            board.key(),
            board.pawn_key(),
        )
    }

    #[test]
    fn make_undo_restores_everything() {
        let mut board = Board::new();
        let before = snapshot(&board);
        let list = board.generate_moves();
        for mv in list.iter().copied() {
            board.make_move(mv);
            assert!(board.is_ok());
            assert_eq!(board.in_check(), board.compute_in_check());
            board.undo_move();
            assert_eq!(snapshot(&board), before, "undo of {mv:?} diverged");
        }
    }

    #[test]
    fn make_never_leaves_mover_in_check() {
        let fens = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "4r2k/8/8/8/8/3n4/R7/4K3 w - - 0 1",
        ];
        for fen in fens {
            let mut board = Board::from_fen(fen).unwrap();
            for mv in board.generate_moves().iter().copied() {
                board.make_move(mv);
                // The mover's king may not be attacked afterwards.
                let mover = board.side_to_move().opponent();
                let saved = board.color;
                board.color = mover;
                assert!(!board.compute_in_check(), "{fen}: {mv:?} leaves check");
                board.color = saved;
                board.undo_move();
            }
        }
    }

    #[test]
    fn incremental_keys_match_recomputed() {
        let mut board = Board::new();
        // A short game touching castling, capture and pawn pushes.
        for coord in ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1", "f6e4"] {
            let mv = find_move(&board, coord);
            board.make_move(mv);
            let (key, pawn_key) = board.computed_keys();
            assert_eq!(board.key(), key, "after {coord}");
            assert_eq!(board.pawn_key(), pawn_key, "after {coord}");
        }
    }

    fn find_move(board: &Board, coord: &str) -> Move {
        board
            .generate_moves()
            .iter()
            .copied()
            .find(|m| m.to_coord() == coord)
            .unwrap_or_else(|| panic!("move {coord} not legal"))
    }

    #[test]
    fn en_passant_make_undo() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let before = snapshot(&board);
        let ep = find_move(&board, "e5f6");
        board.make_move(ep);
        assert_eq!(board.piece_on(sq::F6), Some(Piece::Pawn));
        assert_eq!(board.piece_on(sq::F5), None);
        let (key, pawn_key) = board.computed_keys();
        assert_eq!(board.key(), key);
        assert_eq!(board.pawn_key(), pawn_key);
        board.undo_move();
        assert_eq!(snapshot(&board), before);
    }

    #[test]
    fn promotion_updates_material_and_phase() {
        let mut board = Board::from_fen("8/P7/8/8/8/8/k6K/8 w - - 0 1").unwrap();
        let phase = board.phase();
        let mat = board.material(Color::White);
        let prom = find_move(&board, "a7a8q");
        board.make_move(prom);
        assert_eq!(board.material(Color::White), mat + PC_VAL[Piece::Queen.index()]);
        assert_eq!(board.phase(), phase - PHASE_VAL[Piece::Queen.index()]);
        board.undo_move();
        assert_eq!(board.phase(), phase);
        assert_eq!(board.material(Color::White), mat);
    }

    #[test]
    fn castling_rights_fall_with_rook_capture() {
        let mut board =
            Board::from_fen("r3k2r/8/8/8/8/8/6b1/R3K2R b KQkq - 0 1").unwrap();
        let capt = find_move(&board, "g2h1");
        board.make_move(capt);
        assert!(!board.has_castling_right(Color::White, C_KSIDE));
        assert!(board.has_castling_right(Color::White, C_QSIDE));
        let (key, _) = board.computed_keys();
        assert_eq!(board.key(), key);
    }

    #[test]
    fn null_move_round_trip() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let before = snapshot(&board);
        let color = board.side_to_move();
        board.make_nullmove();
        assert_eq!(board.side_to_move(), color.opponent());
        assert_eq!(board.pos().ep_sq, 0);
        assert_eq!(board.fifty(), 0);
        let (key, _) = board.computed_keys();
        assert_eq!(board.key(), key, "null move key matches a fresh compute");
        board.undo_nullmove();
        assert_eq!(snapshot(&board), before);
        assert_eq!(board.side_to_move(), color);
    }

    #[test]
    fn repetition_is_counted() {
        let mut board = Board::new();
        for coord in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = find_move(&board, coord);
            board.make_move(mv);
        }
        assert!(board.repetition_count(3) >= 2);
    }

    #[test]
    fn null_move_blocks_repetition_lookup() {
        let mut board = Board::new();
        for coord in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            let mv = find_move(&board, coord);
            board.make_move(mv);
        }
        assert_eq!(board.repetition_count(3), 1);
        board.make_nullmove();
        assert_eq!(board.repetition_count(3), 0);
        board.undo_nullmove();
    }
}
