//! Move text: coordinate notation in, SAN and coordinate notation out.

use std::fmt;

use super::state::Board;
use super::types::castling::{C_KSIDE, C_QSIDE, C_TO, KING_SQ};
use super::types::{sq_file, sq_from_str, sq_rank, Move, Piece};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveParseError {
    /// Not a move string at all.
    Malformed,
    /// Syntactically fine but not among the legal moves.
    Illegal,
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::Malformed => write!(f, "not a move"),
            MoveParseError::Illegal => write!(f, "illegal move"),
        }
    }
}

impl std::error::Error for MoveParseError {}

/// Is `word` shaped like a coordinate move ("e2e4", "e7e8q")? It does not
/// have to be legal or even pseudo-legal.
#[must_use]
pub fn is_move_str(word: &str) -> bool {
    if sq_from_str(word).is_none() {
        return false;
    }
    let Some(rest) = word.get(2..) else {
        return false;
    };
    if sq_from_str(rest).is_none() {
        return false;
    }
    match rest.get(2..) {
        Some("") | None => true,
        Some(prom) => {
            prom.len() == 1
                && prom
                    .chars()
                    .next()
                    .and_then(Piece::from_promotion_char)
                    .is_some()
        }
    }
}

const SAN_FILE_NEEDED: u32 = 1;
const SAN_RANK_NEEDED: u32 = 2;

impl Board {
    /// Parse a coordinate-notation move against the legal moves of this
    /// position.
    pub fn parse_move(&self, word: &str) -> Result<Move, MoveParseError> {
        if !is_move_str(word) {
            return Err(MoveParseError::Malformed);
        }
        let from = match sq_from_str(word) {
            Some(sq) => sq,
            None => return Err(MoveParseError::Malformed),
        };
        let to = match word.get(2..).and_then(sq_from_str) {
            Some(sq) => sq,
            None => return Err(MoveParseError::Malformed),
        };
        let prom = word.chars().nth(4).and_then(Piece::from_promotion_char);

        let pc = match self.mailbox[from] {
            Some(pc) => pc,
            None => return Err(MoveParseError::Illegal),
        };
        let list = self.generate_piece_moves(pc, to);
        list.iter()
            .copied()
            .find(|m| m.from() == from && m.promotion() == prom)
            .ok_or(MoveParseError::Illegal)
    }

    /// How much detail SAN needs to name a move of `pc` to `to` uniquely.
    fn needed_move_details(&self, pc: Piece, from: usize, to: usize) -> u32 {
        let mut unique = true;
        let mut unique_rank = true;
        let mut unique_file = true;

        for mv in &self.generate_piece_moves(pc, to) {
            let from2 = mv.from();
            if from2 != from {
                unique = false;
                if sq_file(from2) == sq_file(from) {
                    unique_file = false;
                }
                if sq_rank(from2) == sq_rank(from) {
                    unique_rank = false;
                }
            }
        }

        let mut details = 0;
        if !unique {
            if !unique_rank || unique_file {
                details |= SAN_FILE_NEEDED;
            }
            if !unique_file {
                details |= SAN_RANK_NEEDED;
            }
        }
        details
    }

    /// '+' for a check, '#' for a mate, nothing otherwise. Makes and
    /// unmakes the move when it checks.
    fn move_suffix(&mut self, mv: Move) -> &'static str {
        if !mv.is_check() {
            return "";
        }
        self.make_move(mv);
        let mate = self.generate_moves().is_empty();
        self.undo_move();
        if mate {
            "#"
        } else {
            "+"
        }
    }

    /// Format a legal move in standard algebraic notation.
    #[must_use]
    pub fn move_to_san(&mut self, mv: Move) -> String {
        debug_assert!(!mv.is_null());
        let suffix = self.move_suffix(mv);

        if mv.is_castling() {
            let base = if mv.castle_side() == C_KSIDE {
                "O-O"
            } else {
                "O-O-O"
            };
            return format!("{base}{suffix}");
        }

        let pc = mv.piece();
        let from = mv.from();
        let to = mv.to();
        let mut san = String::new();

        if pc != Piece::Pawn {
            san.push(pc.to_char());
            let details = self.needed_move_details(pc, from, to);
            if details & SAN_FILE_NEEDED != 0 {
                san.push((b'a' + sq_file(from) as u8) as char);
            }
            if details & SAN_RANK_NEEDED != 0 {
                san.push((b'1' + (7 - sq_rank(from)) as u8) as char);
            }
        }

        if mv.is_capture() {
            if pc == Piece::Pawn {
                san.push((b'a' + sq_file(from) as u8) as char);
            }
            san.push('x');
        }

        san.push((b'a' + sq_file(to) as u8) as char);
        san.push((b'1' + (7 - sq_rank(to)) as u8) as char);

        if let Some(prom) = mv.promotion() {
            san.push('=');
            san.push(prom.to_char());
        }

        san.push_str(suffix);
        san
    }

    /// Parse a SAN move string against the legal moves of this position.
    #[must_use]
    pub fn san_to_move(&mut self, san: &str) -> Option<Move> {
        if !san.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }

        let (pc, to) = if san.starts_with("O-O-O") {
            (Piece::King, KING_SQ[self.color.index()][C_QSIDE][C_TO])
        } else if san.starts_with("O-O") {
            (Piece::King, KING_SQ[self.color.index()][C_KSIDE][C_TO])
        } else {
            let trimmed = san.trim_end_matches(['+', '#']);
            let pc = Piece::from_char(trimmed.chars().next()?).unwrap_or(Piece::Pawn);
            // Strip a "=Q" style promotion suffix.
            let trimmed = if pc == Piece::Pawn {
                match trimmed.char_indices().rev().next() {
                    Some((i, c)) if Piece::from_char(c).is_some() => {
                        trimmed.get(..i.saturating_sub(1))?
                    }
                    _ => trimmed,
                }
            } else {
                trimmed
            };
            if trimmed.len() < 2 {
                return None;
            }
            let to = sq_from_str(trimmed.get(trimmed.len() - 2..)?)?;
            (pc, to)
        };

        let list = self.generate_piece_moves(pc, to);
        if list.len() == 1 {
            return Some(list.get(0));
        }
        list.iter()
            .copied()
            .find(|&m| self.move_to_san(m) == san)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::sq;

    #[test]
    fn move_str_shapes() {
        assert!(is_move_str("e2e4"));
        assert!(is_move_str("e7e8q"));
        assert!(!is_move_str("e2e9"));
        assert!(!is_move_str("e2"));
        assert!(!is_move_str("e7e8x"));
        assert!(!is_move_str("hello"));
    }

    #[test]
    fn parse_legal_coordinate_move() {
        let board = Board::new();
        let mv = board.parse_move("e2e4").unwrap();
        assert_eq!(mv.from(), sq::E2);
        assert_eq!(mv.to(), sq::E4);
    }

    #[test]
    fn parse_rejects_illegal_and_malformed() {
        let board = Board::new();
        assert_eq!(board.parse_move("e2e5"), Err(MoveParseError::Illegal));
        assert_eq!(board.parse_move("e9e4"), Err(MoveParseError::Malformed));
        assert_eq!(board.parse_move("xyzzy"), Err(MoveParseError::Malformed));
    }

    #[test]
    fn coordinate_round_trip_all_legal_moves() {
        let fens = [
            crate::board::START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/P7/8/8/8/8/k6K/8 w - - 0 1",
        ];
        for fen in fens {
            let board = Board::from_fen(fen).unwrap();
            for mv in &board.generate_moves() {
                let parsed = board.parse_move(&mv.to_coord()).unwrap();
                assert_eq!(parsed, *mv, "{fen}: {mv:?}");
            }
        }
    }

    #[test]
    fn san_basics() {
        let mut board = Board::new();
        let mv = board.parse_move("g1f3").unwrap();
        assert_eq!(board.move_to_san(mv), "Nf3");
        let mv = board.parse_move("e2e4").unwrap();
        assert_eq!(board.move_to_san(mv), "e4");
    }

    #[test]
    fn san_capture_and_promotion() {
        let mut board = Board::from_fen("1r2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mv = board.parse_move("a7b8q").unwrap();
        assert_eq!(board.move_to_san(mv), "axb8=Q+");
    }

    #[test]
    fn san_castling() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = board.parse_move("e1g1").unwrap();
        assert_eq!(board.move_to_san(mv), "O-O");
        let mv = board.parse_move("e1c1").unwrap();
        assert_eq!(board.move_to_san(mv), "O-O-O");
    }

    #[test]
    fn san_disambiguation() {
        // Both knights reach b3, so the file is spelled out.
        let mut board = Board::from_fen("4k3/8/8/8/8/8/8/N1N1K3 w - - 0 1").unwrap();
        let mv = board.parse_move("a1b3").unwrap();
        assert_eq!(board.move_to_san(mv), "Nab3");
    }

    #[test]
    fn san_mate_suffix() {
        // Back-rank mate in one.
        let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        let mv = board.parse_move("a1a8").unwrap();
        assert_eq!(board.move_to_san(mv), "Ra8#");
    }

    #[test]
    fn san_round_trip() {
        let fens = [
            crate::board::START_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        ];
        for fen in fens {
            let mut board = Board::from_fen(fen).unwrap();
            for mv in board.generate_moves().iter().copied() {
                let san = board.move_to_san(mv);
                let parsed = board.san_to_move(&san);
                assert_eq!(parsed, Some(mv), "{fen}: {san}");
            }
        }
    }
}
