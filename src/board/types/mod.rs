//! Core board types: squares, colors, pieces, castling data and moves.

pub mod castling;
pub mod moves;
pub mod piece;
pub mod square;

pub use castling::{C_KSIDE, C_QSIDE};
pub use moves::{Move, MoveList, MAX_MOVES};
pub use piece::{Piece, PROMOTION_PIECES};
pub use square::{
    distance, flip_sq, is_on_board, relative_sq, sq, sq_file, sq_from_str, sq_rank, sq_to_str,
    Color, Square,
};
