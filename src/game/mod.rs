pub mod board;
pub mod movegen;
pub mod rules;

pub use board::{Board, Color, Piece, PieceKind, Position};
pub use movegen::{piece_moves, Candidate, Move};
pub use rules::{king_capturable, Game, GameStatus, InvalidMove};
