//! The authoritative game aggregate: board, side to move and status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::board::{Board, Color, Piece, Position};
use super::movegen::{piece_moves, Move};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameStatus {
    Normal,
    Check,
    Checkmate,
    Stalemate,
    Resigned,
}

impl GameStatus {
    /// No further moves are accepted once a game reaches one of these.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate | GameStatus::Stalemate | GameStatus::Resigned
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMove {
    #[error("no piece at {0}")]
    NoPiece(Position),
    #[error("it is {0}'s turn")]
    WrongTurn(Color),
    #[error("{} to {} is not a legal move", .0.from, .0.to)]
    Illegal(Move),
    #[error("the game is over")]
    GameOver,
}

/// Snapshot of one game. This is exactly what is persisted and pushed to
/// clients in `LOAD_GAME`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub board: Board,
    pub turn: Color,
    pub status: GameStatus,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard layout, White to move.
    pub fn new() -> Self {
        Self {
            board: Board::standard(),
            turn: Color::White,
            status: GameStatus::Normal,
        }
    }

    /// Starts from an arbitrary board with `turn` to move; status is evaluated
    /// from the position.
    pub fn from_position(board: Board, turn: Color) -> Self {
        let mut game = Self {
            board,
            turn,
            status: GameStatus::Normal,
        };
        game.status = game.evaluate(turn);
        game
    }

    /// Legal moves for the piece on `from`, or `None` when the square is
    /// empty. The filter always protects the king of the piece being moved,
    /// regardless of whose turn it is.
    pub fn legal_moves(&self, from: Position) -> Option<Vec<Move>> {
        let piece = self.board.piece_at(from)?;
        Some(
            piece_moves(&self.board, from)
                .into_iter()
                .map(|c| c.mv)
                .filter(|mv| !leaves_king_capturable(&self.board, mv, piece.color))
                .collect(),
        )
    }

    /// Applies `mv` for the side to move and re-evaluates the status for the
    /// opponent. Returns the captured piece, if any. On error the game is
    /// untouched.
    pub fn apply_move(&mut self, mv: Move) -> Result<Option<Piece>, InvalidMove> {
        if self.status.is_terminal() {
            return Err(InvalidMove::GameOver);
        }
        let piece = self
            .board
            .piece_at(mv.from)
            .ok_or(InvalidMove::NoPiece(mv.from))?;
        if piece.color != self.turn {
            return Err(InvalidMove::WrongTurn(self.turn));
        }
        let legal = self.legal_moves(mv.from).unwrap_or_default();
        if !legal.contains(&mv) {
            return Err(InvalidMove::Illegal(mv));
        }

        let captured = self.board.relocate(mv.from, mv.to, mv.promotion);
        self.turn = self.turn.opponent();
        self.status = self.evaluate(self.turn);
        Ok(captured)
    }

    /// Ends the game by resignation, bypassing move evaluation.
    pub fn force_resign(&mut self) {
        self.status = GameStatus::Resigned;
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        king_capturable(&self.board, color)
    }

    pub fn is_in_checkmate(&self, color: Color) -> bool {
        self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    pub fn is_in_stalemate(&self, color: Color) -> bool {
        !self.is_in_check(color) && !self.has_any_legal_move(color)
    }

    pub fn has_any_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .any(|(pos, _)| {
                self.legal_moves(pos)
                    .is_some_and(|moves| !moves.is_empty())
            })
    }

    // Checkmate wins over stalemate, which wins over check.
    fn evaluate(&self, side: Color) -> GameStatus {
        let in_check = self.is_in_check(side);
        let can_move = self.has_any_legal_move(side);
        match (in_check, can_move) {
            (true, false) => GameStatus::Checkmate,
            (false, false) => GameStatus::Stalemate,
            (true, true) => GameStatus::Check,
            (false, true) => GameStatus::Normal,
        }
    }
}

/// True when some piece of `color`'s opponent can geometrically move onto
/// `color`'s king. A board without that king is never in check.
pub fn king_capturable(board: &Board, color: Color) -> bool {
    let Some(king) = board.king_position(color) else {
        return false;
    };
    board
        .pieces()
        .filter(|(_, p)| p.color != color)
        .any(|(pos, _)| piece_moves(board, pos).iter().any(|c| c.mv.to == king))
}

fn leaves_king_capturable(board: &Board, mv: &Move, mover: Color) -> bool {
    let mut scratch = board.clone();
    scratch.relocate(mv.from, mv.to, mv.promotion);
    king_capturable(&scratch, mover)
}
