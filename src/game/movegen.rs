//! Geometric move generation.
//!
//! Each routine answers "where can this piece go" from the board alone. None
//! of them care whether the move leaves the mover's own king capturable; that
//! filter lives in [`crate::game::rules`].

use serde::{Deserialize, Serialize};

use super::board::{Board, Color, Piece, PieceKind, Position};

/// A move as requested by a client or produced by the generator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    #[serde(alias = "startPosition")]
    pub from: Position,
    #[serde(alias = "endPosition")]
    pub to: Position,
    #[serde(default, alias = "promotionPiece", skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub const fn new(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub const fn promoting(from: Position, to: Position, kind: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

/// A reachable destination and whether landing there takes an enemy piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub mv: Move,
    pub capture: bool,
}

const DIAGONALS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ORTHOGONALS: [(i8, i8); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];
const ADJACENT: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
];

/// All geometrically reachable moves for the piece on `from`. Empty when the
/// square is empty.
pub fn piece_moves(board: &Board, from: Position) -> Vec<Candidate> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    match piece.kind {
        PieceKind::Bishop => slide(board, from, piece.color, &DIAGONALS, &mut out),
        PieceKind::Rook => slide(board, from, piece.color, &ORTHOGONALS, &mut out),
        PieceKind::Queen => {
            slide(board, from, piece.color, &DIAGONALS, &mut out);
            slide(board, from, piece.color, &ORTHOGONALS, &mut out);
        }
        PieceKind::King => step(board, from, piece.color, &ADJACENT, &mut out),
        PieceKind::Knight => step(board, from, piece.color, &KNIGHT_JUMPS, &mut out),
        PieceKind::Pawn => pawn(board, from, piece, &mut out),
    }
    out
}

fn slide(board: &Board, from: Position, color: Color, dirs: &[(i8, i8)], out: &mut Vec<Candidate>) {
    for &(dr, dc) in dirs {
        let mut cursor = from;
        while let Some(next) = cursor.offset(dr, dc) {
            match board.piece_at(next) {
                None => out.push(Candidate {
                    mv: Move::new(from, next),
                    capture: false,
                }),
                Some(other) => {
                    if other.color != color {
                        out.push(Candidate {
                            mv: Move::new(from, next),
                            capture: true,
                        });
                    }
                    break;
                }
            }
            cursor = next;
        }
    }
}

fn step(board: &Board, from: Position, color: Color, offsets: &[(i8, i8)], out: &mut Vec<Candidate>) {
    for &(dr, dc) in offsets {
        let Some(to) = from.offset(dr, dc) else {
            continue;
        };
        match board.piece_at(to) {
            None => out.push(Candidate {
                mv: Move::new(from, to),
                capture: false,
            }),
            Some(other) if other.color != color => out.push(Candidate {
                mv: Move::new(from, to),
                capture: true,
            }),
            Some(_) => {}
        }
    }
}

fn pawn(board: &Board, from: Position, piece: Piece, out: &mut Vec<Candidate>) {
    let color = piece.color;
    let fwd = color.forward();

    if let Some(one) = from.offset(fwd, 0) {
        if board.piece_at(one).is_none() {
            push_pawn_move(from, one, color, false, out);
            if from.row == color.pawn_row() {
                if let Some(two) = one.offset(fwd, 0) {
                    if board.piece_at(two).is_none() {
                        push_pawn_move(from, two, color, false, out);
                    }
                }
            }
        }
    }

    for dc in [-1, 1] {
        let Some(to) = from.offset(fwd, dc) else {
            continue;
        };
        if matches!(board.piece_at(to), Some(other) if other.color != color) {
            push_pawn_move(from, to, color, true, out);
        }
    }
}

fn push_pawn_move(from: Position, to: Position, color: Color, capture: bool, out: &mut Vec<Candidate>) {
    if to.row == color.promotion_row() {
        out.extend(PieceKind::PROMOTIONS.iter().map(|&kind| Candidate {
            mv: Move::promoting(from, to, kind),
            capture,
        }));
    } else {
        out.push(Candidate {
            mv: Move::new(from, to),
            capture,
        });
    }
}
