use serde::{Deserialize, Serialize};
use std::fmt;

/// The two sides in a game.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row a pawn of this color starts on.
    pub fn pawn_row(self) -> i8 {
        match self {
            Color::White => 2,
            Color::Black => 7,
        }
    }

    /// Row direction this color's pawns advance in.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The opposing back rank, where this color's pawns promote.
    pub fn promotion_row(self) -> i8 {
        match self {
            Color::White => 8,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Kinds a pawn may become, in the order promotion variants are generated.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Queen,
        PieceKind::Rook,
    ];
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

/// A square, 1-indexed: `row` 1 is White's back rank, `col` 1 is the a-file.
///
/// Values outside 1..=8 can be deserialized from a client; they never hold a
/// piece and never appear among generated moves.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: i8,
    pub col: i8,
}

impl Position {
    pub const fn new(row: i8, col: i8) -> Self {
        Self { row, col }
    }

    pub fn on_board(self) -> bool {
        (1..=8).contains(&self.row) && (1..=8).contains(&self.col)
    }

    /// The square `(dr, dc)` away, if it is still on the board.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Position> {
        let next = Position::new(self.row + dr, self.col + dc);
        next.on_board().then_some(next)
    }

    fn index(self) -> Option<(usize, usize)> {
        self.on_board()
            .then(|| ((self.row - 1) as usize, (self.col - 1) as usize))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.on_board() {
            let file = (b'a' + (self.col - 1) as u8) as char;
            write!(f, "{}{}", file, self.row)
        } else {
            write!(f, "({},{})", self.row, self.col)
        }
    }
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// 8x8 grid of optional pieces. Serialized as a bare nested array indexed
/// `[row - 1][col - 1]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
        }
    }

    /// The standard 32-piece starting layout.
    pub fn standard() -> Self {
        let mut board = Self::empty();
        board.reset();
        board
    }

    pub fn reset(&mut self) {
        *self = Self::empty();
        for (col, kind) in (1..=8).zip(BACK_RANK) {
            self.place(Position::new(1, col), Piece::new(kind, Color::White));
            self.place(Position::new(2, col), Piece::new(PieceKind::Pawn, Color::White));
            self.place(Position::new(7, col), Piece::new(PieceKind::Pawn, Color::Black));
            self.place(Position::new(8, col), Piece::new(kind, Color::Black));
        }
    }

    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        pos.index().and_then(|(r, c)| self.squares[r][c])
    }

    /// Puts `piece` on `pos`, replacing whatever was there. Off-board
    /// positions are ignored.
    pub fn place(&mut self, pos: Position, piece: Piece) {
        if let Some((r, c)) = pos.index() {
            self.squares[r][c] = Some(piece);
        }
    }

    pub fn clear(&mut self, pos: Position) -> Option<Piece> {
        pos.index().and_then(|(r, c)| self.squares[r][c].take())
    }

    /// Moves the piece on `from` to `to`, substituting `promotion` for its
    /// kind when given, and returns the piece that was captured. No legality
    /// checks happen here.
    pub fn relocate(
        &mut self,
        from: Position,
        to: Position,
        promotion: Option<PieceKind>,
    ) -> Option<Piece> {
        let mut piece = self.clear(from)?;
        if let Some(kind) = promotion {
            piece.kind = kind;
        }
        let captured = self.clear(to);
        self.place(to, piece);
        captured
    }

    /// Every occupied square with its piece, row-major from a1.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        self.squares.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().filter_map(move |(c, cell)| {
                cell.map(|piece| (Position::new(r as i8 + 1, c as i8 + 1), piece))
            })
        })
    }

    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(pos, _)| pos)
    }
}
