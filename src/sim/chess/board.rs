//! Board representation
//!
//! Row 0 is black's back rank and row 7 is white's, matching the on-screen
//! layout with white at the bottom.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Row delta of a pawn step
    pub fn forward(self) -> i32 {
        match self {
            Side::White => -1,
            Side::Black => 1,
        }
    }

    pub fn back_rank(self) -> i32 {
        match self {
            Side::White => 7,
            Side::Black => 0,
        }
    }

    /// Rank a pawn promotes on
    pub fn last_rank(self) -> i32 {
        self.opposite().back_rank()
    }

    /// Rank pawns start on
    pub fn pawn_rank(self) -> i32 {
        self.back_rank() + self.forward()
    }

    fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Pieces a pawn may promote to, strongest first
    pub const PROMOTIONS: [PieceKind; 4] = [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

    /// Material value
    pub fn value(self) -> u32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight | PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 100,
        }
    }

    pub fn can_promote_to(self) -> bool {
        Self::PROMOTIONS.contains(&self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    pub fn glyph(&self) -> &'static str {
        match (self.side, self.kind) {
            (Side::White, PieceKind::Pawn) => "♙",
            (Side::White, PieceKind::Knight) => "♘",
            (Side::White, PieceKind::Bishop) => "♗",
            (Side::White, PieceKind::Rook) => "♖",
            (Side::White, PieceKind::Queen) => "♕",
            (Side::White, PieceKind::King) => "♔",
            (Side::Black, PieceKind::Pawn) => "♟",
            (Side::Black, PieceKind::Knight) => "♞",
            (Side::Black, PieceKind::Bishop) => "♝",
            (Side::Black, PieceKind::Rook) => "♜",
            (Side::Black, PieceKind::Queen) => "♛",
            (Side::Black, PieceKind::King) => "♚",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub row: i32,
    pub col: i32,
}

impl Square {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..8).contains(&self.row) && (0..8).contains(&self.col)
    }

    /// Neighbouring square, if it is on the board
    pub fn offset(&self, dr: i32, dc: i32) -> Option<Square> {
        let sq = Square::new(self.row + dr, self.col + dc);
        sq.is_valid().then_some(sq)
    }

    pub fn is_center(&self) -> bool {
        (3..=4).contains(&self.row) && (3..=4).contains(&self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Castle {
    KingSide,
    QueenSide,
}

impl Castle {
    /// King destination column
    pub fn king_col(self) -> i32 {
        match self {
            Castle::KingSide => 6,
            Castle::QueenSide => 2,
        }
    }

    /// Rook start and destination columns
    pub fn rook_cols(self) -> (i32, i32) {
        match self {
            Castle::KingSide => (7, 5),
            Castle::QueenSide => (0, 3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub castle: Option<Castle>,
}

impl Move {
    pub const fn new(from: Square, to: Square) -> Self {
        Self { from, to, castle: None }
    }
}

/// Has-moved flags gating castling, per side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CastlingRights {
    king_moved: [bool; 2],
    king_rook_moved: [bool; 2],
    queen_rook_moved: [bool; 2],
}

impl CastlingRights {
    pub fn may_castle(&self, side: Side, castle: Castle) -> bool {
        let i = side.index();
        if self.king_moved[i] {
            return false;
        }
        match castle {
            Castle::KingSide => !self.king_rook_moved[i],
            Castle::QueenSide => !self.queen_rook_moved[i],
        }
    }

    /// Record that the piece leaving `from` has moved
    fn touch(&mut self, piece: Piece, from: Square) {
        let i = piece.side.index();
        match piece.kind {
            PieceKind::King => self.king_moved[i] = true,
            PieceKind::Rook if from.row == piece.side.back_rank() => match from.col {
                0 => self.queen_rook_moved[i] = true,
                7 => self.king_rook_moved[i] = true,
                _ => {}
            },
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
    pub rights: CastlingRights,
}

impl Default for Board {
    fn default() -> Self {
        Self::start()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[None; 8]; 8],
            rights: CastlingRights::default(),
        }
    }

    /// Standard starting position
    pub fn start() -> Self {
        use PieceKind::*;
        const BACK: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        let mut board = Self::empty();
        for side in [Side::White, Side::Black] {
            for (col, kind) in BACK.iter().enumerate() {
                let col = col as i32;
                board.set(Square::new(side.back_rank(), col), Some(Piece::new(side, *kind)));
                board.set(Square::new(side.pawn_rank(), col), Some(Piece::new(side, Pawn)));
            }
        }
        board
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        if !sq.is_valid() {
            return None;
        }
        self.cells[sq.row as usize][sq.col as usize]
    }

    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        if sq.is_valid() {
            self.cells[sq.row as usize][sq.col as usize] = piece;
        }
    }

    /// Every occupied square with its piece
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        (0..8).flat_map(move |row| {
            (0..8).filter_map(move |col| {
                let sq = Square::new(row, col);
                self.get(sq).map(|p| (sq, p))
            })
        })
    }

    pub fn king_square(&self, side: Side) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.side == side && p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    pub fn has_king(&self, side: Side) -> bool {
        self.king_square(side).is_some()
    }

    /// Play `mv`, moving the rook as well when castling. Returns the captured
    /// piece. Promotion is left to the caller.
    pub fn apply(&mut self, mv: &Move) -> Option<Piece> {
        let piece = self.get(mv.from)?;
        let captured = self.get(mv.to);
        self.rights.touch(piece, mv.from);
        if let Some(p) = captured {
            // A rook taken on its home square can no longer castle
            self.rights.touch(p, mv.to);
        }
        self.set(mv.to, Some(piece));
        self.set(mv.from, None);
        if let Some(castle) = mv.castle {
            let row = mv.from.row;
            let (from, to) = castle.rook_cols();
            let rook = self.get(Square::new(row, from));
            self.set(Square::new(row, to), rook);
            self.set(Square::new(row, from), None);
        }
        captured
    }

    /// Whether `mv` leaves a pawn on its last rank
    pub fn is_promotion(&self, mv: &Move) -> bool {
        self.get(mv.from)
            .is_some_and(|p| p.kind == PieceKind::Pawn && mv.to.row == p.side.last_rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position() {
        let b = Board::start();
        assert_eq!(b.pieces().count(), 32);
        assert_eq!(b.king_square(Side::White), Some(Square::new(7, 4)));
        assert_eq!(b.king_square(Side::Black), Some(Square::new(0, 4)));
        assert_eq!(b.get(Square::new(0, 3)), Some(Piece::new(Side::Black, PieceKind::Queen)));
        assert_eq!(b.get(Square::new(6, 0)), Some(Piece::new(Side::White, PieceKind::Pawn)));
        assert_eq!(b.get(Square::new(4, 4)), None);
    }

    #[test]
    fn test_apply_returns_capture() {
        let mut b = Board::empty();
        let rook = Piece::new(Side::White, PieceKind::Rook);
        let knight = Piece::new(Side::Black, PieceKind::Knight);
        b.set(Square::new(4, 0), Some(rook));
        b.set(Square::new(4, 6), Some(knight));
        let captured = b.apply(&Move::new(Square::new(4, 0), Square::new(4, 6)));
        assert_eq!(captured, Some(knight));
        assert_eq!(b.get(Square::new(4, 6)), Some(rook));
        assert_eq!(b.get(Square::new(4, 0)), None);
    }

    #[test]
    fn test_rook_move_clears_one_castle() {
        let mut b = Board::start();
        b.set(Square::new(6, 7), None);
        b.apply(&Move::new(Square::new(7, 7), Square::new(5, 7)));
        assert!(!b.rights.may_castle(Side::White, Castle::KingSide));
        assert!(b.rights.may_castle(Side::White, Castle::QueenSide));
        assert!(b.rights.may_castle(Side::Black, Castle::KingSide));
    }

    #[test]
    fn test_square_offsets() {
        assert_eq!(Square::new(0, 0).offset(-1, 0), None);
        assert_eq!(Square::new(0, 0).offset(1, 2), Some(Square::new(1, 2)));
        assert!(Square::new(3, 4).is_center());
        assert!(!Square::new(2, 4).is_center());
    }
}
