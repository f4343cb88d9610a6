//! Move generation and attack detection
//!
//! Moves are pseudo-legal: a move that leaves the mover's own king attacked
//! is still generated. Castling is the exception and is fully checked.

use super::board::{Board, Castle, Move, PieceKind, Side, Square};

const KNIGHT_STEPS: [(i32, i32); 8] = [(-2, -1), (-2, 1), (-1, -2), (-1, 2), (1, -2), (1, 2), (2, -1), (2, 1)];
const KING_STEPS: [(i32, i32); 8] = [(-1, -1), (-1, 0), (-1, 1), (0, -1), (0, 1), (1, -1), (1, 0), (1, 1)];
const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Moves for the piece standing on `from`
pub fn moves_from(board: &Board, from: Square) -> Vec<Move> {
    let Some(piece) = board.get(from) else {
        return Vec::new();
    };
    let side = piece.side;
    let mut moves = Vec::new();
    // Empty or enemy-occupied
    let open = |sq: Square| board.get(sq).is_none_or(|p| p.side != side);

    match piece.kind {
        PieceKind::Pawn => {
            let fwd = side.forward();
            if let Some(one) = from.offset(fwd, 0).filter(|s| board.get(*s).is_none()) {
                moves.push(Move::new(from, one));
                if from.row == side.pawn_rank()
                    && let Some(two) = from.offset(2 * fwd, 0).filter(|s| board.get(*s).is_none())
                {
                    moves.push(Move::new(from, two));
                }
            }
            for dc in [-1, 1] {
                if let Some(diag) = from.offset(fwd, dc)
                    && board.get(diag).is_some_and(|p| p.side != side)
                {
                    moves.push(Move::new(from, diag));
                }
            }
        }
        PieceKind::Knight => {
            for (dr, dc) in KNIGHT_STEPS {
                if let Some(to) = from.offset(dr, dc).filter(|s| open(*s)) {
                    moves.push(Move::new(from, to));
                }
            }
        }
        PieceKind::Bishop => slide(board, from, &DIAGONAL, &mut moves),
        PieceKind::Rook => slide(board, from, &ORTHOGONAL, &mut moves),
        PieceKind::Queen => {
            slide(board, from, &ORTHOGONAL, &mut moves);
            slide(board, from, &DIAGONAL, &mut moves);
        }
        PieceKind::King => {
            for (dr, dc) in KING_STEPS {
                if let Some(to) = from.offset(dr, dc).filter(|s| open(*s)) {
                    moves.push(Move::new(from, to));
                }
            }
            for castle in [Castle::KingSide, Castle::QueenSide] {
                if can_castle(board, side, castle) {
                    moves.push(Move {
                        from,
                        to: Square::new(side.back_rank(), castle.king_col()),
                        castle: Some(castle),
                    });
                }
            }
        }
    }
    moves
}

/// Extend rays until blocked; an enemy piece ends the ray as a capture
fn slide(board: &Board, from: Square, dirs: &[(i32, i32)], moves: &mut Vec<Move>) {
    let Some(piece) = board.get(from) else {
        return;
    };
    for &(dr, dc) in dirs {
        let mut cur = from;
        while let Some(next) = cur.offset(dr, dc) {
            match board.get(next) {
                None => moves.push(Move::new(from, next)),
                Some(p) => {
                    if p.side != piece.side {
                        moves.push(Move::new(from, next));
                    }
                    break;
                }
            }
            cur = next;
        }
    }
}

/// King and rook unmoved and in place, squares between empty, and the
/// king's start, transit and end squares not attacked
pub fn can_castle(board: &Board, side: Side, castle: Castle) -> bool {
    if !board.rights.may_castle(side, castle) {
        return false;
    }
    let row = side.back_rank();
    let king = board.get(Square::new(row, 4));
    let (rook_col, _) = castle.rook_cols();
    let rook = board.get(Square::new(row, rook_col));
    if king.is_none_or(|p| p.kind != PieceKind::King || p.side != side)
        || rook.is_none_or(|p| p.kind != PieceKind::Rook || p.side != side)
    {
        return false;
    }
    let between: &[i32] = match castle {
        Castle::KingSide => &[5, 6],
        Castle::QueenSide => &[1, 2, 3],
    };
    if between.iter().any(|&c| board.get(Square::new(row, c)).is_some()) {
        return false;
    }
    let path: [i32; 3] = match castle {
        Castle::KingSide => [4, 5, 6],
        Castle::QueenSide => [4, 3, 2],
    };
    !path.iter().any(|&c| is_attacked(board, Square::new(row, c), side.opposite()))
}

/// Every move available to `side`
pub fn all_moves(board: &Board, side: Side) -> Vec<Move> {
    board
        .pieces()
        .filter(|(_, p)| p.side == side)
        .flat_map(|(sq, _)| moves_from(board, sq))
        .collect()
}

/// Whether any piece of `by` attacks `target`
pub fn is_attacked(board: &Board, target: Square, by: Side) -> bool {
    let holds = |sq: Option<Square>, kinds: &[PieceKind]| {
        sq.and_then(|s| board.get(s))
            .is_some_and(|p| p.side == by && kinds.contains(&p.kind))
    };

    // An attacking pawn stands one step behind the target from its own view
    let back = -by.forward();
    if holds(target.offset(back, -1), &[PieceKind::Pawn]) || holds(target.offset(back, 1), &[PieceKind::Pawn]) {
        return true;
    }
    if KNIGHT_STEPS
        .iter()
        .any(|&(dr, dc)| holds(target.offset(dr, dc), &[PieceKind::Knight]))
    {
        return true;
    }
    if KING_STEPS
        .iter()
        .any(|&(dr, dc)| holds(target.offset(dr, dc), &[PieceKind::King]))
    {
        return true;
    }

    let ray_hits = |dirs: &[(i32, i32)], kinds: &[PieceKind]| {
        dirs.iter().any(|&(dr, dc)| {
            let mut cur = target;
            while let Some(next) = cur.offset(dr, dc) {
                if board.get(next).is_some() {
                    return holds(Some(next), kinds);
                }
                cur = next;
            }
            false
        })
    };
    ray_hits(&ORTHOGONAL, &[PieceKind::Rook, PieceKind::Queen])
        || ray_hits(&DIAGONAL, &[PieceKind::Bishop, PieceKind::Queen])
}

pub fn in_check(board: &Board, side: Side) -> bool {
    board
        .king_square(side)
        .is_some_and(|k| is_attacked(board, k, side.opposite()))
}
