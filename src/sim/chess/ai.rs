//! Move scoring and selection for the computer side

use rand::Rng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use super::board::{Board, Move, PieceKind, Side};
use super::movegen::{all_moves, is_attacked};
use crate::tuning::ChessPolicy;

/// Candidate move with its evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredMove {
    pub mv: Move,
    pub value: f32,
}

/// Score `mv` for `side`. Capture value always counts; `positional` adds
/// centre control, development, king safety, pawn structure and pressure on
/// enemy pieces, all measured on the position after the move.
pub fn evaluate(board: &Board, side: Side, mv: &Move, positional: bool) -> f32 {
    let Some(piece) = board.get(mv.from) else {
        return f32::MIN;
    };
    let mut value = board.get(mv.to).map_or(0.0, |p| p.kind.value() as f32 * 10.0);
    if !positional {
        return value;
    }

    if mv.to.is_center() {
        value += 3.0;
    }
    if piece.kind != PieceKind::Pawn && piece.kind != PieceKind::King && mv.from.row == side.back_rank() {
        value += 2.0;
    }
    if piece.kind == PieceKind::King && mv.to.is_center() {
        value -= 5.0;
    }

    let mut after = board.clone();
    after.apply(mv);

    if piece.kind == PieceKind::Pawn {
        // Rows travelled from the starting rank
        let advanced = (mv.to.row - side.pawn_rank()).abs();
        value += advanced as f32 / 2.0;
        if is_passed(&after, side, mv.to.row, mv.to.col) {
            value += 5.0;
        }
    }

    let them = side.opposite();
    for (sq, p) in after.pieces().filter(|(_, p)| p.side == them) {
        if is_attacked(&after, sq, side) {
            value += p.kind.value() as f32 / 2.0;
        }
    }
    value
}

/// No opposing pawn ahead on the same or an adjacent file
fn is_passed(board: &Board, side: Side, row: i32, col: i32) -> bool {
    let them = side.opposite();
    !board.pieces().any(|(sq, p)| {
        p.side == them
            && p.kind == PieceKind::Pawn
            && (sq.col - col).abs() <= 1
            && (sq.row - row) * side.forward() > 0
    })
}

/// Every move for `side`, best first. Equal scores keep generation order.
pub fn rank_moves(board: &Board, side: Side, positional: bool) -> Vec<ScoredMove> {
    let mut scored: Vec<ScoredMove> = all_moves(board, side)
        .into_iter()
        .map(|mv| ScoredMove {
            value: evaluate(board, side, &mv, positional),
            mv,
        })
        .collect();
    scored.sort_by(|a, b| b.value.total_cmp(&a.value));
    scored
}

/// Pick a move for `side` according to `policy`; `None` when it has no moves
pub fn choose_move(board: &Board, side: Side, policy: ChessPolicy, rng: &mut Pcg32) -> Option<Move> {
    match policy {
        ChessPolicy::Random => all_moves(board, side).choose(rng).copied(),
        ChessPolicy::TopThree => {
            let ranked = rank_moves(board, side, false);
            if ranked.len() >= 3 && rng.random_bool(0.7) {
                ranked[..3].choose(rng).map(|s| s.mv)
            } else {
                ranked.choose(rng).map(|s| s.mv)
            }
        }
        ChessPolicy::Weighted => {
            let ranked = rank_moves(board, side, true);
            let roll: f32 = rng.random();
            let pick = if roll < 0.7 {
                0
            } else if roll < 0.9 {
                1
            } else {
                2
            };
            // A missing rank falls back to the best move
            ranked.get(pick).or_else(|| ranked.first()).map(|s| s.mv)
        }
    }
}
