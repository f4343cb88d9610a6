//! Chess against a computer opponent or a second player
//!
//! White is always driven by clicks. Black is the AI while `vs_ai` is set,
//! replying a short delay after white moves. Moves are pseudo-legal and the
//! game ends when a king is captured.

pub mod ai;
pub mod board;
pub mod movegen;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

pub use board::{Board, Castle, Move, Piece, PieceKind, Side, Square};

use super::{Game, GameId, Outcome};
use crate::difficulty::Difficulty;
use crate::platform::input::{Button, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::ChessTuning;

/// Square edge in pixels
pub const SQUARE: f32 = 40.0;

const LIGHT: Color = Color(0xf0d9b5);
const DARK: Color = Color(0xb58863);
const SELECTED: Color = Color(0xf6f669);
const LAST_MOVE: Color = Color(0xcdd26a);
const TARGET: Color = Color(0x646f40);

/// A human pawn reached the last rank and waits for a piece choice
#[derive(Debug, Clone)]
pub struct PendingPromotion {
    /// Position before the pawn moved, restored on cancel
    before: Board,
    pub from: Square,
    pub square: Square,
    captured: Option<Piece>,
}

#[derive(Debug, Clone)]
pub struct ChessGame {
    difficulty: Difficulty,
    tuning: ChessTuning,
    rng: Pcg32,
    pub board: Board,
    pub turn: Side,
    pub selected: Option<Square>,
    /// Moves of the selected piece
    pub targets: Vec<Move>,
    pub pending: Option<PendingPromotion>,
    pub vs_ai: bool,
    /// Countdown to the AI reply
    ai_timer: Option<f32>,
    /// Material captured by white and black
    pub captured: [u32; 2],
    pub moves_played: u32,
    pub last_move: Option<Move>,
    outcome: Option<Outcome>,
}

impl ChessGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: ChessTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            board: Board::start(),
            turn: Side::White,
            selected: None,
            targets: Vec::new(),
            pending: None,
            vs_ai: true,
            ai_timer: None,
            captured: [0; 2],
            moves_played: 0,
            last_move: None,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    /// Switch between playing the AI and two-player mode
    pub fn set_vs_ai(&mut self, vs_ai: bool) {
        self.vs_ai = vs_ai;
        if vs_ai && self.turn == Side::Black && self.outcome.is_none() {
            self.ai_timer = Some(self.tuning.ai_delay);
        } else if !vs_ai {
            self.ai_timer = None;
        }
    }

    fn is_ai_turn(&self) -> bool {
        self.vs_ai && self.turn == Side::Black
    }

    /// Square under a canvas position
    pub fn square_at(pos: Vec2) -> Option<Square> {
        let sq = Square::new((pos.y / SQUARE).floor() as i32, (pos.x / SQUARE).floor() as i32);
        sq.is_valid().then_some(sq)
    }

    /// Human click on `sq`: play a listed target, select an own piece, or
    /// drop the selection. Returns whether a move was played.
    pub fn click_square(&mut self, sq: Square) -> bool {
        if self.outcome.is_some() || self.pending.is_some() || self.is_ai_turn() {
            return false;
        }
        if let Some(mv) = self.targets.iter().find(|m| m.to == sq).copied() {
            self.play_human(mv);
            return true;
        }
        match self.board.get(sq) {
            Some(p) if p.side == self.turn => {
                self.selected = Some(sq);
                self.targets = movegen::moves_from(&self.board, sq);
            }
            _ => {
                self.selected = None;
                self.targets.clear();
            }
        }
        false
    }

    fn play_human(&mut self, mv: Move) {
        self.selected = None;
        self.targets.clear();
        if self.board.is_promotion(&mv) {
            let before = self.board.clone();
            let captured = self.board.apply(&mv);
            self.pending = Some(PendingPromotion {
                before,
                from: mv.from,
                square: mv.to,
                captured,
            });
            self.last_move = Some(mv);
            log::debug!("Promotion pending on {:?}", mv.to);
            return;
        }
        let captured = self.board.apply(&mv);
        self.finish_move(mv, captured);
    }

    /// Complete a pending promotion. Only queen, rook, bishop or knight are
    /// accepted.
    pub fn choose_promotion(&mut self, kind: PieceKind) -> bool {
        if !kind.can_promote_to() {
            return false;
        }
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.board.set(pending.square, Some(Piece::new(self.turn, kind)));
        let mv = Move::new(pending.from, pending.square);
        self.finish_move(mv, pending.captured);
        true
    }

    /// Take back the promoting pawn move and keep the pawn selected
    pub fn cancel_promotion(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.board = pending.before;
        self.last_move = None;
        self.selected = Some(pending.from);
        self.targets = movegen::moves_from(&self.board, pending.from);
        true
    }

    fn ai_move(&mut self) {
        let side = self.turn;
        let Some(mv) = ai::choose_move(&self.board, side, self.tuning.policy, &mut self.rng) else {
            log::info!("Chess AI has no moves, {} wins", side.opposite().as_str());
            self.outcome = Some(Outcome { won: side == Side::Black });
            return;
        };
        let promotes = self.board.is_promotion(&mv);
        let captured = self.board.apply(&mv);
        if promotes {
            self.board.set(mv.to, Some(Piece::new(side, PieceKind::Queen)));
        }
        self.finish_move(mv, captured);
    }

    fn finish_move(&mut self, mv: Move, captured: Option<Piece>) {
        let mover = self.turn;
        if let Some(p) = captured {
            self.captured[side_slot(mover)] += p.kind.value();
        }
        self.moves_played += 1;
        self.last_move = Some(mv);

        if !self.board.has_king(Side::White) {
            self.outcome = Some(Outcome::LOST);
        } else if !self.board.has_king(Side::Black) {
            self.outcome = Some(Outcome::WON);
        }
        if let Some(o) = self.outcome {
            log::info!("Chess over after {} moves, white won: {}", self.moves_played, o.won);
            return;
        }

        self.turn = mover.opposite();
        if self.is_ai_turn() {
            self.ai_timer = Some(self.tuning.ai_delay);
        }
    }

    /// Whether the side to move has its king attacked
    pub fn in_check(&self) -> bool {
        movegen::in_check(&self.board, self.turn)
    }
}

fn side_slot(side: Side) -> usize {
    match side {
        Side::White => 0,
        Side::Black => 1,
    }
}

impl Game for ChessGame {
    fn id(&self) -> GameId {
        GameId::Chess
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }

        if self.pending.is_some() {
            if input.was_pressed(Button::B) {
                self.cancel_promotion();
            } else if let Some(kind) = input
                .digit
                .and_then(|d| PieceKind::PROMOTIONS.get((d as usize).wrapping_sub(1)).copied())
            {
                self.choose_promotion(kind);
            }
            return;
        }

        if let Some(t) = self.ai_timer.as_mut() {
            *t -= dt;
            if *t <= 0.0 {
                self.ai_timer = None;
                self.ai_move();
            }
            return;
        }

        if let Some(sq) = input.click.and_then(Self::square_at) {
            self.click_square(sq);
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color::BLACK);
        let last = self.last_move.filter(|_| self.pending.is_none());

        for row in 0..8 {
            for col in 0..8 {
                let sq = Square::new(row, col);
                let mut color = if (row + col) % 2 == 0 { LIGHT } else { DARK };
                if last.is_some_and(|m| m.from == sq || m.to == sq) {
                    color = LAST_MOVE;
                }
                if self.selected == Some(sq) {
                    color = SELECTED;
                }
                let (x, y) = (col as f32 * SQUARE, row as f32 * SQUARE);
                surface.fill_rect(x, y, SQUARE, SQUARE, color);
            }
        }

        for mv in &self.targets {
            let c = Vec2::new(
                (mv.to.col as f32 + 0.5) * SQUARE,
                (mv.to.row as f32 + 0.5) * SQUARE,
            );
            let radius = if self.board.get(mv.to).is_some() { SQUARE * 0.45 } else { SQUARE * 0.15 };
            surface.fill_circle(c, radius, TARGET);
        }

        for (sq, piece) in self.board.pieces() {
            let c = Vec2::new((sq.col as f32 + 0.5) * SQUARE, (sq.row as f32 + 0.5) * SQUARE + 10.0);
            surface.fill_text(piece.glyph(), c, 30.0, TextAlign::Center, Color::BLACK);
        }

        if let Some(o) = self.outcome {
            let title = if o.won { "White wins!" } else { "Black wins!" };
            draw_banner(surface, title, Some(&format!("Moves: {}", self.moves_played)));
        } else if self.pending.is_some() {
            draw_banner(surface, "Promote", Some("1 Queen  2 Rook  3 Bishop  4 Knight  B cancel"));
        } else if self.in_check() {
            surface.fill_text("Check!", Vec2::new(160.0, 20.0), 16.0, TextAlign::Center, Color::RED);
        }
    }

    fn score(&self) -> u64 {
        self.captured[side_slot(Side::White)] as u64
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn reset(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.tuning = ChessTuning::new(difficulty);
        self.board = Board::start();
        self.turn = Side::White;
        self.selected = None;
        self.targets.clear();
        self.pending = None;
        self.ai_timer = None;
        self.captured = [0; 2];
        self.moves_played = 0;
        self.last_move = None;
        self.outcome = None;
        log::info!("Chess started on {} ({:?} AI)", difficulty, self.tuning.policy);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("moves".into(), Value::from(self.moves_played));
        m.insert("captured_by_black".into(), Value::from(self.captured[side_slot(Side::Black)]));
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RecordingSurface;

    const DT: f32 = 1.0 / 60.0;

    fn click(sq: Square) -> InputFrame {
        let pos = Vec2::new((sq.col as f32 + 0.5) * SQUARE, (sq.row as f32 + 0.5) * SQUARE);
        InputFrame::default().with_click(pos)
    }

    fn with_board(board: Board) -> ChessGame {
        let mut g = ChessGame::new(Difficulty::Normal, 1);
        g.board = board;
        g
    }

    fn kings() -> Board {
        let mut b = Board::empty();
        b.set(Square::new(7, 4), Some(Piece::new(Side::White, PieceKind::King)));
        b.set(Square::new(0, 4), Some(Piece::new(Side::Black, PieceKind::King)));
        b
    }

    #[test]
    fn test_select_then_move() {
        let mut g = ChessGame::new(Difficulty::Easy, 1);
        g.update(&click(Square::new(6, 4)), DT);
        assert_eq!(g.selected, Some(Square::new(6, 4)));
        assert_eq!(g.targets.len(), 2);

        g.update(&click(Square::new(4, 4)), DT);
        assert_eq!(g.board.get(Square::new(4, 4)).map(|p| p.kind), Some(PieceKind::Pawn));
        assert_eq!(g.turn, Side::Black);
        assert_eq!(g.selected, None);
        assert_eq!(g.moves_played, 1);
    }

    #[test]
    fn test_clicking_elsewhere_clears_selection() {
        let mut g = ChessGame::new(Difficulty::Easy, 1);
        assert!(!g.click_square(Square::new(6, 0)));
        assert!(g.selected.is_some());
        // Enemy piece, not a target
        assert!(!g.click_square(Square::new(1, 0)));
        assert_eq!(g.selected, None);
        assert!(g.targets.is_empty());
    }

    #[test]
    fn test_ai_replies_after_delay() {
        let mut g = ChessGame::new(Difficulty::Hard, 5);
        g.click_square(Square::new(6, 4));
        g.click_square(Square::new(4, 4));
        for _ in 0..20 {
            g.update(&InputFrame::default(), DT);
        }
        assert_eq!(g.turn, Side::Black);
        for _ in 0..20 {
            g.update(&InputFrame::default(), DT);
        }
        assert_eq!(g.turn, Side::White);
        assert_eq!(g.moves_played, 2);
    }

    #[test]
    fn test_clicks_ignored_on_ai_turn() {
        let mut g = ChessGame::new(Difficulty::Normal, 2);
        g.click_square(Square::new(6, 4));
        g.click_square(Square::new(4, 4));
        let before = g.board.clone();
        assert!(!g.click_square(Square::new(1, 4)));
        assert_eq!(g.selected, None);
        assert_eq!(g.board, before);
    }

    #[test]
    fn test_two_player_mode() {
        let mut g = ChessGame::new(Difficulty::Normal, 2);
        g.set_vs_ai(false);
        g.click_square(Square::new(6, 4));
        g.click_square(Square::new(4, 4));
        g.click_square(Square::new(1, 4));
        assert!(g.click_square(Square::new(3, 4)));
        assert_eq!(g.turn, Side::White);
    }

    #[test]
    fn test_promotion_waits_for_choice() {
        let mut b = kings();
        b.set(Square::new(1, 0), Some(Piece::new(Side::White, PieceKind::Pawn)));
        let mut g = with_board(b);
        g.click_square(Square::new(1, 0));
        assert!(g.click_square(Square::new(0, 0)));
        assert!(g.pending.is_some());
        assert_eq!(g.turn, Side::White);

        // Turn does not advance while pending
        for _ in 0..60 {
            g.update(&InputFrame::default(), DT);
        }
        assert_eq!(g.turn, Side::White);

        assert!(!g.choose_promotion(PieceKind::King));
        assert!(!g.choose_promotion(PieceKind::Pawn));
        assert!(g.choose_promotion(PieceKind::Knight));
        assert_eq!(g.board.get(Square::new(0, 0)), Some(Piece::new(Side::White, PieceKind::Knight)));
        assert_eq!(g.turn, Side::Black);
    }

    #[test]
    fn test_promotion_by_digit() {
        let mut b = kings();
        b.set(Square::new(1, 7), Some(Piece::new(Side::White, PieceKind::Pawn)));
        let mut g = with_board(b);
        g.click_square(Square::new(1, 7));
        g.click_square(Square::new(0, 7));
        g.update(&InputFrame::default().with_digit(2), DT);
        assert_eq!(g.board.get(Square::new(0, 7)).map(|p| p.kind), Some(PieceKind::Rook));
        assert!(g.pending.is_none());
    }

    #[test]
    fn test_cancel_promotion_restores_position() {
        let mut b = kings();
        b.set(Square::new(1, 0), Some(Piece::new(Side::White, PieceKind::Pawn)));
        b.set(Square::new(0, 1), Some(Piece::new(Side::Black, PieceKind::Rook)));
        let mut g = with_board(b.clone());
        g.click_square(Square::new(1, 0));
        g.click_square(Square::new(0, 1));
        assert!(g.pending.is_some());

        g.update(&InputFrame::default().press(Button::B), DT);
        assert!(g.pending.is_none());
        assert_eq!(g.board, b);
        assert_eq!(g.selected, Some(Square::new(1, 0)));
        assert_eq!(g.captured, [0, 0]);
        assert_eq!(g.turn, Side::White);
    }

    #[test]
    fn test_ai_promotes_to_queen() {
        let mut b = Board::empty();
        b.set(Square::new(7, 4), Some(Piece::new(Side::White, PieceKind::King)));
        b.set(Square::new(6, 0), Some(Piece::new(Side::Black, PieceKind::Pawn)));
        let mut g = with_board(b);
        g.turn = Side::Black;
        g.ai_move();
        assert_eq!(g.board.get(Square::new(7, 0)), Some(Piece::new(Side::Black, PieceKind::Queen)));
    }

    #[test]
    fn test_capturing_the_king_wins() {
        let mut b = Board::empty();
        b.set(Square::new(7, 0), Some(Piece::new(Side::White, PieceKind::King)));
        b.set(Square::new(0, 4), Some(Piece::new(Side::Black, PieceKind::King)));
        b.set(Square::new(4, 4), Some(Piece::new(Side::White, PieceKind::Rook)));
        let mut g = with_board(b);
        g.click_square(Square::new(4, 4));
        g.click_square(Square::new(0, 4));
        assert_eq!(g.outcome(), Some(Outcome::WON));
        assert_eq!(g.score(), 100);
        assert!(!g.click_square(Square::new(7, 0)));
    }

    #[test]
    fn test_ai_without_moves_loses() {
        // Black king walled in by its own blocked pawns
        let mut b = Board::empty();
        b.set(Square::new(4, 4), Some(Piece::new(Side::White, PieceKind::King)));
        b.set(Square::new(0, 0), Some(Piece::new(Side::Black, PieceKind::King)));
        b.set(Square::new(0, 1), Some(Piece::new(Side::Black, PieceKind::Pawn)));
        for row in 1..8 {
            for col in 0..2 {
                b.set(Square::new(row, col), Some(Piece::new(Side::Black, PieceKind::Pawn)));
            }
        }
        assert!(movegen::all_moves(&b, Side::Black).is_empty());
        let mut g = with_board(b);
        g.turn = Side::Black;
        g.ai_move();
        assert_eq!(g.outcome(), Some(Outcome::WON));
    }

    #[test]
    fn test_render_board_and_prompts() {
        let mut g = ChessGame::new(Difficulty::Normal, 1);
        let mut s = RecordingSurface::new(320.0, 320.0);
        g.render(&mut s);
        assert!(s.has_text("♔"));
        assert!(s.has_text("♚"));
        assert!(!s.has_text("Check!"));

        let mut b = kings();
        b.set(Square::new(1, 0), Some(Piece::new(Side::White, PieceKind::Pawn)));
        b.set(Square::new(3, 4), Some(Piece::new(Side::Black, PieceKind::Rook)));
        g.board = b;
        g.render(&mut s);
        assert!(s.has_text("Check!"));

        g.click_square(Square::new(1, 0));
        g.click_square(Square::new(0, 0));
        g.render(&mut s);
        assert!(s.has_text("Promote"));
    }

    #[test]
    fn test_reset_keeps_mode() {
        let mut g = ChessGame::new(Difficulty::Normal, 1);
        g.set_vs_ai(false);
        g.click_square(Square::new(6, 4));
        g.click_square(Square::new(4, 4));
        g.reset(Difficulty::Hard);
        assert!(!g.vs_ai);
        assert_eq!(g.turn, Side::White);
        assert_eq!(g.board, Board::start());
        assert_eq!(g.tuning.policy, crate::tuning::ChessPolicy::Weighted);
    }
}
