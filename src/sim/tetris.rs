//! Tetris
//!
//! 10x20 well, seven tetrominoes, gravity on a difficulty-scaled timer.
//! Horizontal moves and soft drop auto-repeat while held.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

use super::{Game, GameId, Outcome, weighted_points};
use crate::difficulty::Difficulty;
use crate::platform::input::{Button, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::TetrisTuning;

pub const COLS: usize = 10;
pub const ROWS: usize = 20;
/// Pixels per cell
pub const BLOCK: f32 = 20.0;

/// Delay before a held move starts repeating (seconds)
const REPEAT_DELAY: f32 = 0.15;
/// Interval between repeated moves (seconds)
const REPEAT_RATE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Spawn orientation, rows top to bottom
    fn template(&self) -> &'static [&'static [u8]] {
        match self {
            PieceKind::I => &[&[1, 1, 1, 1]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::T => &[&[1, 1, 1], &[0, 1, 0]],
            PieceKind::L => &[&[1, 1, 1], &[1, 0, 0]],
            PieceKind::J => &[&[1, 1, 1], &[0, 0, 1]],
            PieceKind::S => &[&[0, 1, 1], &[1, 1, 0]],
            PieceKind::Z => &[&[1, 1, 0], &[0, 1, 1]],
        }
    }

    pub fn color(&self) -> Color {
        match self {
            PieceKind::I => Color(0x00ffff),
            PieceKind::O => Color(0xffff00),
            PieceKind::T => Color(0x800080),
            PieceKind::L => Color(0xffa500),
            PieceKind::J => Color(0x0000ff),
            PieceKind::S => Color(0x00ff00),
            PieceKind::Z => Color(0xff0000),
        }
    }
}

/// One board cell: empty or the kind of piece that locked there
pub type Cell = Option<PieceKind>;

/// The falling piece
#[derive(Debug, Clone, PartialEq)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Vec<Vec<bool>>,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    pub fn spawn(kind: PieceKind) -> Self {
        let shape: Vec<Vec<bool>> = kind
            .template()
            .iter()
            .map(|row| row.iter().map(|&c| c != 0).collect())
            .collect();
        let width = shape[0].len() as i32;
        Self {
            kind,
            shape,
            x: (COLS as i32 / 2) - width / 2,
            y: 0,
        }
    }

    /// Shape turned 90° clockwise
    pub fn rotated_shape(&self) -> Vec<Vec<bool>> {
        let rows = self.shape.len();
        let cols = self.shape[0].len();
        (0..cols)
            .map(|i| (0..rows).rev().map(|j| self.shape[j][i]).collect())
            .collect()
    }

    /// Occupied board coordinates
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(dx, _)| (self.x + dx as i32, self.y + dy as i32))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Repeat {
    button: Button,
    timer: f32,
}

#[derive(Debug, Clone)]
pub struct TetrisGame {
    difficulty: Difficulty,
    tuning: TetrisTuning,
    rng: Pcg32,
    pub board: [[Cell; COLS]; ROWS],
    pub piece: Piece,
    pub score: u64,
    pub lines: u32,
    drop_timer: f32,
    repeat: Option<Repeat>,
    outcome: Option<Outcome>,
}

impl TetrisGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: TetrisTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            board: [[None; COLS]; ROWS],
            piece: Piece::spawn(PieceKind::O),
            score: 0,
            lines: 0,
            drop_timer: 0.0,
            repeat: None,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    fn fits(&self, shape: &[Vec<bool>], x: i32, y: i32) -> bool {
        for (dy, row) in shape.iter().enumerate() {
            for (dx, &filled) in row.iter().enumerate() {
                if !filled {
                    continue;
                }
                let bx = x + dx as i32;
                let by = y + dy as i32;
                if bx < 0 || bx >= COLS as i32 || by >= ROWS as i32 {
                    return false;
                }
                if by >= 0 && self.board[by as usize][bx as usize].is_some() {
                    return false;
                }
            }
        }
        true
    }

    pub fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        if self.fits(&self.piece.shape, self.piece.x + dx, self.piece.y + dy) {
            self.piece.x += dx;
            self.piece.y += dy;
            true
        } else {
            false
        }
    }

    /// Rotate clockwise in place; reverted if the result does not fit
    pub fn rotate(&mut self) -> bool {
        let rotated = self.piece.rotated_shape();
        if self.fits(&rotated, self.piece.x, self.piece.y) {
            self.piece.shape = rotated;
            true
        } else {
            false
        }
    }

    /// Gravity step: fall one row or lock
    pub fn soft_drop(&mut self) {
        if !self.try_move(0, 1) {
            self.lock_piece();
        }
        self.drop_timer = 0.0;
    }

    pub fn hard_drop(&mut self) {
        while self.try_move(0, 1) {}
        self.lock_piece();
        self.drop_timer = 0.0;
    }

    fn lock_piece(&mut self) {
        let kind = self.piece.kind;
        let cells: Vec<(i32, i32)> = self.piece.cells().collect();
        for (x, y) in cells {
            if y >= 0 {
                self.board[y as usize][x as usize] = Some(kind);
            }
        }

        let cleared = self.clear_lines();
        if cleared > 0 {
            let base = TetrisTuning::LINE_POINTS[cleared.min(4)];
            self.score += weighted_points(base, self.tuning.score_multiplier);
            self.lines += cleared as u32;
            log::debug!("Cleared {} lines, score {}", cleared, self.score);
        }
        self.spawn_piece();
    }

    /// Remove full rows, shifting everything above down. Returns rows removed.
    fn clear_lines(&mut self) -> usize {
        let kept: Vec<[Cell; COLS]> = self
            .board
            .iter()
            .filter(|row| row.iter().any(Option::is_none))
            .copied()
            .collect();
        let cleared = ROWS - kept.len();
        if cleared > 0 {
            let mut board = [[None; COLS]; ROWS];
            board[cleared..].copy_from_slice(&kept);
            self.board = board;
        }
        cleared
    }

    fn spawn_piece(&mut self) {
        let kind = PieceKind::ALL[self.rng.random_range(0..PieceKind::ALL.len())];
        self.piece = Piece::spawn(kind);
        if !self.fits(&self.piece.shape, self.piece.x, self.piece.y) {
            log::info!("Tetris topped out with score {}", self.score);
            self.outcome = Some(Outcome::LOST);
        }
    }

    fn apply(&mut self, button: Button) {
        match button {
            Button::Left => {
                self.try_move(-1, 0);
            }
            Button::Right => {
                self.try_move(1, 0);
            }
            Button::Down => self.soft_drop(),
            _ => {}
        }
    }

    fn handle_input(&mut self, input: &InputFrame, dt: f32) {
        if input.was_pressed(Button::Up) || input.click.is_some() {
            self.rotate();
        }
        if input.was_pressed(Button::A) {
            self.hard_drop();
            self.repeat = None;
            return;
        }

        for button in [Button::Left, Button::Right, Button::Down] {
            if input.was_pressed(button) {
                self.apply(button);
                self.repeat = Some(Repeat {
                    button,
                    timer: -REPEAT_DELAY,
                });
            }
        }

        if let Some(mut rep) = self.repeat {
            if !input.is_held(rep.button) {
                self.repeat = None;
                return;
            }
            rep.timer += dt;
            while rep.timer >= REPEAT_RATE {
                rep.timer -= REPEAT_RATE;
                self.apply(rep.button);
            }
            self.repeat = Some(rep);
        }
    }

    fn draw_cell(surface: &mut dyn Surface, x: i32, y: i32, color: Color) {
        surface.fill_rect(x as f32 * BLOCK, y as f32 * BLOCK, BLOCK, BLOCK, Color(0x0f380f));
        surface.fill_rect(
            x as f32 * BLOCK + 1.0,
            y as f32 * BLOCK + 1.0,
            BLOCK - 2.0,
            BLOCK - 2.0,
            color,
        );
    }
}

impl Game for TetrisGame {
    fn id(&self) -> GameId {
        GameId::Tetris
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.handle_input(input, dt);
        if self.outcome.is_some() {
            return;
        }
        self.drop_timer += dt;
        if self.drop_timer > self.tuning.drop_interval {
            self.soft_drop();
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color(0x9bbc0f));
        for (y, row) in self.board.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(kind) = cell {
                    Self::draw_cell(surface, x as i32, y as i32, kind.color());
                }
            }
        }
        if self.outcome.is_none() {
            for (x, y) in self.piece.cells() {
                Self::draw_cell(surface, x, y, self.piece.kind.color());
            }
        }
        surface.fill_text(
            &format!("{}", self.score),
            Vec2::new(4.0, 14.0),
            12.0,
            TextAlign::Left,
            Color::BLACK,
        );
        if self.outcome.is_some() {
            draw_banner(surface, "GAME OVER", Some(&format!("Lines: {}", self.lines)));
        }
    }

    fn score(&self) -> u64 {
        self.score
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn reset(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.tuning = TetrisTuning::new(difficulty);
        self.board = [[None; COLS]; ROWS];
        self.score = 0;
        self.lines = 0;
        self.drop_timer = 0.0;
        self.repeat = None;
        self.outcome = None;
        self.spawn_piece();
        log::info!("Tetris started on {}", difficulty);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("lines".into(), Value::from(self.lines));
        m
    }
}
