//! Sudoku
//!
//! A fresh solution is generated by randomized backtracking, then cells are
//! blanked according to difficulty. Only the correct digit can be placed;
//! anything else counts as a mistake.

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

use super::{Game, GameId, Outcome};
use crate::difficulty::Difficulty;
use crate::platform::input::InputFrame;
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::SudokuTuning;

/// 0 is an empty cell
pub type Grid = [[u8; 9]; 9];

/// Cell edge in pixels
pub const CELL: f32 = 40.0;
/// Time bonus ceiling in seconds
const TIME_BONUS: u32 = 1000;
const MISTAKE_BONUS: u32 = 100;

/// Whether `n` can go at (row, col) without repeating in its row, column or box
pub fn is_valid_placement(grid: &Grid, row: usize, col: usize, n: u8) -> bool {
    if (0..9).any(|i| grid[row][i] == n || grid[i][col] == n) {
        return false;
    }
    let (br, bc) = (row / 3 * 3, col / 3 * 3);
    !(br..br + 3).any(|r| (bc..bc + 3).any(|c| grid[r][c] == n))
}

fn find_empty(grid: &Grid) -> Option<(usize, usize)> {
    (0..81).map(|i| (i / 9, i % 9)).find(|&(r, c)| grid[r][c] == 0)
}

/// Fill every empty cell by backtracking, trying candidates in random order
pub fn solve(grid: &mut Grid, rng: &mut Pcg32) -> bool {
    let Some((row, col)) = find_empty(grid) else {
        return true;
    };
    let mut digits: [u8; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    digits.shuffle(rng);
    for n in digits {
        if is_valid_placement(grid, row, col, n) {
            grid[row][col] = n;
            if solve(grid, rng) {
                return true;
            }
            grid[row][col] = 0;
        }
    }
    false
}

/// Blank `count` distinct cells
fn remove_cells(grid: &mut Grid, count: usize, rng: &mut Pcg32) {
    let mut order: Vec<usize> = (0..81).collect();
    order.shuffle(rng);
    for i in order.into_iter().take(count) {
        grid[i / 9][i % 9] = 0;
    }
}

#[derive(Debug, Clone)]
pub struct SudokuGame {
    difficulty: Difficulty,
    /// Applied on the next `new_game`
    next_difficulty: Difficulty,
    tuning: SudokuTuning,
    rng: Pcg32,
    pub solution: Grid,
    /// Cells filled at the start, never editable
    pub givens: Grid,
    pub cells: Grid,
    pub selected: Option<(usize, usize)>,
    pub mistakes: u32,
    elapsed: f32,
    outcome: Option<Outcome>,
}

impl SudokuGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            next_difficulty: difficulty,
            tuning: SudokuTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            solution: [[0; 9]; 9],
            givens: [[0; 9]; 9],
            cells: [[0; 9]; 9],
            selected: None,
            mistakes: 0,
            elapsed: 0.0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    /// Store a difficulty for the next puzzle; the current board is kept
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.next_difficulty = difficulty;
    }

    /// Generate a new puzzle at the stored difficulty
    pub fn new_game(&mut self) {
        self.difficulty = self.next_difficulty;
        self.tuning = SudokuTuning::new(self.difficulty);

        let mut solution = [[0; 9]; 9];
        if !solve(&mut solution, &mut self.rng) {
            // An empty grid always has a solution
            log::warn!("Sudoku generator failed");
        }
        let mut puzzle = solution;
        remove_cells(&mut puzzle, self.tuning.cells_removed, &mut self.rng);

        self.solution = solution;
        self.givens = puzzle;
        self.cells = puzzle;
        self.selected = None;
        self.mistakes = 0;
        self.elapsed = 0.0;
        self.outcome = None;
        log::info!(
            "Sudoku started on {} with {} blanks",
            self.difficulty,
            self.blank_count()
        );
    }

    pub fn blank_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&n| n == 0).count()
    }

    pub fn is_given(&self, row: usize, col: usize) -> bool {
        self.givens[row][col] != 0
    }

    /// Whole seconds since the puzzle started
    pub fn seconds(&self) -> u32 {
        self.elapsed as u32
    }

    /// Select an editable cell; givens and out-of-range cells are refused
    pub fn select(&mut self, row: usize, col: usize) -> bool {
        if self.outcome.is_some() || row >= 9 || col >= 9 || self.is_given(row, col) {
            return false;
        }
        self.selected = Some((row, col));
        true
    }

    /// Place `n` in the selected cell. Returns whether it was placed.
    pub fn enter(&mut self, n: u8) -> bool {
        if self.outcome.is_some() || !(1..=9).contains(&n) {
            return false;
        }
        let Some((row, col)) = self.selected else {
            return false;
        };
        if self.solution[row][col] == n {
            self.cells[row][col] = n;
            if self.cells == self.solution {
                log::info!("Sudoku solved in {}s with {} mistakes", self.seconds(), self.mistakes);
                self.outcome = Some(Outcome::WON);
            }
            return true;
        }
        self.mistakes += 1;
        log::debug!("Sudoku mistake {} at ({}, {})", self.mistakes, row, col);
        if self.mistakes >= self.tuning.max_mistakes {
            self.outcome = Some(Outcome::LOST);
        }
        false
    }

    /// Clear the selected cell
    pub fn erase(&mut self) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        match self.selected {
            Some((row, col)) if !self.is_given(row, col) && self.cells[row][col] != 0 => {
                self.cells[row][col] = 0;
                true
            }
            _ => false,
        }
    }

    fn cell_at(pos: Vec2) -> Option<(usize, usize)> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let (row, col) = ((pos.y / CELL) as usize, (pos.x / CELL) as usize);
        (row < 9 && col < 9).then_some((row, col))
    }
}

impl Game for SudokuGame {
    fn id(&self) -> GameId {
        GameId::Sudoku
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.elapsed += dt;

        if let Some((row, col)) = input.click.and_then(Self::cell_at) {
            self.select(row, col);
        }
        if let Some(n) = input.digit {
            self.enter(n);
        } else if input.erase {
            self.erase();
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        surface.clear(Color(0xf8fafc));

        if let Some((row, col)) = self.selected {
            surface.fill_rect(col as f32 * CELL, row as f32 * CELL, CELL, CELL, Color(0xbfdbfe));
        }

        for i in 0..=9 {
            let (thickness, color) = if i % 3 == 0 { (2.0, Color(0x64748b)) } else { (1.0, Color(0xcbd5e1)) };
            let at = i as f32 * CELL - thickness / 2.0;
            surface.fill_rect(0.0, at, w, thickness, color);
            surface.fill_rect(at, 0.0, thickness, h, color);
        }

        for (row, line) in self.cells.iter().enumerate() {
            for (col, &n) in line.iter().enumerate() {
                if n == 0 {
                    continue;
                }
                let color = if self.is_given(row, col) { Color(0x1e293b) } else { Color(0x3b82f6) };
                let pos = Vec2::new((col as f32 + 0.5) * CELL, (row as f32 + 0.5) * CELL + 8.0);
                surface.fill_text(&n.to_string(), pos, CELL * 0.6, TextAlign::Center, color);
            }
        }

        let secs = self.seconds();
        let clock = format!("Time {}:{:02}", secs / 60, secs % 60);
        match self.outcome {
            Some(o) if o.won => draw_banner(surface, "Solved!", Some(&clock)),
            Some(_) => draw_banner(surface, "GAME OVER", Some("Too many mistakes")),
            None => {}
        }
    }

    fn score(&self) -> u64 {
        match self.outcome {
            Some(o) if o.won => {
                let time = TIME_BONUS.saturating_sub(self.seconds());
                let spare = self.tuning.max_mistakes.saturating_sub(self.mistakes);
                (time + spare * MISTAKE_BONUS) as u64
            }
            _ => 0,
        }
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn reset(&mut self, difficulty: Difficulty) {
        self.set_difficulty(difficulty);
        self.new_game();
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("time".into(), Value::from(self.seconds()));
        m.insert("mistakes".into(), Value::from(self.mistakes));
        m
    }
}
