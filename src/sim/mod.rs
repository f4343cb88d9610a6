//! Deterministic simulation module
//!
//! All gameplay logic lives here. Every game follows the same rules:
//! - Fixed timestep only (the driver feeds `SIM_DT`)
//! - Seeded RNG only (`Pcg32` owned by the game)
//! - Update never fails: invalid input is ignored
//! - Render reads state, never mutates it

pub mod asteroids;
pub mod breakout;
pub mod chess;
pub mod collision;
pub mod doom;
pub mod invaders;
pub mod pacman;
pub mod pong;
pub mod snake;
pub mod sudoku;
pub mod tetris;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::difficulty::Difficulty;
use crate::platform::input::InputFrame;
use crate::renderer::Surface;

pub use asteroids::AsteroidsGame;
pub use breakout::BreakoutGame;
pub use chess::ChessGame;
pub use doom::DoomGame;
pub use invaders::InvadersGame;
pub use pacman::PacmanGame;
pub use pong::PongGame;
pub use snake::SnakeGame;
pub use sudoku::SudokuGame;
pub use tetris::TetrisGame;

/// Stable identifier of each game, also its persistence key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameId {
    Snake,
    Tetris,
    Pong,
    Breakout,
    Asteroids,
    Pacman,
    SpaceInvaders,
    Doom,
    Chess,
    Sudoku,
}

impl GameId {
    pub const ALL: [GameId; 10] = [
        GameId::Snake,
        GameId::Tetris,
        GameId::Pong,
        GameId::Breakout,
        GameId::Asteroids,
        GameId::Pacman,
        GameId::SpaceInvaders,
        GameId::Doom,
        GameId::Chess,
        GameId::Sudoku,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameId::Snake => "snake",
            GameId::Tetris => "tetris",
            GameId::Pong => "pong",
            GameId::Breakout => "breakout",
            GameId::Asteroids => "asteroids",
            GameId::Pacman => "pacman",
            GameId::SpaceInvaders => "space-invaders",
            GameId::Doom => "doom",
            GameId::Chess => "chess",
            GameId::Sudoku => "sudoku",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        GameId::ALL.into_iter().find(|g| g.as_str() == s)
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameId::Snake => "Snake",
            GameId::Tetris => "Tetris",
            GameId::Pong => "Pong",
            GameId::Breakout => "Breakout",
            GameId::Asteroids => "Asteroids",
            GameId::Pacman => "Pac-Man",
            GameId::SpaceInvaders => "Space Invaders",
            GameId::Doom => "Doom",
            GameId::Chess => "Chess",
            GameId::Sudoku => "Sudoku",
        }
    }

    /// Play surface size in pixels
    pub fn canvas_size(&self) -> (f32, f32) {
        match self {
            GameId::Snake => (320.0, 320.0),
            GameId::Tetris => (200.0, 400.0),
            GameId::Pong => (400.0, 300.0),
            GameId::Breakout => (400.0, 320.0),
            GameId::Asteroids => (400.0, 400.0),
            GameId::Pacman => (300.0, 300.0),
            GameId::SpaceInvaders => (400.0, 400.0),
            GameId::Doom => (320.0, 240.0),
            GameId::Chess => (320.0, 320.0),
            GameId::Sudoku => (360.0, 360.0),
        }
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finished run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub won: bool,
}

impl Outcome {
    pub const WON: Outcome = Outcome { won: true };
    pub const LOST: Outcome = Outcome { won: false };
}

/// Common surface of every game simulation
pub trait Game {
    fn id(&self) -> GameId;
    fn difficulty(&self) -> Difficulty;
    /// Advance one fixed step
    fn update(&mut self, input: &InputFrame, dt: f32);
    fn render(&self, surface: &mut dyn Surface);
    /// Score recorded in the ledger when the run ends
    fn score(&self) -> u64;
    /// `Some` once the run reached a terminal state
    fn outcome(&self) -> Option<Outcome>;
    /// Re-initialize every piece of state at `difficulty`
    fn reset(&mut self, difficulty: Difficulty);
    /// Extra game-specific fields stored next to the score
    fn score_details(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// Tagged variant over every game, exclusively owned by the driver
#[derive(Debug, Clone)]
pub enum GameState {
    Snake(SnakeGame),
    Tetris(TetrisGame),
    Pong(PongGame),
    Breakout(BreakoutGame),
    Asteroids(AsteroidsGame),
    Pacman(PacmanGame),
    SpaceInvaders(InvadersGame),
    Doom(DoomGame),
    Chess(ChessGame),
    Sudoku(SudokuGame),
}

impl GameState {
    pub fn new(id: GameId, difficulty: Difficulty, seed: u64) -> Self {
        match id {
            GameId::Snake => GameState::Snake(SnakeGame::new(difficulty, seed)),
            GameId::Tetris => GameState::Tetris(TetrisGame::new(difficulty, seed)),
            GameId::Pong => GameState::Pong(PongGame::new(difficulty, seed)),
            GameId::Breakout => GameState::Breakout(BreakoutGame::new(difficulty, seed)),
            GameId::Asteroids => GameState::Asteroids(AsteroidsGame::new(difficulty, seed)),
            GameId::Pacman => GameState::Pacman(PacmanGame::new(difficulty, seed)),
            GameId::SpaceInvaders => GameState::SpaceInvaders(InvadersGame::new(difficulty, seed)),
            GameId::Doom => GameState::Doom(DoomGame::new(difficulty, seed)),
            GameId::Chess => GameState::Chess(ChessGame::new(difficulty, seed)),
            GameId::Sudoku => GameState::Sudoku(SudokuGame::new(difficulty, seed)),
        }
    }

    pub fn as_game(&self) -> &dyn Game {
        match self {
            GameState::Snake(g) => g,
            GameState::Tetris(g) => g,
            GameState::Pong(g) => g,
            GameState::Breakout(g) => g,
            GameState::Asteroids(g) => g,
            GameState::Pacman(g) => g,
            GameState::SpaceInvaders(g) => g,
            GameState::Doom(g) => g,
            GameState::Chess(g) => g,
            GameState::Sudoku(g) => g,
        }
    }

    pub fn as_game_mut(&mut self) -> &mut dyn Game {
        match self {
            GameState::Snake(g) => g,
            GameState::Tetris(g) => g,
            GameState::Pong(g) => g,
            GameState::Breakout(g) => g,
            GameState::Asteroids(g) => g,
            GameState::Pacman(g) => g,
            GameState::SpaceInvaders(g) => g,
            GameState::Doom(g) => g,
            GameState::Chess(g) => g,
            GameState::Sudoku(g) => g,
        }
    }
}

impl Game for GameState {
    fn id(&self) -> GameId {
        self.as_game().id()
    }

    fn difficulty(&self) -> Difficulty {
        self.as_game().difficulty()
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        self.as_game_mut().update(input, dt)
    }

    fn render(&self, surface: &mut dyn Surface) {
        self.as_game().render(surface)
    }

    fn score(&self) -> u64 {
        self.as_game().score()
    }

    fn outcome(&self) -> Option<Outcome> {
        self.as_game().outcome()
    }

    fn reset(&mut self, difficulty: Difficulty) {
        self.as_game_mut().reset(difficulty)
    }

    fn score_details(&self) -> Map<String, Value> {
        self.as_game().score_details()
    }
}

/// Points weighted by difficulty, floored to an integer
#[inline]
pub fn weighted_points(base: u32, multiplier: f32) -> u64 {
    (base as f32 * multiplier).floor() as u64
}
