//! Difficulty levels and the per-game difficulty profile
//!
//! A profile is a pure lookup: the same game and level always produce the
//! same tuning tuple. Games consult it only when they (re)initialize.

use serde::{Deserialize, Serialize};

use crate::sim::GameId;
use crate::tuning::{
    AsteroidsTuning, BreakoutTuning, ChessTuning, DoomTuning, InvadersTuning, PacmanTuning,
    PongTuning, SnakeTuning, SudokuTuning, TetrisTuning,
};

/// Three-valued difficulty selector shared by every game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "medium" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Pick one of three values by level
    #[inline]
    pub fn pick<T>(&self, easy: T, normal: T, hard: T) -> T {
        match self {
            Difficulty::Easy => easy,
            Difficulty::Normal => normal,
            Difficulty::Hard => hard,
        }
    }

    /// Score weighting used by games that scale points with difficulty
    pub fn score_multiplier(&self) -> f32 {
        self.pick(0.8, 1.0, 1.5)
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a game's tuning at one difficulty level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    /// Pace relative to the game's normal level (1.0 = normal)
    pub speed_factor: f32,
    /// Rate at which the game spawns things (food, pieces, enemy shots, removed cells)
    pub spawn_rate: f32,
    /// Lives, health or allowed mistakes at the start of a run
    pub starting_resource: u32,
    /// Multiplier applied to base points before flooring
    pub score_multiplier: f32,
    /// Opponent strength in [0, 1]
    pub ai_aggressiveness: f32,
}

/// Look up the profile for `game` at `level`
pub fn profile(game: GameId, level: Difficulty) -> DifficultyProfile {
    match game {
        GameId::Snake => SnakeTuning::new(level).profile(),
        GameId::Tetris => TetrisTuning::new(level).profile(),
        GameId::Pong => PongTuning::new(level).profile(),
        GameId::Breakout => BreakoutTuning::new(level).profile(),
        GameId::Asteroids => AsteroidsTuning::new(level).profile(),
        GameId::Pacman => PacmanTuning::new(level).profile(),
        GameId::SpaceInvaders => InvadersTuning::new(level).profile(),
        GameId::Doom => DoomTuning::new(level).profile(),
        GameId::Chess => ChessTuning::new(level).profile(),
        GameId::Sudoku => SudokuTuning::new(level).profile(),
    }
}
