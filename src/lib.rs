//! Retro Arcade - deterministic simulation core for classic arcade games
//!
//! Core modules:
//! - `sim`: Per-game simulations (physics, collisions, rules)
//! - `driver`: Frame driver state machine and cancellable tick loop
//! - `platform`: Input aggregation, tick scheduling, browser bindings
//! - `persistence`: Key-value storage port and backends
//! - `difficulty` / `tuning`: Data-driven game balance
//! - `highscores` / `settings`: Persisted score ledger and preferences

pub mod difficulty;
pub mod driver;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use difficulty::{Difficulty, DifficultyProfile, profile};
pub use driver::{DriverPhase, FrameDriver, FrameLoop};
pub use highscores::{HighScoreEntry, HighScores};
pub use settings::Settings;
pub use sim::{Game, GameId, GameState, Outcome};

use glam::Vec2;

/// Simulation timing constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the display rate the games were tuned for)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta fed into the accumulator (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Frames per second used to convert per-frame tuning values
    pub const FRAME_RATE: f32 = 60.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector pointing along `angle` (radians, screen coordinates)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Convert a per-frame quantity into a per-second one
#[inline]
pub fn per_second(per_frame: f32) -> f32 {
    per_frame * consts::FRAME_RATE
}
