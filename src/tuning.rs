//! Data-driven game balance
//!
//! One table per game, selected by [`Difficulty`]. Speeds are stored in the
//! per-frame units the games were balanced in (60 frames per second); the
//! simulations convert them with [`crate::per_second`].

use crate::difficulty::{Difficulty, DifficultyProfile};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnakeTuning {
    /// Seconds between snake steps
    pub step_interval: f32,
    /// Chance that eaten food reappears elsewhere
    pub food_respawn_chance: f32,
    /// Segments added per food
    pub growth: u32,
    pub points_per_food: u32,
}

impl SnakeTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            step_interval: d.pick(0.120, 0.090, 0.070),
            food_respawn_chance: d.pick(0.9, 0.8, 0.7),
            growth: d.pick(1, 2, 3),
            points_per_food: 10,
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: 0.090 / self.step_interval,
            spawn_rate: self.food_respawn_chance,
            starting_resource: 1,
            score_multiplier: 1.0,
            ai_aggressiveness: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TetrisTuning {
    /// Seconds between gravity steps
    pub drop_interval: f32,
    pub score_multiplier: f32,
}

impl TetrisTuning {
    /// Base points for clearing 0..=4 lines at once
    pub const LINE_POINTS: [u32; 5] = [0, 40, 100, 300, 1200];

    pub fn new(d: Difficulty) -> Self {
        Self {
            drop_interval: d.pick(1.2, 1.0, 0.6),
            score_multiplier: d.score_multiplier(),
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: 1.0 / self.drop_interval,
            spawn_rate: 1.0 / self.drop_interval,
            starting_resource: 0,
            score_multiplier: self.score_multiplier,
            ai_aggressiveness: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PongTuning {
    /// Serve speed (px/frame)
    pub ball_speed: f32,
    /// CPU paddle tracking speed (px/frame)
    pub cpu_speed: f32,
    /// CPU ignores the ball while it is within this many px of paddle centre
    pub cpu_reaction: f32,
    /// Keyboard paddle speed (px/frame)
    pub paddle_speed: f32,
    pub points_to_win: u32,
}

impl PongTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            ball_speed: d.pick(4.0, 5.0, 7.0),
            cpu_speed: d.pick(2.5, 4.0, 5.5),
            cpu_reaction: d.pick(60.0, 35.0, 20.0),
            paddle_speed: 6.0,
            points_to_win: 5,
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: self.ball_speed / 5.0,
            spawn_rate: 0.0,
            starting_resource: self.points_to_win,
            score_multiplier: 1.0,
            ai_aggressiveness: self.cpu_speed / 5.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutTuning {
    /// Ball speed on each axis at serve (px/frame)
    pub ball_speed: f32,
    pub paddle_width: f32,
    pub lives: u32,
    pub score_multiplier: f32,
}

impl BreakoutTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            ball_speed: d.pick(3.0, 4.0, 6.0),
            paddle_width: d.pick(85.0, 75.0, 65.0),
            lives: d.pick(5, 3, 2),
            score_multiplier: d.score_multiplier(),
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: self.ball_speed / 4.0,
            spawn_rate: 0.0,
            starting_resource: self.lives,
            score_multiplier: self.score_multiplier,
            ai_aggressiveness: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsteroidsTuning {
    /// Scales asteroid drift speed
    pub speed_multiplier: f32,
    pub score_multiplier: f32,
    /// Added to the base spawn clearance around the ship (px)
    pub spawn_clearance: f32,
    /// Added to the per-level asteroid count
    pub count_adjust: i32,
    pub lives: u32,
}

impl AsteroidsTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            speed_multiplier: d.pick(0.8, 1.0, 1.3),
            score_multiplier: d.score_multiplier(),
            spawn_clearance: d.pick(50.0, 30.0, 20.0),
            count_adjust: d.pick(-1, 0, 2),
            lives: 3,
        }
    }

    /// Number of large asteroids spawned for `level` (1-based)
    pub fn asteroid_count(&self, level: u32) -> usize {
        let base = 3 + (level as f32 * 0.5).floor() as i32;
        let n = base + self.count_adjust;
        if self.count_adjust < 0 { n.max(2) as usize } else { n.max(1) as usize }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: self.speed_multiplier,
            spawn_rate: self.asteroid_count(1) as f32,
            starting_resource: self.lives,
            score_multiplier: self.score_multiplier,
            ai_aggressiveness: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacmanTuning {
    /// Cells per frame
    pub pacman_speed: f32,
    /// Cells per frame, before each ghost's own factor
    pub ghost_speed: f32,
    /// Power pellet duration (frames)
    pub power_frames: u32,
    pub score_multiplier: f32,
}

impl PacmanTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            pacman_speed: d.pick(0.15, 0.1, 0.08),
            ghost_speed: d.pick(0.07, 0.08, 0.12),
            power_frames: d.pick(500, 300, 200),
            score_multiplier: d.score_multiplier(),
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: self.ghost_speed / 0.08,
            spawn_rate: 0.0,
            starting_resource: 1,
            score_multiplier: self.score_multiplier,
            ai_aggressiveness: self.ghost_speed / 0.12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvadersTuning {
    /// Formation speed (px/frame)
    pub enemy_speed: f32,
    /// Added to the formation speed per kill (px/frame)
    pub speed_per_kill: f32,
    /// Seconds between enemy shots
    pub fire_interval: f32,
    pub lives: u32,
    pub score_multiplier: f32,
}

impl InvadersTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            enemy_speed: d.pick(0.3, 0.5, 0.8),
            speed_per_kill: 0.02,
            fire_interval: d.pick(1.5, 1.0, 0.6),
            lives: d.pick(5, 3, 2),
            score_multiplier: d.score_multiplier(),
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: self.enemy_speed / 0.5,
            spawn_rate: 1.0 / self.fire_interval,
            starting_resource: self.lives,
            score_multiplier: self.score_multiplier,
            ai_aggressiveness: 0.6 / self.fire_interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoomTuning {
    /// Cells per frame
    pub player_speed: f32,
    pub enemy_health: i32,
    pub player_health: i32,
    pub ammo: u32,
}

impl DoomTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            player_speed: d.pick(0.04, 0.05, 0.06),
            enemy_health: d.pick(80, 100, 120),
            player_health: d.pick(120, 100, 80),
            ammo: d.pick(60, 50, 40),
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: self.player_speed / 0.05,
            spawn_rate: 0.0,
            starting_resource: self.player_health.max(0) as u32,
            score_multiplier: 1.0,
            ai_aggressiveness: self.enemy_health as f32 / 120.0,
        }
    }
}

/// How the chess AI ranks its candidate moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChessPolicy {
    /// Uniform over all legal moves
    Random,
    /// Capture value only, 70% chance of picking among the top 3
    TopThree,
    /// Full positional evaluation, weighted 70/20/10 over the top 3
    Weighted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChessTuning {
    pub policy: ChessPolicy,
    /// Seconds the AI waits before replying
    pub ai_delay: f32,
}

impl ChessTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            policy: d.pick(ChessPolicy::Random, ChessPolicy::TopThree, ChessPolicy::Weighted),
            ai_delay: 0.5,
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: 1.0,
            spawn_rate: 0.0,
            starting_resource: 0,
            score_multiplier: 1.0,
            ai_aggressiveness: match self.policy {
                ChessPolicy::Random => 0.0,
                ChessPolicy::TopThree => 0.5,
                ChessPolicy::Weighted => 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SudokuTuning {
    /// Cells blanked out of the solved grid
    pub cells_removed: usize,
    pub max_mistakes: u32,
}

impl SudokuTuning {
    pub fn new(d: Difficulty) -> Self {
        Self {
            cells_removed: d.pick(30, 45, 55),
            max_mistakes: 3,
        }
    }

    pub fn profile(&self) -> DifficultyProfile {
        DifficultyProfile {
            speed_factor: 1.0,
            spawn_rate: self.cells_removed as f32 / 81.0,
            starting_resource: self.max_mistakes,
            score_multiplier: 1.0,
            ai_aggressiveness: 0.0,
        }
    }
}
