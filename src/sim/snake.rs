//! Snake
//!
//! Grid game: the snake advances one cell every `step_interval` seconds.

use std::collections::VecDeque;

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

use super::{Game, GameId, Outcome};
use crate::difficulty::Difficulty;
use crate::platform::input::{Direction, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::SnakeTuning;

/// Cells per side
pub const GRID_SIZE: i32 = 16;
/// Pixels per cell
pub const CELL: f32 = 20.0;

const START: (i32, i32) = (5, 5);
const FIRST_FOOD: (i32, i32) = (10, 10);

#[derive(Debug, Clone)]
pub struct SnakeGame {
    difficulty: Difficulty,
    tuning: SnakeTuning,
    rng: Pcg32,
    /// Head first
    pub body: VecDeque<(i32, i32)>,
    /// Direction of the last completed step
    pub heading: Direction,
    /// Direction the next step will take
    pub queued: Direction,
    pub food: (i32, i32),
    pub score: u64,
    pub foods_eaten: u32,
    step_timer: f32,
    outcome: Option<Outcome>,
}

impl SnakeGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: SnakeTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            body: VecDeque::new(),
            heading: Direction::Right,
            queued: Direction::Right,
            food: FIRST_FOOD,
            score: 0,
            foods_eaten: 0,
            step_timer: 0.0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    pub fn tuning(&self) -> &SnakeTuning {
        &self.tuning
    }

    pub fn head(&self) -> (i32, i32) {
        self.body.front().copied().unwrap_or(START)
    }

    /// Request a turn. Reversing onto the neck is refused.
    pub fn steer(&mut self, dir: Direction) -> bool {
        if dir.is_opposite(self.heading) {
            return false;
        }
        self.queued = dir;
        true
    }

    /// Advance exactly one cell
    pub fn step(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        self.heading = self.queued;
        let (hx, hy) = self.head();
        let (dx, dy) = self.heading.delta();
        let next = (hx + dx, hy + dy);

        if next.0 < 0 || next.0 >= GRID_SIZE || next.1 < 0 || next.1 >= GRID_SIZE {
            log::info!("Snake hit the wall with score {}", self.score);
            self.outcome = Some(Outcome::LOST);
            return;
        }
        if self.body.contains(&next) {
            log::info!("Snake bit itself with score {}", self.score);
            self.outcome = Some(Outcome::LOST);
            return;
        }

        self.body.push_front(next);
        if next == self.food {
            self.score += self.tuning.points_per_food as u64;
            self.foods_eaten += 1;
            // The new head already counts as one segment of growth
            if let Some(&tail) = self.body.back() {
                for _ in 1..self.tuning.growth {
                    self.body.push_back(tail);
                }
            }
            self.respawn_food();
        } else {
            self.body.pop_back();
        }
    }

    fn respawn_food(&mut self) {
        if self.rng.random::<f32>() > self.tuning.food_respawn_chance {
            // Food stays where it was
            return;
        }
        let free: Vec<(i32, i32)> = (0..GRID_SIZE)
            .flat_map(|y| (0..GRID_SIZE).map(move |x| (x, y)))
            .filter(|c| !self.body.contains(c))
            .collect();
        match free.choose(&mut self.rng) {
            Some(&cell) => self.food = cell,
            None => {
                log::info!("Snake filled the board");
                self.outcome = Some(Outcome::WON);
            }
        }
    }
}

impl Game for SnakeGame {
    fn id(&self) -> GameId {
        GameId::Snake
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        if let Some(dir) = input.direction() {
            self.steer(dir);
        }
        self.step_timer += dt;
        while self.step_timer >= self.tuning.step_interval {
            self.step_timer -= self.tuning.step_interval;
            self.step();
            if self.outcome.is_some() {
                break;
            }
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color::rgb(0x9b, 0xbc, 0x0f));

        let (fx, fy) = self.food;
        surface.fill_circle(
            Vec2::new(fx as f32 * CELL + CELL / 2.0, fy as f32 * CELL + CELL / 2.0),
            CELL / 2.0,
            Color::RED,
        );

        for (i, &(x, y)) in self.body.iter().enumerate() {
            let color = match i {
                0 => Color::rgb(0x22, 0xc5, 0x5e),
                i if i % 2 == 0 => Color::rgb(0x4a, 0xde, 0x80),
                _ => Color::rgb(0x3b, 0xca, 0x6d),
            };
            surface.fill_rect(x as f32 * CELL, y as f32 * CELL, CELL, CELL, color);
        }

        surface.fill_text(
            &format!("Score: {}", self.score),
            Vec2::new(8.0, 16.0),
            14.0,
            TextAlign::Left,
            Color::BLACK,
        );
        if self.outcome.is_some() {
            draw_banner(surface, "GAME OVER", Some(&format!("Score: {}", self.score)));
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
        self.tuning = SnakeTuning::new(difficulty);
        self.body = VecDeque::from([START]);
        self.heading = Direction::Right;
        self.queued = Direction::Right;
        self.food = FIRST_FOOD;
        self.score = 0;
        self.foods_eaten = 0;
        self.step_timer = 0.0;
        self.outcome = None;
        log::info!("Snake started on {}", difficulty);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("length".into(), Value::from(self.body.len()));
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::input::Button;

    #[test]
    fn test_reverse_request_ignored() {
        let mut g = SnakeGame::new(Difficulty::Normal, 1);
        assert!(!g.steer(Direction::Left));
        assert_eq!(g.queued, Direction::Right);
        g.step();
        assert_eq!(g.head(), (6, 5));
    }

    #[test]
    fn test_perpendicular_then_reverse_checks_committed_heading() {
        let mut g = SnakeGame::new(Difficulty::Normal, 1);
        assert!(g.steer(Direction::Up));
        // Still heading right until the next step, so left stays illegal
        assert!(!g.steer(Direction::Left));
        g.step();
        assert_eq!(g.head(), (5, 4));
        assert!(!g.steer(Direction::Down));
        assert!(g.steer(Direction::Left));
    }

    #[test]
    fn test_same_direction_accepted() {
        let mut g = SnakeGame::new(Difficulty::Normal, 1);
        assert!(g.steer(Direction::Right));
    }

    #[test]
    fn test_eating_grows_and_scores() {
        for (d, growth) in [(Difficulty::Easy, 1), (Difficulty::Normal, 2), (Difficulty::Hard, 3)] {
            let mut g = SnakeGame::new(d, 42);
            g.food = (6, 5);
            g.step();
            assert_eq!(g.score, 10);
            assert_eq!(g.body.len(), 1 + growth);
            assert!(!g.body.contains(&g.food) || g.food == (6, 5));
        }
    }

    #[test]
    fn test_wall_ends_game() {
        let mut g = SnakeGame::new(Difficulty::Normal, 3);
        g.food = (0, 0);
        for _ in 0..10 {
            g.step();
        }
        assert_eq!(g.head(), (15, 5));
        assert!(g.outcome().is_none());
        g.step();
        assert_eq!(g.outcome(), Some(Outcome::LOST));
    }

    #[test]
    fn test_self_collision() {
        let mut g = SnakeGame::new(Difficulty::Normal, 3);
        g.body = VecDeque::from([(5, 5), (4, 5), (4, 6), (5, 6), (6, 6)]);
        g.steer(Direction::Down);
        g.step();
        assert_eq!(g.outcome(), Some(Outcome::LOST));
    }

    #[test]
    fn test_update_steps_on_timer() {
        let mut g = SnakeGame::new(Difficulty::Easy, 3);
        let idle = InputFrame::default();
        // 0.120 s interval: 7 frames at 60 Hz is still short of one step
        for _ in 0..7 {
            g.update(&idle, 1.0 / 60.0);
        }
        assert_eq!(g.head(), (5, 5));
        g.update(&idle, 1.0 / 60.0);
        assert_eq!(g.head(), (6, 5));

        let up = InputFrame::default().press(Button::Up);
        g.update(&up, 0.2);
        assert_eq!(g.head(), (6, 4));
    }

    #[test]
    fn test_reset_restores_start() {
        let mut g = SnakeGame::new(Difficulty::Normal, 3);
        g.food = (6, 5);
        g.step();
        g.reset(Difficulty::Hard);
        assert_eq!(g.body.len(), 1);
        assert_eq!(g.score, 0);
        assert_eq!(g.difficulty(), Difficulty::Hard);
        assert_eq!(g.food, FIRST_FOOD);
    }
}
