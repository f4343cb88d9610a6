//! Breakout
//!
//! 5x8 brick wall, one ball, limited lives.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

use super::collision::{Rect, paddle_deflection, reflect_velocity};
use super::{Game, GameId, Outcome, weighted_points};
use crate::difficulty::Difficulty;
use crate::per_second;
use crate::platform::input::{Button, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::BreakoutTuning;

pub const WIDTH: f32 = 400.0;
pub const HEIGHT: f32 = 320.0;
pub const BALL_RADIUS: f32 = 8.0;
pub const PADDLE_HEIGHT: f32 = 10.0;
/// Keyboard paddle speed (px/frame)
pub const PADDLE_SPEED: f32 = 7.0;
/// Horizontal ball speed at a paddle edge hit (px/frame)
pub const MAX_DEFLECTION: f32 = 5.0;

pub const BRICK_ROWS: usize = 5;
pub const BRICK_COLS: usize = 8;
pub const BRICK_WIDTH: f32 = 40.0;
pub const BRICK_HEIGHT: f32 = 20.0;
pub const BRICK_PADDING: f32 = 10.0;
pub const BRICK_OFFSET_TOP: f32 = 30.0;
const BRICK_BASE_POINTS: u32 = 10;

const ROW_COLORS: [Color; BRICK_ROWS] = [
    Color(0xff0000),
    Color(0xff7f00),
    Color(0xffff00),
    Color(0x00ff00),
    Color(0x0000ff),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Brick {
    pub rect: Rect,
    pub row: usize,
    pub alive: bool,
}

/// Full wall, centred horizontally
pub fn build_wall() -> Vec<Brick> {
    let wall_width =
        BRICK_COLS as f32 * BRICK_WIDTH + (BRICK_COLS as f32 - 1.0) * BRICK_PADDING;
    let left = (WIDTH - wall_width) / 2.0;
    let mut bricks = Vec::with_capacity(BRICK_ROWS * BRICK_COLS);
    for row in 0..BRICK_ROWS {
        for col in 0..BRICK_COLS {
            bricks.push(Brick {
                rect: Rect::new(
                    left + col as f32 * (BRICK_WIDTH + BRICK_PADDING),
                    BRICK_OFFSET_TOP + row as f32 * (BRICK_HEIGHT + BRICK_PADDING),
                    BRICK_WIDTH,
                    BRICK_HEIGHT,
                ),
                row,
                alive: true,
            });
        }
    }
    bricks
}

#[derive(Debug, Clone)]
pub struct BreakoutGame {
    difficulty: Difficulty,
    tuning: BreakoutTuning,
    rng: Pcg32,
    pub bricks: Vec<Brick>,
    pub ball: Vec2,
    /// px/s
    pub ball_vel: Vec2,
    /// Left edge of the paddle
    pub paddle_x: f32,
    pub lives: u32,
    pub score: u64,
    outcome: Option<Outcome>,
}

impl BreakoutGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: BreakoutTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            bricks: Vec::new(),
            ball: Vec2::ZERO,
            ball_vel: Vec2::ZERO,
            paddle_x: 0.0,
            lives: 0,
            score: 0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    pub fn paddle_width(&self) -> f32 {
        self.tuning.paddle_width
    }

    pub fn bricks_left(&self) -> usize {
        self.bricks.iter().filter(|b| b.alive).count()
    }

    fn serve(&mut self) {
        let speed = per_second(self.tuning.ball_speed);
        self.ball = Vec2::new(WIDTH / 2.0, HEIGHT - 30.0);
        let dir = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        self.ball_vel = Vec2::new(speed * dir, -speed);
        self.paddle_x = (WIDTH - self.tuning.paddle_width) / 2.0;
    }

    fn move_paddle(&mut self, input: &InputFrame, dt: f32) {
        let max_x = WIDTH - self.tuning.paddle_width;
        if let Some(p) = input.pointer_moved {
            self.paddle_x = (p.x - self.tuning.paddle_width / 2.0).clamp(0.0, max_x);
            return;
        }
        let step = per_second(PADDLE_SPEED) * dt;
        if input.is_held(Button::Right) {
            self.paddle_x = (self.paddle_x + step).min(max_x);
        } else if input.is_held(Button::Left) {
            self.paddle_x = (self.paddle_x - step).max(0.0);
        }
    }

    /// First live brick containing the ball centre is destroyed
    fn brick_collisions(&mut self) {
        let ball = self.ball;
        let Some(brick) = self
            .bricks
            .iter_mut()
            .find(|b| b.alive && b.rect.contains(ball))
        else {
            return;
        };
        brick.alive = false;
        self.ball_vel.y = -self.ball_vel.y;
        self.score += weighted_points(BRICK_BASE_POINTS, self.tuning.score_multiplier);
        if self.bricks_left() == 0 {
            log::info!("Breakout cleared with score {}", self.score);
            self.outcome = Some(Outcome::WON);
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        log::debug!("Breakout ball lost, {} lives left", self.lives);
        if self.lives == 0 {
            self.outcome = Some(Outcome::LOST);
        } else {
            self.serve();
        }
    }
}

impl Game for BreakoutGame {
    fn id(&self) -> GameId {
        GameId::Breakout
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.brick_collisions();
        if self.outcome.is_some() {
            return;
        }

        let next = self.ball + self.ball_vel * dt;
        if next.x > WIDTH - BALL_RADIUS || next.x < BALL_RADIUS {
            self.ball_vel = reflect_velocity(self.ball_vel, Vec2::X);
        }
        if next.y < BALL_RADIUS {
            self.ball_vel.y = self.ball_vel.y.abs();
        } else if next.y > HEIGHT - BALL_RADIUS - PADDLE_HEIGHT && self.ball_vel.y > 0.0 {
            let paddle_w = self.tuning.paddle_width;
            if self.ball.x > self.paddle_x && self.ball.x < self.paddle_x + paddle_w {
                self.ball_vel.y = -self.ball_vel.y;
                let spin = paddle_deflection(self.ball.x, self.paddle_x + paddle_w / 2.0, paddle_w / 2.0, MAX_DEFLECTION);
                self.ball_vel.x = per_second(spin);
            } else if next.y > HEIGHT - BALL_RADIUS {
                self.lose_life();
                return;
            }
        }

        self.move_paddle(input, dt);
        self.ball += self.ball_vel * dt;
        self.ball.x = self.ball.x.clamp(0.0, WIDTH);
        self.ball.y = self.ball.y.clamp(0.0, HEIGHT);
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color::BLACK);
        for b in self.bricks.iter().filter(|b| b.alive) {
            surface.fill_rect(b.rect.x, b.rect.y, b.rect.w, b.rect.h, ROW_COLORS[b.row]);
        }
        surface.fill_circle(self.ball, BALL_RADIUS, Color::WHITE);
        surface.fill_rect(
            self.paddle_x,
            HEIGHT - PADDLE_HEIGHT,
            self.tuning.paddle_width,
            PADDLE_HEIGHT,
            Color(0x0095dd),
        );
        surface.fill_text(
            &format!("Score: {}", self.score),
            Vec2::new(8.0, 20.0),
            16.0,
            TextAlign::Left,
            Color::WHITE,
        );
        surface.fill_text(
            &format!("Lives: {}", self.lives),
            Vec2::new(WIDTH - 8.0, 20.0),
            16.0,
            TextAlign::Right,
            Color::WHITE,
        );
        match self.outcome {
            Some(o) if o.won => draw_banner(surface, "YOU WIN", None),
            Some(_) => draw_banner(surface, "GAME OVER", None),
            None => {}
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
        self.tuning = BreakoutTuning::new(difficulty);
        self.bricks = build_wall();
        self.lives = self.tuning.lives;
        self.score = 0;
        self.outcome = None;
        self.serve();
        log::info!("Breakout started on {}", difficulty);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("lives".into(), Value::from(self.lives));
        m
    }
}
