//! Pong
//!
//! Player on the left (pointer or Up/Down), CPU on the right. First to five.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::{Rect, aabb_overlap, paddle_deflection};
use super::{Game, GameId, Outcome};
use crate::difficulty::Difficulty;
use crate::per_second;
use crate::platform::input::{Button, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::PongTuning;

pub const WIDTH: f32 = 400.0;
pub const HEIGHT: f32 = 300.0;
pub const PADDLE_WIDTH: f32 = 10.0;
pub const PADDLE_HEIGHT: f32 = 60.0;
pub const BALL_RADIUS: f32 = 8.0;
pub const PLAYER_X: f32 = 20.0;
pub const CPU_X: f32 = WIDTH - 20.0 - PADDLE_WIDTH;
/// Vertical ball speed at a paddle edge hit (px/frame)
pub const MAX_DEFLECTION: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct PongGame {
    difficulty: Difficulty,
    tuning: PongTuning,
    rng: Pcg32,
    /// Paddle tops
    pub player_y: f32,
    pub cpu_y: f32,
    pub ball: Vec2,
    /// px/s
    pub ball_vel: Vec2,
    pub player_score: u32,
    pub cpu_score: u32,
    outcome: Option<Outcome>,
}

impl PongGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: PongTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            player_y: 0.0,
            cpu_y: 0.0,
            ball: Vec2::ZERO,
            ball_vel: Vec2::ZERO,
            player_score: 0,
            cpu_score: 0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    pub fn player_paddle(&self) -> Rect {
        Rect::new(PLAYER_X, self.player_y, PADDLE_WIDTH, PADDLE_HEIGHT)
    }

    pub fn cpu_paddle(&self) -> Rect {
        Rect::new(CPU_X, self.cpu_y, PADDLE_WIDTH, PADDLE_HEIGHT)
    }

    fn clamp_paddle(y: f32) -> f32 {
        y.clamp(0.0, HEIGHT - PADDLE_HEIGHT)
    }

    /// Ball back to centre, serving toward whoever it was not heading to
    fn reset_ball(&mut self) {
        self.ball = Vec2::new(WIDTH / 2.0, HEIGHT / 2.0);
        self.ball_vel.x = -self.ball_vel.x;
        self.ball_vel.y = per_second(self.rng.random_range(-2.0..2.0));
    }

    fn move_player(&mut self, input: &InputFrame, dt: f32) {
        if let Some(p) = input.pointer_moved {
            self.player_y = Self::clamp_paddle(p.y - PADDLE_HEIGHT / 2.0);
            return;
        }
        let step = per_second(self.tuning.paddle_speed) * dt;
        if input.is_held(Button::Up) {
            self.player_y = Self::clamp_paddle(self.player_y - step);
        }
        if input.is_held(Button::Down) {
            self.player_y = Self::clamp_paddle(self.player_y + step);
        }
    }

    fn move_cpu(&mut self, dt: f32) {
        let center = self.cpu_y + PADDLE_HEIGHT / 2.0;
        let step = per_second(self.tuning.cpu_speed) * dt;
        if center < self.ball.y - self.tuning.cpu_reaction {
            self.cpu_y += step;
        } else if center > self.ball.y + self.tuning.cpu_reaction {
            self.cpu_y -= step;
        }
        self.cpu_y = Self::clamp_paddle(self.cpu_y);
    }

    /// Bounce off whichever paddle is on the ball's half of the court
    fn paddle_bounce(&mut self) {
        let (paddle, toward) = if self.ball.x < WIDTH / 2.0 {
            (self.player_paddle(), self.ball_vel.x < 0.0)
        } else {
            (self.cpu_paddle(), self.ball_vel.x > 0.0)
        };
        let ball_box = Rect::centered(self.ball, BALL_RADIUS * 2.0, BALL_RADIUS * 2.0);
        if !toward || !aabb_overlap(&ball_box, &paddle) {
            return;
        }
        self.ball_vel.x = -self.ball_vel.x;
        let spin = paddle_deflection(self.ball.y, paddle.center().y, PADDLE_HEIGHT / 2.0, MAX_DEFLECTION);
        self.ball_vel.y = per_second(spin);
    }

    fn point_scored(&mut self, by_player: bool) {
        if by_player {
            self.player_score += 1;
        } else {
            self.cpu_score += 1;
        }
        log::debug!("Pong {}-{}", self.player_score, self.cpu_score);
        self.reset_ball();
        if self.player_score >= self.tuning.points_to_win {
            self.outcome = Some(Outcome::WON);
        } else if self.cpu_score >= self.tuning.points_to_win {
            self.outcome = Some(Outcome::LOST);
        }
    }
}

impl Game for PongGame {
    fn id(&self) -> GameId {
        GameId::Pong
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.move_player(input, dt);
        self.ball += self.ball_vel * dt;
        self.move_cpu(dt);

        // Top and bottom walls
        if self.ball.y < 0.0 {
            self.ball.y = 0.0;
            self.ball_vel.y = self.ball_vel.y.abs();
        } else if self.ball.y > HEIGHT {
            self.ball.y = HEIGHT;
            self.ball_vel.y = -self.ball_vel.y.abs();
        }

        self.paddle_bounce();

        if self.ball.x < 0.0 {
            self.point_scored(false);
        } else if self.ball.x > WIDTH {
            self.point_scored(true);
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color::BLACK);
        let mut y = 0.0;
        while y < HEIGHT {
            surface.fill_rect(WIDTH / 2.0 - 1.0, y, 2.0, 10.0, Color::GRAY);
            y += 15.0;
        }
        let p = self.player_paddle();
        let c = self.cpu_paddle();
        surface.fill_rect(p.x, p.y, p.w, p.h, Color::WHITE);
        surface.fill_rect(c.x, c.y, c.w, c.h, Color::WHITE);
        surface.fill_circle(self.ball, BALL_RADIUS, Color::WHITE);
        surface.fill_text(
            &self.player_score.to_string(),
            Vec2::new(WIDTH / 4.0, 30.0),
            16.0,
            TextAlign::Center,
            Color::WHITE,
        );
        surface.fill_text(
            &self.cpu_score.to_string(),
            Vec2::new(3.0 * WIDTH / 4.0, 30.0),
            16.0,
            TextAlign::Center,
            Color::WHITE,
        );
        if let Some(o) = self.outcome {
            let title = if o.won { "YOU WIN" } else { "CPU WINS" };
            draw_banner(surface, title, None);
        }
    }

    fn score(&self) -> u64 {
        self.player_score as u64
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn reset(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.tuning = PongTuning::new(difficulty);
        self.player_y = HEIGHT / 2.0 - PADDLE_HEIGHT / 2.0;
        self.cpu_y = self.player_y;
        self.ball = Vec2::new(WIDTH / 2.0, HEIGHT / 2.0);
        let speed = per_second(self.tuning.ball_speed);
        self.ball_vel = Vec2::new(speed, speed / 2.0);
        self.player_score = 0;
        self.cpu_score = 0;
        self.outcome = None;
        log::info!("Pong started on {}", difficulty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_paddle_hit_inverts_horizontal_velocity() {
        let mut g = PongGame::new(Difficulty::Normal, 1);
        g.ball = Vec2::new(PLAYER_X + PADDLE_WIDTH + 4.0, g.player_y + PADDLE_HEIGHT / 2.0);
        g.ball_vel = Vec2::new(-300.0, 10.0);
        g.paddle_bounce();
        assert!(g.ball_vel.x > 0.0);
        // Centre hit goes out flat
        assert!(g.ball_vel.y.abs() < 1e-3);
    }

    #[test]
    fn test_deflection_bounded_by_edge_hit() {
        let mut g = PongGame::new(Difficulty::Normal, 1);
        g.ball = Vec2::new(PLAYER_X + PADDLE_WIDTH + 4.0, g.player_y + PADDLE_HEIGHT + 6.0);
        g.ball_vel = Vec2::new(-300.0, 0.0);
        g.paddle_bounce();
        assert!((g.ball_vel.y - per_second(MAX_DEFLECTION)).abs() < 1e-3);
    }

    #[test]
    fn test_ball_moving_away_is_not_bounced() {
        let mut g = PongGame::new(Difficulty::Normal, 1);
        g.ball = Vec2::new(PLAYER_X + PADDLE_WIDTH + 4.0, g.player_y + PADDLE_HEIGHT / 2.0);
        g.ball_vel = Vec2::new(300.0, 0.0);
        g.paddle_bounce();
        assert!(g.ball_vel.x > 0.0);
    }

    #[test]
    fn test_pointer_clamps_paddle() {
        let mut g = PongGame::new(Difficulty::Normal, 1);
        g.update(&InputFrame::default().with_pointer(Vec2::new(0.0, -50.0)), DT);
        assert_eq!(g.player_y, 0.0);
        g.update(&InputFrame::default().with_pointer(Vec2::new(0.0, 900.0)), DT);
        assert_eq!(g.player_y, HEIGHT - PADDLE_HEIGHT);
    }

    #[test]
    fn test_still_pointer_leaves_keys_in_charge() {
        let mut g = PongGame::new(Difficulty::Normal, 1);
        g.update(&InputFrame::default().with_pointer(Vec2::new(0.0, 150.0)), DT);
        let y = g.player_y;
        let mut held = InputFrame::default().hold(Button::Down);
        held.pointer = Some(Vec2::new(0.0, 150.0));
        g.update(&held, DT);
        assert!(g.player_y > y);
    }

    #[test]
    fn test_first_to_five() {
        let mut g = PongGame::new(Difficulty::Easy, 1);
        for _ in 0..4 {
            g.point_scored(true);
        }
        assert!(g.outcome().is_none());
        g.point_scored(true);
        assert_eq!(g.outcome(), Some(Outcome::WON));
        assert_eq!(g.score(), 5);
    }

    #[test]
    fn test_miss_scores_for_cpu_and_resets() {
        let mut g = PongGame::new(Difficulty::Normal, 1);
        g.player_y = 0.0;
        g.ball = Vec2::new(2.0, 250.0);
        g.ball_vel = Vec2::new(-300.0, 0.0);
        g.update(&InputFrame::default(), DT);
        assert_eq!(g.cpu_score, 1);
        assert_eq!(g.ball, Vec2::new(WIDTH / 2.0, HEIGHT / 2.0));
        assert!(g.ball_vel.x > 0.0);
        assert!(g.ball_vel.y.abs() <= per_second(2.0));
    }

    #[test]
    fn test_ball_stays_in_court() {
        let mut g = PongGame::new(Difficulty::Hard, 11);
        for _ in 0..5000 {
            g.update(&InputFrame::default(), DT);
            assert!(g.ball.y >= 0.0 && g.ball.y <= HEIGHT);
            assert!(g.cpu_y >= 0.0 && g.cpu_y <= HEIGHT - PADDLE_HEIGHT);
            if g.outcome().is_some() {
                break;
            }
        }
    }
}
