//! Space Invaders
//!
//! A 5x8 formation marches sideways, dropping on every edge contact and
//! speeding up with each kill. All collisions are box overlaps.

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

use super::collision::{Rect, aabb_overlap};
use super::{Game, GameId, Outcome, weighted_points};
use crate::difficulty::Difficulty;
use crate::per_second;
use crate::platform::input::{Button, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::InvadersTuning;

pub const WIDTH: f32 = 400.0;
pub const HEIGHT: f32 = 400.0;

pub const ENEMY_ROWS: usize = 5;
pub const ENEMY_COLS: usize = 8;
pub const ENEMY_WIDTH: f32 = 25.0;
pub const ENEMY_HEIGHT: f32 = 20.0;
pub const ENEMY_GAP: f32 = 15.0;
const ENEMY_TOP: f32 = 50.0;
pub const ENEMY_DROP: f32 = 20.0;

pub const PLAYER_WIDTH: f32 = 30.0;
pub const PLAYER_HEIGHT: f32 = 15.0;
pub const PLAYER_Y: f32 = HEIGHT - PLAYER_HEIGHT - 10.0;
/// px/frame while a direction is held
pub const PLAYER_SPEED: f32 = 4.0;

pub const BULLET_WIDTH: f32 = 3.0;
pub const BULLET_HEIGHT: f32 = 10.0;
/// px/frame
pub const PLAYER_BULLET_SPEED: f32 = 5.0;
pub const ENEMY_BULLET_SPEED: f32 = 3.0;
pub const MAX_PLAYER_BULLETS: usize = 3;

/// The formation wins once its lowest edge passes this line
pub const INVASION_LINE: f32 = HEIGHT - PLAYER_HEIGHT - 30.0;

#[derive(Debug, Clone)]
pub struct Enemy {
    pub rect: Rect,
    /// 0..3, by row; lower types are worth more
    pub kind: u32,
}

impl Enemy {
    pub fn points(&self) -> u32 {
        (3 - self.kind) * 10
    }

    fn color(&self) -> Color {
        match self.kind {
            0 => Color::RED,
            1 => Color::MAGENTA,
            _ => Color::YELLOW,
        }
    }
}

fn build_formation() -> Vec<Enemy> {
    let span = ENEMY_COLS as f32 * (ENEMY_WIDTH + ENEMY_GAP) - ENEMY_GAP;
    let left = (WIDTH - span) / 2.0;
    let mut enemies = Vec::with_capacity(ENEMY_ROWS * ENEMY_COLS);
    for row in 0..ENEMY_ROWS {
        for col in 0..ENEMY_COLS {
            enemies.push(Enemy {
                rect: Rect::new(
                    left + col as f32 * (ENEMY_WIDTH + ENEMY_GAP),
                    ENEMY_TOP + row as f32 * (ENEMY_HEIGHT + ENEMY_GAP),
                    ENEMY_WIDTH,
                    ENEMY_HEIGHT,
                ),
                kind: (row % 3) as u32,
            });
        }
    }
    enemies
}

#[derive(Debug, Clone)]
pub struct InvadersGame {
    difficulty: Difficulty,
    tuning: InvadersTuning,
    rng: Pcg32,
    pub player_x: f32,
    pub enemies: Vec<Enemy>,
    /// +1 marching right, -1 left
    pub march: f32,
    /// Current formation speed (px/frame)
    pub enemy_speed: f32,
    /// Top-left corners
    pub bullets: Vec<Vec2>,
    pub enemy_bullets: Vec<Vec2>,
    pub lives: u32,
    pub score: u64,
    fire_timer: f32,
    outcome: Option<Outcome>,
}

impl InvadersGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: InvadersTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            player_x: 0.0,
            enemies: Vec::new(),
            march: 1.0,
            enemy_speed: 0.0,
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            lives: 0,
            score: 0,
            fire_timer: 0.0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    pub fn player_rect(&self) -> Rect {
        Rect::new(self.player_x, PLAYER_Y, PLAYER_WIDTH, PLAYER_HEIGHT)
    }

    fn bullet_rect(p: Vec2) -> Rect {
        Rect::new(p.x, p.y, BULLET_WIDTH, BULLET_HEIGHT)
    }

    /// Launch a player bullet from the cannon, at most three in flight
    pub fn shoot(&mut self) -> bool {
        if self.bullets.len() >= MAX_PLAYER_BULLETS {
            return false;
        }
        self.bullets.push(Vec2::new(
            self.player_x + PLAYER_WIDTH / 2.0 - BULLET_WIDTH / 2.0,
            PLAYER_Y - BULLET_HEIGHT,
        ));
        true
    }

    fn move_player(&mut self, input: &InputFrame, dt: f32) {
        if let Some(p) = input.pointer_moved {
            self.player_x = p.x - PLAYER_WIDTH / 2.0;
        } else {
            self.player_x += input.axis().x * per_second(PLAYER_SPEED) * dt;
        }
        self.player_x = self.player_x.clamp(0.0, WIDTH - PLAYER_WIDTH);
    }

    fn update_bullets(&mut self, dt: f32) {
        let up = per_second(PLAYER_BULLET_SPEED) * dt;
        let down = per_second(ENEMY_BULLET_SPEED) * dt;
        self.bullets.retain_mut(|b| {
            b.y -= up;
            b.y > 0.0
        });
        self.enemy_bullets.retain_mut(|b| {
            b.y += down;
            b.y < HEIGHT
        });

        let mut i = 0;
        while i < self.bullets.len() {
            let shot = Self::bullet_rect(self.bullets[i]);
            match self.enemies.iter().position(|e| aabb_overlap(&shot, &e.rect)) {
                Some(hit) => {
                    let enemy = self.enemies.remove(hit);
                    self.bullets.swap_remove(i);
                    self.score += weighted_points(enemy.points(), self.tuning.score_multiplier);
                    self.enemy_speed += self.tuning.speed_per_kill;
                }
                None => i += 1,
            }
        }

        let player = self.player_rect();
        let before = self.enemy_bullets.len();
        self.enemy_bullets.retain(|b| !aabb_overlap(&Self::bullet_rect(*b), &player));
        let hits = (before - self.enemy_bullets.len()) as u32;
        if hits > 0 {
            self.lives = self.lives.saturating_sub(hits);
            log::debug!("Player hit, {} lives left", self.lives);
            if self.lives == 0 {
                log::info!("Invaders won with player score {}", self.score);
                self.outcome = Some(Outcome::LOST);
            }
        }
    }

    fn update_enemies(&mut self, dt: f32) {
        let dx = self.march * per_second(self.enemy_speed) * dt;
        let mut hit_edge = false;
        for e in &mut self.enemies {
            e.rect.x += dx;
            if e.rect.x <= 0.0 || e.rect.right() >= WIDTH {
                hit_edge = true;
            }
        }
        if hit_edge {
            self.march = -self.march;
            for e in &mut self.enemies {
                e.rect.y += ENEMY_DROP;
            }
        }

        let lowest = self.enemies.iter().map(|e| e.rect.bottom()).fold(0.0, f32::max);
        if lowest > INVASION_LINE {
            log::info!("Invaders landed with score {}", self.score);
            self.outcome = Some(Outcome::LOST);
            return;
        }
        if self.enemies.is_empty() {
            log::info!("Formation destroyed with score {}", self.score);
            self.outcome = Some(Outcome::WON);
            return;
        }

        self.fire_timer += dt;
        if self.fire_timer > self.tuning.fire_interval {
            self.fire_timer = 0.0;
            if let Some(shooter) = self.enemies.choose(&mut self.rng) {
                let r = shooter.rect;
                self.enemy_bullets
                    .push(Vec2::new(r.x + r.w / 2.0 - BULLET_WIDTH / 2.0, r.bottom()));
            }
        }
    }
}

impl Game for InvadersGame {
    fn id(&self) -> GameId {
        GameId::SpaceInvaders
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.move_player(input, dt);
        if input.was_pressed(Button::A) || input.was_pressed(Button::Up) || input.click.is_some() {
            self.shoot();
        }
        self.update_bullets(dt);
        if self.outcome.is_some() {
            return;
        }
        self.update_enemies(dt);
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color::BLACK);

        let p = self.player_rect();
        surface.fill_rect(p.x, p.y, p.w, p.h, Color::GREEN);
        surface.fill_rect(p.x + p.w / 2.0 - 2.0, p.y - 5.0, 4.0, 5.0, Color::GREEN);

        for b in &self.bullets {
            surface.fill_rect(b.x, b.y, BULLET_WIDTH, BULLET_HEIGHT, Color::WHITE);
        }
        for b in &self.enemy_bullets {
            surface.fill_rect(b.x, b.y, BULLET_WIDTH, BULLET_HEIGHT, Color::RED);
        }
        for e in &self.enemies {
            let r = e.rect;
            surface.fill_rect(r.x, r.y, r.w, r.h, e.color());
            surface.fill_rect(r.x + 5.0, r.y + 5.0, 5.0, 5.0, Color::BLACK);
            surface.fill_rect(r.right() - 10.0, r.y + 5.0, 5.0, 5.0, Color::BLACK);
            surface.fill_rect(r.x + r.w / 2.0 - 2.0, r.bottom() - 5.0, 4.0, 2.0, Color::BLACK);
        }

        surface.fill_text(
            &format!("Lives: {}", self.lives),
            Vec2::new(10.0, 20.0),
            16.0,
            TextAlign::Left,
            Color::WHITE,
        );
        surface.fill_text(
            &format!("Score: {}", self.score),
            Vec2::new(WIDTH - 10.0, 20.0),
            16.0,
            TextAlign::Right,
            Color::WHITE,
        );
        match self.outcome {
            Some(o) if o.won => draw_banner(surface, "YOU WIN!", Some(&format!("Score: {}", self.score))),
            Some(_) => draw_banner(surface, "GAME OVER", Some(&format!("Score: {}", self.score))),
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
        self.tuning = InvadersTuning::new(difficulty);
        self.player_x = WIDTH / 2.0 - PLAYER_WIDTH / 2.0;
        self.enemies = build_formation();
        self.march = 1.0;
        self.enemy_speed = self.tuning.enemy_speed;
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.lives = self.tuning.lives;
        self.score = 0;
        self.fire_timer = 0.0;
        self.outcome = None;
        log::info!("Space Invaders started on {}", difficulty);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("lives".into(), Value::from(self.lives));
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_formation_layout() {
        let g = InvadersGame::new(Difficulty::Normal, 1);
        assert_eq!(g.enemies.len(), 40);
        let first = g.enemies[0].rect;
        assert_eq!(first.x, 47.5);
        assert_eq!(first.y, 50.0);
        assert_eq!(g.enemies[8].kind, 1);
        assert_eq!(g.enemies[24].kind, 0);
        let last = g.enemies[39].rect;
        assert_eq!(last.right(), WIDTH - 47.5);
    }

    #[test]
    fn test_points_by_row_and_difficulty() {
        let mut g = InvadersGame::new(Difficulty::Easy, 1);
        // One shot straight into an isolated enemy of each kind
        for (kind, expected) in [(0, 24), (1, 16), (2, 8)] {
            g.score = 0;
            g.enemies = vec![Enemy {
                rect: Rect::new(100.0, 300.0, ENEMY_WIDTH, ENEMY_HEIGHT),
                kind,
            }, Enemy {
                rect: Rect::new(300.0, 60.0, ENEMY_WIDTH, ENEMY_HEIGHT),
                kind: 2,
            }];
            g.bullets = vec![Vec2::new(110.0, 322.0)];
            g.update_bullets(DT);
            assert_eq!(g.score, expected);
            assert_eq!(g.enemies.len(), 1);
        }
    }

    #[test]
    fn test_kill_speeds_up_formation() {
        let mut g = InvadersGame::new(Difficulty::Normal, 1);
        let base = g.enemy_speed;
        let target = g.enemies[36].rect;
        g.bullets = vec![Vec2::new(target.x + 5.0, target.bottom() + 2.0)];
        g.update_bullets(DT);
        assert_eq!(g.enemies.len(), 39);
        assert!((g.enemy_speed - base - 0.02).abs() < 1e-6);
        // Row 4 is kind 1
        assert_eq!(g.score, 20);
    }

    #[test]
    fn test_at_most_three_player_bullets() {
        let mut g = InvadersGame::new(Difficulty::Normal, 1);
        assert!(g.shoot());
        assert!(g.shoot());
        assert!(g.shoot());
        assert!(!g.shoot());
        assert_eq!(g.bullets.len(), 3);
    }

    #[test]
    fn test_edge_contact_reverses_and_drops() {
        let mut g = InvadersGame::new(Difficulty::Normal, 1);
        for e in &mut g.enemies {
            e.rect.x += 47.2;
        }
        let y0 = g.enemies[0].rect.y;
        g.update_enemies(DT);
        assert_eq!(g.march, -1.0);
        assert_eq!(g.enemies[0].rect.y, y0 + ENEMY_DROP);
    }

    #[test]
    fn test_enemy_bullet_costs_a_life() {
        let mut g = InvadersGame::new(Difficulty::Hard, 1);
        g.enemy_bullets = vec![Vec2::new(g.player_x + 10.0, PLAYER_Y - 5.0)];
        g.update_bullets(DT);
        assert_eq!(g.lives, 1);
        assert!(g.enemy_bullets.is_empty());
        g.enemy_bullets = vec![Vec2::new(g.player_x + 10.0, PLAYER_Y - 5.0)];
        g.update_bullets(DT);
        assert_eq!(g.lives, 0);
        assert_eq!(g.outcome(), Some(Outcome::LOST));
    }

    #[test]
    fn test_invasion_loses() {
        let mut g = InvadersGame::new(Difficulty::Normal, 1);
        for e in &mut g.enemies {
            e.rect.y += 200.0;
        }
        g.update(&InputFrame::default(), DT);
        assert_eq!(g.outcome(), Some(Outcome::LOST));
    }

    #[test]
    fn test_clearing_formation_wins() {
        let mut g = InvadersGame::new(Difficulty::Normal, 1);
        g.enemies.clear();
        g.update(&InputFrame::default(), DT);
        assert_eq!(g.outcome(), Some(Outcome::WON));
    }

    #[test]
    fn test_player_moves_while_held_and_clamps() {
        let mut g = InvadersGame::new(Difficulty::Normal, 1);
        let x0 = g.player_x;
        g.update(&InputFrame::default().hold(Button::Left), DT);
        assert!((g.player_x - (x0 - PLAYER_SPEED)).abs() < 1e-3);
        for _ in 0..100 {
            g.update(&InputFrame::default().hold(Button::Left), DT);
        }
        assert_eq!(g.player_x, 0.0);
    }

    #[test]
    fn test_enemies_fire_on_interval() {
        let mut g = InvadersGame::new(Difficulty::Hard, 4);
        // 0.6 s interval
        for _ in 0..35 {
            g.update_enemies(DT);
        }
        assert!(g.enemy_bullets.is_empty());
        g.update_enemies(DT);
        g.update_enemies(DT);
        assert_eq!(g.enemy_bullets.len(), 1);
    }
}
