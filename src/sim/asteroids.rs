//! Asteroids
//!
//! Continuous toroidal field. The ship turns and thrusts with inertia, rocks
//! split on every hit and a cleared field starts the next level.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

use super::collision::{circles_overlap, wrap_position};
use super::{Game, GameId, Outcome, weighted_points};
use crate::difficulty::Difficulty;
use crate::heading;
use crate::platform::input::{Button, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::AsteroidsTuning;

pub const WIDTH: f32 = 400.0;
pub const HEIGHT: f32 = 400.0;
pub const SHIP_RADIUS: f32 = 10.0;
/// rad/s
pub const TURN_SPEED: f32 = TAU;
/// px/s²
pub const SHIP_THRUST: f32 = 30.0;
/// Velocity kept per frame while coasting
pub const FRICTION: f32 = 0.7;
/// px/s
pub const BULLET_SPEED: f32 = 500.0;
pub const BULLET_MAX: usize = 10;
/// Seconds
pub const BULLET_LIFE: f32 = 2.0;
pub const LARGE_RADIUS: f32 = 30.0;
/// Top drift speed per axis before the difficulty multiplier (px/s)
pub const ASTEROID_SPEED: f32 = 50.0;
const ASTEROID_JAG: f32 = 0.4;
pub const EXPLODE_TIME: f32 = 0.3;
pub const INVULNERABLE_TIME: f32 = 3.0;
const BLINK_TIME: f32 = 0.1;
/// Minimum spawn distance from the ship before the difficulty clearance
const BASE_CLEARANCE: f32 = SHIP_RADIUS * 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    /// The child size when an asteroid splits.
    pub fn child_size(self) -> Option<AsteroidSize> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }

    /// Base points before the difficulty multiplier
    pub fn points(self) -> u32 {
        match self {
            AsteroidSize::Large => 20,
            AsteroidSize::Medium => 50,
            AsteroidSize::Small => 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub pos: Vec2,
    /// px/s
    pub vel: Vec2,
    pub radius: f32,
    pub size: AsteroidSize,
    /// Outline rotation
    pub angle: f32,
    /// Per-vertex radius factors
    pub offsets: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds alive
    pub age: f32,
}

#[derive(Debug, Clone)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Radians, screen coordinates (`-π/2` faces up)
    pub angle: f32,
    pub thrusting: bool,
    /// Time left in the explosion, if exploding
    pub exploding: Option<f32>,
    /// Seconds of invulnerability left
    pub invulnerable: f32,
}

impl Ship {
    fn spawn() -> Self {
        Self {
            pos: Vec2::new(WIDTH / 2.0, HEIGHT / 2.0),
            vel: Vec2::ZERO,
            angle: -PI / 2.0,
            thrusting: false,
            exploding: None,
            invulnerable: INVULNERABLE_TIME,
        }
    }

    /// Tip of the hull, where bullets leave
    pub fn nose(&self) -> Vec2 {
        self.pos + heading(self.angle) * SHIP_RADIUS * 4.0 / 3.0
    }

    pub fn is_vulnerable(&self) -> bool {
        self.exploding.is_none() && self.invulnerable <= 0.0
    }
}

#[derive(Debug, Clone)]
pub struct AsteroidsGame {
    difficulty: Difficulty,
    tuning: AsteroidsTuning,
    rng: Pcg32,
    pub ship: Ship,
    pub asteroids: Vec<Asteroid>,
    pub bullets: Vec<Bullet>,
    pub lives: u32,
    pub level: u32,
    pub score: u64,
    outcome: Option<Outcome>,
}

impl AsteroidsGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: AsteroidsTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            ship: Ship::spawn(),
            asteroids: Vec::new(),
            bullets: Vec::new(),
            lives: 0,
            level: 1,
            score: 0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    /// Distance from the ship inside which no rock may spawn
    pub fn spawn_clearance(&self) -> f32 {
        BASE_CLEARANCE + self.tuning.spawn_clearance
    }

    fn new_asteroid(&mut self, pos: Vec2, radius: f32, size: AsteroidSize) -> Asteroid {
        let top = ASTEROID_SPEED * self.tuning.speed_multiplier;
        let mut axis = || {
            let v = self.rng.random::<f32>() * top;
            if self.rng.random_bool(0.5) { v } else { -v }
        };
        let vel = Vec2::new(axis(), axis());
        let verts = self.rng.random_range(7..14);
        let offsets = (0..verts)
            .map(|_| self.rng.random::<f32>() * ASTEROID_JAG * 2.0 + 1.0 - ASTEROID_JAG)
            .collect();
        Asteroid {
            pos,
            vel,
            radius,
            size,
            angle: self.rng.random::<f32>() * TAU,
            offsets,
        }
    }

    /// Fill the field with large rocks for the current level
    fn spawn_belt(&mut self) {
        self.asteroids.clear();
        let count = self.tuning.asteroid_count(self.level);
        let clearance = self.spawn_clearance();
        for _ in 0..count {
            let mut pos = self.random_point();
            let mut tries = 0;
            while pos.distance(self.ship.pos) < clearance && tries < 64 {
                pos = self.random_point();
                tries += 1;
            }
            if pos.distance(self.ship.pos) < clearance {
                // Field too crowded around the ship: push straight out
                let dir = heading(self.rng.random::<f32>() * TAU);
                let p = self.ship.pos + dir * clearance;
                pos = Vec2::new(p.x.rem_euclid(WIDTH), p.y.rem_euclid(HEIGHT));
            }
            let rock = self.new_asteroid(pos, LARGE_RADIUS, AsteroidSize::Large);
            self.asteroids.push(rock);
        }
        log::debug!("Asteroids level {} with {} rocks", self.level, count);
    }

    fn random_point(&mut self) -> Vec2 {
        Vec2::new(self.rng.random::<f32>() * WIDTH, self.rng.random::<f32>() * HEIGHT)
    }

    /// Remove the rock at `index`, score it and replace it with its children
    pub fn destroy_asteroid(&mut self, index: usize) {
        if index >= self.asteroids.len() {
            return;
        }
        let rock = self.asteroids.swap_remove(index);
        self.score += weighted_points(rock.size.points(), self.tuning.score_multiplier);
        if let Some(child) = rock.size.child_size() {
            let radius = (rock.radius / 2.0).ceil();
            for _ in 0..2 {
                let a = self.new_asteroid(rock.pos, radius, child);
                self.asteroids.push(a);
            }
        }
    }

    fn fire(&mut self) {
        if self.ship.exploding.is_some() || self.bullets.len() >= BULLET_MAX {
            return;
        }
        self.bullets.push(Bullet {
            pos: self.ship.nose(),
            vel: heading(self.ship.angle) * BULLET_SPEED,
            age: 0.0,
        });
    }

    fn update_ship(&mut self, input: &InputFrame, dt: f32) {
        let ship = &mut self.ship;
        if let Some(left) = ship.exploding {
            let left = left - dt;
            if left > 0.0 {
                ship.exploding = Some(left);
            } else {
                *ship = Ship::spawn();
            }
            return;
        }
        ship.invulnerable = (ship.invulnerable - dt).max(0.0);

        if input.is_held(Button::Left) {
            ship.angle -= TURN_SPEED * dt;
        } else if input.is_held(Button::Right) {
            ship.angle += TURN_SPEED * dt;
        }
        ship.angle = crate::normalize_angle(ship.angle);

        ship.thrusting = input.is_held(Button::Up);
        if ship.thrusting {
            ship.vel += heading(ship.angle) * SHIP_THRUST * dt;
        } else {
            ship.vel *= FRICTION.powf(dt * crate::consts::FRAME_RATE);
        }
        ship.pos = wrap_position(ship.pos + ship.vel * dt, WIDTH, HEIGHT, SHIP_RADIUS);
    }

    fn ship_hit(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.ship.exploding = Some(EXPLODE_TIME);
        self.ship.thrusting = false;
        log::debug!("Ship destroyed, {} lives left", self.lives);
        if self.lives == 0 {
            log::info!("Asteroids over at level {} with score {}", self.level, self.score);
            self.outcome = Some(Outcome::LOST);
        }
    }

    fn update_bullets(&mut self, dt: f32) {
        let mut i = 0;
        while i < self.bullets.len() {
            let b = &mut self.bullets[i];
            b.age += dt;
            if b.age > BULLET_LIFE {
                self.bullets.swap_remove(i);
                continue;
            }
            b.pos = wrap_position(b.pos + b.vel * dt, WIDTH, HEIGHT, 0.0);
            let pos = b.pos;
            match self.asteroids.iter().position(|a| a.pos.distance(pos) < a.radius) {
                Some(hit) => {
                    self.bullets.swap_remove(i);
                    self.destroy_asteroid(hit);
                }
                None => i += 1,
            }
        }
    }
}

impl Game for AsteroidsGame {
    fn id(&self) -> GameId {
        GameId::Asteroids
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        if input.was_pressed(Button::A) {
            self.fire();
        }
        self.update_ship(input, dt);

        for rock in &mut self.asteroids {
            rock.pos = wrap_position(rock.pos + rock.vel * dt, WIDTH, HEIGHT, rock.radius);
        }
        if self.ship.is_vulnerable()
            && self
                .asteroids
                .iter()
                .any(|a| circles_overlap(self.ship.pos, SHIP_RADIUS, a.pos, a.radius))
        {
            self.ship_hit();
            if self.outcome.is_some() {
                return;
            }
        }

        self.update_bullets(dt);

        if self.asteroids.is_empty() {
            self.level += 1;
            self.spawn_belt();
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color::BLACK);

        for rock in &self.asteroids {
            let n = rock.offsets.len() as f32;
            let points: Vec<Vec2> = rock
                .offsets
                .iter()
                .enumerate()
                .map(|(i, k)| rock.pos + heading(rock.angle + i as f32 * TAU / n) * rock.radius * k)
                .collect();
            surface.fill_polygon(&points, Color::GRAY);
        }

        for b in &self.bullets {
            surface.fill_circle(b.pos, 2.0, Color::PINK);
        }

        let ship = &self.ship;
        if let Some(left) = ship.exploding {
            let grow = 1.0 + (EXPLODE_TIME - left) / EXPLODE_TIME * 0.5;
            surface.fill_circle(ship.pos, SHIP_RADIUS * 1.5 * grow, Color::RED);
            surface.fill_circle(ship.pos, SHIP_RADIUS * 1.2 * grow, Color::ORANGE);
            surface.fill_circle(ship.pos, SHIP_RADIUS * 0.8 * grow, Color::YELLOW);
        } else if self.outcome.is_none() {
            let blink_off = ship.invulnerable > 0.0 && (ship.invulnerable / BLINK_TIME) as u32 % 2 == 1;
            if !blink_off {
                let fwd = heading(ship.angle);
                let side = Vec2::new(-fwd.y, fwd.x);
                let hull = [
                    ship.nose(),
                    ship.pos - fwd * SHIP_RADIUS * 2.0 / 3.0 + side * SHIP_RADIUS,
                    ship.pos - fwd * SHIP_RADIUS * 2.0 / 3.0 - side * SHIP_RADIUS,
                ];
                surface.fill_polygon(&hull, Color::WHITE);
                if ship.thrusting {
                    let flame = [
                        ship.pos - fwd * SHIP_RADIUS * 2.0 / 3.0 + side * SHIP_RADIUS * 0.5,
                        ship.pos - fwd * SHIP_RADIUS * 2.0,
                        ship.pos - fwd * SHIP_RADIUS * 2.0 / 3.0 - side * SHIP_RADIUS * 0.5,
                    ];
                    surface.fill_polygon(&flame, Color::RED);
                }
            }
        }

        surface.fill_text(
            &format!("Score: {}", self.score),
            Vec2::new(8.0, 18.0),
            14.0,
            TextAlign::Left,
            Color::WHITE,
        );
        surface.fill_text(
            &format!("Level {}  Lives {}", self.level, self.lives),
            Vec2::new(WIDTH - 8.0, 18.0),
            14.0,
            TextAlign::Right,
            Color::WHITE,
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
        self.tuning = AsteroidsTuning::new(difficulty);
        self.ship = Ship::spawn();
        self.bullets.clear();
        self.lives = self.tuning.lives;
        self.level = 1;
        self.score = 0;
        self.outcome = None;
        self.spawn_belt();
        log::info!("Asteroids started on {}", difficulty);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("level".into(), Value::from(self.level));
        m
    }
}
