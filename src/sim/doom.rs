//! Doom
//!
//! Grid-map first-person shooter. The map is 16x16 cells of unit size; the
//! view is produced by casting one DDA ray per screen column.

use std::f32::consts::PI;

use glam::{IVec2, Vec2};
use serde_json::{Map, Value};

use super::{Game, GameId, Outcome};
use crate::difficulty::Difficulty;
use crate::platform::input::{Button, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::DoomTuning;
use crate::{heading, normalize_angle, per_second};

pub const MAP_SIZE: usize = 16;
pub const VIEW_WIDTH: f32 = 320.0;
pub const VIEW_HEIGHT: f32 = 240.0;
pub const FOV: f32 = PI / 3.0;
pub const MAX_DEPTH: f32 = 20.0;

/// rad/frame
pub const TURN_SPEED: f32 = 0.03;
/// Seconds between shots
pub const FIRE_COOLDOWN: f32 = 0.5;
pub const SHOT_DAMAGE: i32 = 25;
pub const SHOT_RANGE: f32 = 5.0;
/// Largest aim error that still hits (rad)
pub const SHOT_CONE: f32 = 0.3;
pub const KILL_POINTS: u64 = 100;
/// Enemies notice the player inside this radius
pub const CHASE_RANGE: f32 = 8.0;
/// cells/frame
pub const CHASE_SPEED: f32 = 0.02;
pub const ATTACK_RANGE: f32 = 0.5;
/// Health lost per frame while an enemy is in reach
pub const ATTACK_DAMAGE: f32 = 1.0;

const FLASH_TIME: f32 = 0.15;

const START: Vec2 = Vec2::new(2.5, 2.5);
const ENEMY_SPAWNS: [Vec2; 4] = [
    Vec2::new(5.5, 5.5),
    Vec2::new(10.5, 5.5),
    Vec2::new(5.5, 10.5),
    Vec2::new(10.5, 10.5),
];

/// 0 is floor, anything else is a wall of that style
pub const MAP: [[u8; MAP_SIZE]; MAP_SIZE] = [
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 1, 1, 1, 0, 0, 0, 0, 1, 1, 1, 0, 0, 1],
    [1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1],
    [1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1],
    [1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1],
    [1, 0, 0, 1, 1, 1, 0, 0, 0, 0, 1, 1, 1, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1],
    [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
];

const WALL_COLORS: [Color; 4] = [
    Color(0x8b0000),
    Color(0xa52a2a),
    Color(0xb22222),
    Color(0xcd5c5c),
];

/// Map cell at `cell`; everything outside the map is solid
fn wall_at(cell: IVec2) -> u8 {
    if cell.x < 0 || cell.y < 0 || cell.x >= MAP_SIZE as i32 || cell.y >= MAP_SIZE as i32 {
        return 1;
    }
    MAP[cell.y as usize][cell.x as usize]
}

pub fn is_wall(pos: Vec2) -> bool {
    wall_at(pos.floor().as_ivec2()) != 0
}

/// First wall along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Euclidean distance from the origin (not fisheye corrected)
    pub distance: f32,
    pub wall: u8,
    /// Hit a wall face running north-south
    pub vertical: bool,
}

/// Digital differential analyzer: walk grid lines until a wall or
/// [`MAX_DEPTH`]
pub fn cast_ray(origin: Vec2, angle: f32) -> RayHit {
    let dir = heading(angle);
    let mut cell = origin.floor().as_ivec2();
    let delta = Vec2::new(
        if dir.x == 0.0 { f32::MAX } else { (1.0 / dir.x).abs() },
        if dir.y == 0.0 { f32::MAX } else { (1.0 / dir.y).abs() },
    );
    let step = IVec2::new(if dir.x < 0.0 { -1 } else { 1 }, if dir.y < 0.0 { -1 } else { 1 });
    let mut side = Vec2::new(
        if dir.x == 0.0 {
            f32::MAX
        } else if dir.x < 0.0 {
            (origin.x - cell.x as f32) * delta.x
        } else {
            (cell.x as f32 + 1.0 - origin.x) * delta.x
        },
        if dir.y == 0.0 {
            f32::MAX
        } else if dir.y < 0.0 {
            (origin.y - cell.y as f32) * delta.y
        } else {
            (cell.y as f32 + 1.0 - origin.y) * delta.y
        },
    );

    loop {
        let vertical = side.x < side.y;
        let distance = if vertical {
            let d = side.x;
            side.x += delta.x;
            cell.x += step.x;
            d
        } else {
            let d = side.y;
            side.y += delta.y;
            cell.y += step.y;
            d
        };
        if distance >= MAX_DEPTH {
            return RayHit {
                distance: MAX_DEPTH,
                wall: 0,
                vertical,
            };
        }
        let wall = wall_at(cell);
        if wall != 0 {
            return RayHit {
                distance,
                wall,
                vertical,
            };
        }
    }
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub pos: Vec2,
    pub health: i32,
}

#[derive(Debug, Clone)]
pub struct DoomGame {
    difficulty: Difficulty,
    tuning: DoomTuning,
    pub pos: Vec2,
    /// Radians, 0 faces +x
    pub angle: f32,
    pub health: f32,
    pub ammo: u32,
    pub enemies: Vec<Enemy>,
    pub score: u64,
    pub kills: u32,
    cooldown: f32,
    flash: f32,
    outcome: Option<Outcome>,
}

impl DoomGame {
    /// The raycaster has no randomness; the seed is accepted for uniformity
    pub fn new(difficulty: Difficulty, _seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: DoomTuning::new(difficulty),
            pos: START,
            angle: 0.0,
            health: 0.0,
            ammo: 0,
            enemies: Vec::new(),
            score: 0,
            kills: 0,
            cooldown: 0.0,
            flash: 0.0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    /// Move with per-axis wall checks so the mover slides along walls
    fn slide(pos: Vec2, step: Vec2) -> Vec2 {
        let mut p = pos;
        if !is_wall(Vec2::new(p.x + step.x, p.y)) {
            p.x += step.x;
        }
        if !is_wall(Vec2::new(p.x, p.y + step.y)) {
            p.y += step.y;
        }
        p
    }

    /// Fire along the view direction. Returns whether a round was spent.
    pub fn shoot(&mut self) -> bool {
        if self.ammo == 0 || self.cooldown > 0.0 {
            return false;
        }
        self.ammo -= 1;
        self.cooldown = FIRE_COOLDOWN;
        self.flash = FLASH_TIME;

        let target = self.enemies.iter().position(|e| {
            let to = e.pos - self.pos;
            let dist = to.length();
            if dist >= SHOT_RANGE {
                return false;
            }
            let bearing = to.y.atan2(to.x);
            normalize_angle(bearing - self.angle).abs() < SHOT_CONE
                && cast_ray(self.pos, bearing).distance >= dist
        });
        if let Some(i) = target {
            self.enemies[i].health -= SHOT_DAMAGE;
            if self.enemies[i].health <= 0 {
                self.enemies.remove(i);
                self.score += KILL_POINTS;
                self.kills += 1;
                log::debug!("Enemy down, {} left", self.enemies.len());
            }
        }

        if self.enemies.is_empty() {
            log::info!("Doom cleared with score {}", self.score);
            self.outcome = Some(Outcome::WON);
        } else if self.ammo == 0 {
            log::info!("Out of ammo with {} enemies left", self.enemies.len());
            self.outcome = Some(Outcome::LOST);
        }
        true
    }

    fn move_enemies(&mut self, dt: f32) {
        let chase = per_second(CHASE_SPEED) * dt;
        let mut damage = 0.0;
        for e in &mut self.enemies {
            let to = self.pos - e.pos;
            let dist = to.length();
            if dist < ATTACK_RANGE {
                damage += per_second(ATTACK_DAMAGE) * dt;
            } else if dist < CHASE_RANGE {
                e.pos = Self::slide(e.pos, to / dist * chase);
            }
        }
        if damage > 0.0 {
            self.health -= damage;
            if self.health <= 0.0 {
                self.health = 0.0;
                log::info!("Player died with score {}", self.score);
                self.outcome = Some(Outcome::LOST);
            }
        }
    }

    fn render_walls(&self, surface: &mut dyn Surface, w: f32, h: f32) -> Vec<f32> {
        let columns = w as usize;
        let mut depth = Vec::with_capacity(columns);
        for i in 0..columns {
            let ray_angle = self.angle - FOV / 2.0 + FOV * i as f32 / w;
            let hit = cast_ray(self.pos, ray_angle);
            let corrected = (hit.distance * (ray_angle - self.angle).cos()).max(1e-3);
            depth.push(corrected);
            if hit.wall == 0 {
                continue;
            }
            let wall_h = (h / corrected * 0.5).min(h);
            let mut bright = 1.0 - (hit.distance / 10.0).min(0.8);
            if hit.vertical {
                bright *= 0.8;
            }
            let base = WALL_COLORS[(hit.wall as usize - 1) % WALL_COLORS.len()];
            surface.fill_rect(i as f32, (h - wall_h) / 2.0, 1.0, wall_h, base.shade(bright));
        }
        depth
    }

    fn render_enemies(&self, surface: &mut dyn Surface, depth: &[f32], w: f32, h: f32) {
        let mut visible: Vec<(f32, f32)> = self
            .enemies
            .iter()
            .filter_map(|e| {
                let to = e.pos - self.pos;
                let rel = normalize_angle(to.y.atan2(to.x) - self.angle);
                (rel.abs() < FOV).then(|| (to.length(), rel))
            })
            .collect();
        // Painter's order: far first
        visible.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (dist, rel) in visible {
            let size = (h / dist.max(1e-3) * 0.5).min(h);
            let cx = w / 2.0 + rel / FOV * w;
            let column = (cx.max(0.0) as usize).min(depth.len().saturating_sub(1));
            if depth.get(column).is_some_and(|&d| d < dist) {
                continue;
            }
            let color = Color::RED.shade(1.0 - (dist / 10.0).min(0.8));
            surface.fill_rect(cx - size / 2.0, (h - size) / 2.0, size, size, color);
        }
    }
}

impl Game for DoomGame {
    fn id(&self) -> GameId {
        GameId::Doom
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        self.cooldown = (self.cooldown - dt).max(0.0);
        self.flash = (self.flash - dt).max(0.0);

        let stride = per_second(self.tuning.player_speed) * dt;
        let forward = heading(self.angle) * stride;
        if input.is_held(Button::Up) {
            self.pos = Self::slide(self.pos, forward);
        }
        if input.is_held(Button::Down) {
            self.pos = Self::slide(self.pos, -forward);
        }
        let turn = per_second(TURN_SPEED) * dt;
        if input.is_held(Button::Left) {
            self.angle -= turn;
        }
        if input.is_held(Button::Right) {
            self.angle += turn;
        }
        self.angle = normalize_angle(self.angle);

        if input.was_pressed(Button::A) {
            self.shoot();
            if self.outcome.is_some() {
                return;
            }
        }
        self.move_enemies(dt);
    }

    fn render(&self, surface: &mut dyn Surface) {
        let (w, h) = surface.size();
        surface.clear(Color::BLACK);
        surface.fill_rect(0.0, 0.0, w, h / 2.0, Color(0x330011));
        surface.fill_rect(0.0, h / 2.0, w, h / 2.0, Color(0x1a0000));

        let depth = self.render_walls(surface, w, h);
        self.render_enemies(surface, &depth, w, h);

        // Weapon
        let (gw, gh) = (w / 3.0, h / 4.0);
        surface.fill_rect((w - gw) / 2.0, h - gh, gw, gh / 2.0, Color::DARK_GRAY);
        if self.flash > 0.0 {
            surface.fill_circle(Vec2::new(w / 2.0, h - gh - 10.0), 10.0, Color::YELLOW);
        }

        surface.fill_rect(10.0, h - 60.0, 150.0, 50.0, Color::BLACK);
        for (i, line) in [
            format!("Health: {}", self.health.ceil() as i32),
            format!("Ammo: {}", self.ammo),
            format!("Score: {}", self.score),
        ]
        .iter()
        .enumerate()
        {
            surface.fill_text(
                line,
                Vec2::new(20.0, h - 40.0 + i as f32 * 15.0),
                12.0,
                TextAlign::Left,
                Color::WHITE,
            );
        }

        match self.outcome {
            Some(o) if o.won => draw_banner(surface, "LEVEL CLEARED", Some(&format!("Score: {}", self.score))),
            Some(_) => draw_banner(surface, "YOU DIED", Some(&format!("Score: {}", self.score))),
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
        self.tuning = DoomTuning::new(difficulty);
        self.pos = START;
        self.angle = 0.0;
        self.health = self.tuning.player_health as f32;
        self.ammo = self.tuning.ammo;
        self.enemies = ENEMY_SPAWNS
            .iter()
            .map(|&pos| Enemy {
                pos,
                health: self.tuning.enemy_health,
            })
            .collect();
        self.score = 0;
        self.kills = 0;
        self.cooldown = 0.0;
        self.flash = 0.0;
        self.outcome = None;
        log::info!("Doom started on {}", difficulty);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("kills".into(), Value::from(self.kills));
        m.insert("health".into(), Value::from(self.health.ceil() as i64));
        m
    }
}
