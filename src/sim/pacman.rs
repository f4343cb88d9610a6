//! Pac-Man
//!
//! Actors live on maze cells and interpolate toward the next cell with a
//! fractional `progress`. Ghosts wander at random without reversing.

use std::f32::consts::PI;

use glam::Vec2;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde_json::{Map, Value};

use super::collision::same_cell;
use super::{Game, GameId, Outcome, weighted_points};
use crate::difficulty::Difficulty;
use crate::per_second;
use crate::platform::input::{Direction, InputFrame};
use crate::renderer::{Color, Surface, TextAlign, draw_banner};
use crate::tuning::PacmanTuning;

pub const COLS: usize = 15;
pub const ROWS: usize = 15;
pub const CELL: f32 = 20.0;

pub const DOT_POINTS: u32 = 10;
pub const PELLET_POINTS: u32 = 50;
pub const GHOST_POINTS: u32 = 200;

const LAYOUT: [&str; ROWS] = [
    "###############",
    "#......#......#",
    "#o##.#...#.##o#",
    "#....#.#.#....#",
    "#.##.......##.#",
    "#....#.#.#....#",
    "#.####.#.####.#",
    "#...... ......#",
    "#.####.#.####.#",
    "#....#.#.#....#",
    "#.##.......##.#",
    "#....#.#.#....#",
    "#o##.#...#.##o#",
    "#......#......#",
    "###############",
];

const PACMAN_START: (i32, i32) = (7, 7);

/// Start cell, heading and speed factor of each ghost
const GHOSTS: [((i32, i32), Direction, f32, Color); 4] = [
    ((1, 1), Direction::Right, 1.0, Color::RED),
    ((13, 1), Direction::Left, 0.9, Color::CYAN),
    ((1, 13), Direction::Up, 0.8, Color::PINK),
    ((13, 13), Direction::Down, 0.7, Color::ORANGE),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Empty,
    Dot,
    Pellet,
}

impl Tile {
    fn from_char(c: char) -> Self {
        match c {
            '#' => Tile::Wall,
            '.' => Tile::Dot,
            'o' => Tile::Pellet,
            _ => Tile::Empty,
        }
    }
}

pub type Maze = [[Tile; COLS]; ROWS];

fn build_maze() -> Maze {
    let mut maze = [[Tile::Empty; COLS]; ROWS];
    for (y, row) in LAYOUT.iter().enumerate() {
        for (x, c) in row.chars().enumerate().take(COLS) {
            maze[y][x] = Tile::from_char(c);
        }
    }
    maze
}

/// Something that walks the maze cell to cell
#[derive(Debug, Clone)]
pub struct Actor {
    pub cell: (i32, i32),
    pub dir: Direction,
    /// Fraction of the way to the next cell, in [0, 1)
    pub progress: f32,
    /// Cells per frame
    pub speed: f32,
}

impl Actor {
    fn new(cell: (i32, i32), dir: Direction, speed: f32) -> Self {
        Self {
            cell,
            dir,
            progress: 0.0,
            speed,
        }
    }

    /// Interpolated position in cell units
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.cell.0 as f32, self.cell.1 as f32) + self.dir.vector() * self.progress
    }

    fn advance_cell(&mut self) {
        let (dx, dy) = self.dir.delta();
        self.cell = (self.cell.0 + dx, self.cell.1 + dy);
    }
}

#[derive(Debug, Clone)]
pub struct Ghost {
    pub actor: Actor,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct PacmanGame {
    difficulty: Difficulty,
    tuning: PacmanTuning,
    rng: Pcg32,
    pub maze: Maze,
    pub pacman: Actor,
    /// Direction the player asked for, applied once the maze allows it
    pub wanted: Direction,
    pub ghosts: Vec<Ghost>,
    /// Seconds of power mode left
    pub power_left: f32,
    pub dots_remaining: usize,
    pub score: u64,
    pub ghosts_eaten: u32,
    outcome: Option<Outcome>,
}

impl PacmanGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut game = Self {
            difficulty,
            tuning: PacmanTuning::new(difficulty),
            rng: Pcg32::seed_from_u64(seed),
            maze: build_maze(),
            pacman: Actor::new(PACMAN_START, Direction::Right, 0.0),
            wanted: Direction::Right,
            ghosts: Vec::new(),
            power_left: 0.0,
            dots_remaining: 0,
            score: 0,
            ghosts_eaten: 0,
            outcome: None,
        };
        game.reset(difficulty);
        game
    }

    pub fn is_powered(&self) -> bool {
        self.power_left > 0.0
    }

    pub fn tile(&self, (x, y): (i32, i32)) -> Tile {
        if x < 0 || y < 0 || x >= COLS as i32 || y >= ROWS as i32 {
            return Tile::Wall;
        }
        self.maze[y as usize][x as usize]
    }

    pub fn can_move(&self, cell: (i32, i32), dir: Direction) -> bool {
        let (dx, dy) = dir.delta();
        self.tile((cell.0 + dx, cell.1 + dy)) != Tile::Wall
    }

    fn open_cells(&self) -> Vec<(i32, i32)> {
        (0..ROWS as i32)
            .flat_map(|y| (0..COLS as i32).map(move |x| (x, y)))
            .filter(|&c| self.tile(c) != Tile::Wall)
            .collect()
    }

    /// Random open direction that is not a reversal, falling back to
    /// reversing at a dead end
    pub fn choose_ghost_direction(&mut self, cell: (i32, i32), current: Direction) -> Direction {
        let options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|&d| d != current.opposite() && self.can_move(cell, d))
            .collect();
        if let Some(&d) = options.choose(&mut self.rng) {
            return d;
        }
        if self.can_move(cell, current.opposite()) {
            current.opposite()
        } else {
            current
        }
    }

    fn eat(&mut self, cell: (i32, i32)) {
        let (x, y) = (cell.0 as usize, cell.1 as usize);
        match self.maze[y][x] {
            Tile::Dot => {
                self.score += weighted_points(DOT_POINTS, self.tuning.score_multiplier);
            }
            Tile::Pellet => {
                self.score += weighted_points(PELLET_POINTS, self.tuning.score_multiplier);
                self.power_left = self.tuning.power_frames as f32 / crate::consts::FRAME_RATE;
                log::debug!("Power mode for {:.1}s", self.power_left);
            }
            Tile::Wall | Tile::Empty => return,
        }
        self.maze[y][x] = Tile::Empty;
        self.dots_remaining = self.dots_remaining.saturating_sub(1);
        if self.dots_remaining == 0 {
            log::info!("Pac-Man cleared the maze with score {}", self.score);
            self.outcome = Some(Outcome::WON);
        }
    }

    fn move_pacman(&mut self, dt: f32) {
        let cell = self.pacman.cell;
        if self.wanted != self.pacman.dir && self.can_move(cell, self.wanted) {
            self.pacman.dir = self.wanted;
            self.pacman.progress = 0.0;
        }
        if !self.can_move(cell, self.pacman.dir) {
            self.pacman.progress = 0.0;
            return;
        }
        self.pacman.progress += per_second(self.pacman.speed) * dt;
        if self.pacman.progress >= 1.0 {
            self.pacman.advance_cell();
            self.pacman.progress = 0.0;
            self.eat(self.pacman.cell);
        }
    }

    fn move_ghosts(&mut self, dt: f32) {
        let slow = if self.is_powered() { 0.5 } else { 1.0 };
        for i in 0..self.ghosts.len() {
            let mut actor = self.ghosts[i].actor.clone();
            actor.progress += per_second(actor.speed) * slow * dt;
            if actor.progress >= 1.0 {
                actor.advance_cell();
                actor.progress = 0.0;
                actor.dir = self.choose_ghost_direction(actor.cell, actor.dir);
            }
            if !self.can_move(actor.cell, actor.dir) {
                actor.dir = self.choose_ghost_direction(actor.cell, actor.dir);
                actor.progress = 0.0;
            }
            self.ghosts[i].actor = actor;
        }
    }

    fn check_ghosts(&mut self) {
        let pac = self.pacman.position();
        for i in 0..self.ghosts.len() {
            if !same_cell(self.ghosts[i].actor.position(), pac) {
                continue;
            }
            if !self.is_powered() {
                log::info!("Pac-Man caught with score {}", self.score);
                self.outcome = Some(Outcome::LOST);
                return;
            }
            let open = self.open_cells();
            let home = open
                .iter()
                .copied()
                .filter(|&c| c != self.pacman.cell)
                .collect::<Vec<_>>()
                .choose(&mut self.rng)
                .copied()
                .unwrap_or(GHOSTS[i % GHOSTS.len()].0);
            let ghost = &mut self.ghosts[i].actor;
            ghost.cell = home;
            ghost.progress = 0.0;
            self.score += weighted_points(GHOST_POINTS, self.tuning.score_multiplier);
            self.ghosts_eaten += 1;
        }
    }
}

impl Game for PacmanGame {
    fn id(&self) -> GameId {
        GameId::Pacman
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn update(&mut self, input: &InputFrame, dt: f32) {
        if self.outcome.is_some() {
            return;
        }
        if let Some(d) = input.direction() {
            self.wanted = d;
        }
        self.move_pacman(dt);
        if self.outcome.is_some() {
            return;
        }
        self.move_ghosts(dt);
        self.check_ghosts();
        self.power_left = (self.power_left - dt).max(0.0);
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.clear(Color::BLACK);
        let center = |p: Vec2| p * CELL + Vec2::splat(CELL / 2.0);

        for (y, row) in self.maze.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                let c = center(Vec2::new(x as f32, y as f32));
                match tile {
                    Tile::Wall => surface.fill_rect(x as f32 * CELL, y as f32 * CELL, CELL, CELL, Color::BLUE),
                    Tile::Dot => surface.fill_circle(c, CELL / 10.0, Color::WHITE),
                    Tile::Pellet => surface.fill_circle(c, CELL / 4.0, Color::WHITE),
                    Tile::Empty => {}
                }
            }
        }

        // Wedge-shaped mouth cut from a disc
        let p = center(self.pacman.position());
        let facing = match self.pacman.dir {
            Direction::Right => 0.0,
            Direction::Down => PI / 2.0,
            Direction::Left => PI,
            Direction::Up => -PI / 2.0,
        };
        let mouth = 0.35;
        let mut body = vec![p];
        for i in 0..=16 {
            let a = facing + mouth + (2.0 * PI - 2.0 * mouth) * i as f32 / 16.0;
            body.push(p + crate::heading(a) * CELL / 2.0);
        }
        surface.fill_polygon(&body, Color::YELLOW);

        for g in &self.ghosts {
            let c = center(g.actor.position());
            let color = if self.is_powered() { Color::BLUE } else { g.color };
            surface.fill_circle(c - Vec2::new(0.0, 2.0), CELL / 2.0, color);
            surface.fill_rect(c.x - CELL / 2.0, c.y - 2.0, CELL, CELL / 2.0, color);
            for eye in [-CELL / 5.0, CELL / 5.0] {
                let e = c + Vec2::new(eye, -CELL / 5.0);
                surface.fill_circle(e, CELL / 6.0, Color::WHITE);
                surface.fill_circle(e + g.actor.dir.vector() * 2.0, CELL / 12.0, Color::BLACK);
            }
        }

        surface.fill_text(
            &format!("Score: {}", self.score),
            Vec2::new(4.0, 14.0),
            12.0,
            TextAlign::Left,
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
        self.tuning = PacmanTuning::new(difficulty);
        self.maze = build_maze();
        self.dots_remaining = self
            .maze
            .iter()
            .flatten()
            .filter(|t| matches!(t, Tile::Dot | Tile::Pellet))
            .count();
        self.pacman = Actor::new(PACMAN_START, Direction::Right, self.tuning.pacman_speed);
        self.wanted = Direction::Right;
        let ghost_speed = self.tuning.ghost_speed;
        self.ghosts = GHOSTS
            .iter()
            .map(|&(cell, dir, factor, color)| Ghost {
                actor: Actor::new(cell, dir, ghost_speed * factor),
                color,
            })
            .collect();
        self.power_left = 0.0;
        self.score = 0;
        self.ghosts_eaten = 0;
        self.outcome = None;
        log::info!("Pac-Man started on {}", difficulty);
    }

    fn score_details(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("dotsRemaining".into(), Value::from(self.dots_remaining));
        m
    }
}
