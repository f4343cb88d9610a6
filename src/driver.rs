//! Frame driver
//!
//! Turns host ticks into fixed simulation steps, owns the Running / Paused /
//! Over state machine and writes the score ledger once per finished run.
//! [`FrameLoop`] keeps exactly one tick outstanding and can be cancelled.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use chrono::Utc;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::difficulty::Difficulty;
use crate::highscores::{HighScoreEntry, HighScores};
use crate::persistence::Storage;
use crate::platform::input::{Button, InputAggregator, InputFrame};
use crate::platform::scheduler::{Scheduler, TickHandle};
use crate::renderer::{Surface, draw_banner};
use crate::sim::{Game, GameState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Running,
    Paused,
    Over,
}

impl DriverPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverPhase::Running => "running",
            DriverPhase::Paused => "paused",
            DriverPhase::Over => "over",
        }
    }
}

pub struct FrameDriver {
    state: GameState,
    phase: DriverPhase,
    input: Rc<RefCell<InputAggregator>>,
    storage: Rc<RefCell<dyn Storage>>,
    surface: Option<Box<dyn Surface>>,
    accumulator: f32,
    /// Host timestamp of the previous frame (ms)
    last_time: Option<f64>,
    /// Ledger already written for this run
    recorded: bool,
    warned_no_surface: bool,
    /// Edges from a frame that ran no simulation step
    carry: Option<InputFrame>,
    frames: u64,
}

impl FrameDriver {
    pub fn new(state: GameState, input: Rc<RefCell<InputAggregator>>, storage: Rc<RefCell<dyn Storage>>) -> Self {
        log::info!("Driver ready for {} on {}", state.id(), state.difficulty());
        Self {
            state,
            phase: DriverPhase::Running,
            input,
            storage,
            surface: None,
            accumulator: 0.0,
            last_time: None,
            recorded: false,
            warned_no_surface: false,
            carry: None,
            frames: 0,
        }
    }

    pub fn set_surface(&mut self, surface: Box<dyn Surface>) {
        self.surface = Some(surface);
        self.warned_no_surface = false;
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Restart the current game at `difficulty`
    pub fn reset(&mut self, difficulty: Difficulty) {
        self.state.reset(difficulty);
        self.restart();
    }

    /// Swap in another game and start it
    pub fn load(&mut self, state: GameState) {
        log::info!("Switching to {}", state.id());
        self.state = state;
        self.restart();
    }

    fn restart(&mut self) {
        self.phase = DriverPhase::Running;
        self.accumulator = 0.0;
        self.recorded = false;
        self.carry = None;
        self.input.borrow_mut().clear();
    }

    /// Run one host frame. Returns the number of simulation steps taken.
    pub fn frame(&mut self, timestamp_ms: f64) -> u32 {
        let dt = match self.last_time {
            Some(prev) => ((timestamp_ms - prev) / 1000.0) as f32,
            None => SIM_DT,
        };
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.last_time = Some(timestamp_ms);
        self.frames += 1;

        let mut input = self.input.borrow_mut().snapshot();
        if let Some(earlier) = self.carry.take() {
            input.absorb_edges(&earlier);
        }

        if input.was_pressed(Button::Pause) {
            self.phase = match self.phase {
                DriverPhase::Running => DriverPhase::Paused,
                DriverPhase::Paused => DriverPhase::Running,
                DriverPhase::Over => DriverPhase::Over,
            };
            log::debug!("Phase now {}", self.phase.as_str());
        }

        let mut steps = 0;
        if self.phase == DriverPhase::Running {
            self.accumulator += dt;
            let mut step_input = input.clone();
            while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
                self.state.update(&step_input, SIM_DT);
                self.accumulator -= SIM_DT;
                steps += 1;
                if steps == 1 {
                    step_input = input.without_edges();
                }
                if self.state.outcome().is_some() {
                    break;
                }
            }
            if steps == 0 {
                input.pressed.remove(Button::Pause);
                self.carry = Some(input);
            }
            if self.state.outcome().is_some() {
                self.finish();
            }
        }

        self.render();
        steps
    }

    /// Running -> Over, writing the ledger once
    fn finish(&mut self) {
        self.phase = DriverPhase::Over;
        self.accumulator = 0.0;
        if self.recorded {
            return;
        }
        self.recorded = true;

        let id = self.state.id();
        let score = self.state.score();
        let entry = HighScoreEntry::new(score, self.state.difficulty(), Utc::now()).with_details(self.state.score_details());
        match HighScores::record(&mut *self.storage.borrow_mut(), id, entry) {
            Ok(Some(rank)) => log::info!("{} finished with {} (rank {})", id, score, rank),
            Ok(None) => log::info!("{} finished with {}", id, score),
            Err(e) => log::error!("Failed to save high score for {}: {}", id, e),
        }
    }

    fn render(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            if !self.warned_no_surface {
                log::warn!("No render surface, skipping draw");
                self.warned_no_surface = true;
            }
            return;
        };
        self.state.render(surface.as_mut());
        if self.phase == DriverPhase::Paused {
            draw_banner(surface.as_mut(), "PAUSED", Some("Press P to resume"));
        }
    }
}

struct LoopInner {
    driver: Rc<RefCell<FrameDriver>>,
    scheduler: Rc<dyn Scheduler>,
    alive: Cell<bool>,
    handle: Cell<Option<TickHandle>>,
}

/// Self re-arming tick loop over a [`FrameDriver`]
pub struct FrameLoop {
    inner: Rc<LoopInner>,
}

impl FrameLoop {
    pub fn start(driver: Rc<RefCell<FrameDriver>>, scheduler: Rc<dyn Scheduler>) -> Self {
        let inner = Rc::new(LoopInner {
            driver,
            scheduler,
            alive: Cell::new(true),
            handle: Cell::new(None),
        });
        arm(&inner);
        log::debug!("Frame loop started");
        Self { inner }
    }

    pub fn driver(&self) -> Rc<RefCell<FrameDriver>> {
        self.inner.driver.clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.alive.get()
    }

    /// Cancel the outstanding tick. Idempotent.
    pub fn stop(&self) {
        if !self.inner.alive.replace(false) {
            return;
        }
        if let Some(handle) = self.inner.handle.take() {
            self.inner.scheduler.cancel_tick(handle);
        }
        log::debug!("Frame loop stopped");
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn arm(inner: &Rc<LoopInner>) {
    let weak: Weak<LoopInner> = Rc::downgrade(inner);
    let handle = inner.scheduler.request_tick(Box::new(move |ts| {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        inner.handle.set(None);
        if !inner.alive.get() {
            return;
        }
        inner.driver.borrow_mut().frame(ts);
        if inner.alive.get() {
            arm(&inner);
        }
    }));
    inner.handle.set(Some(handle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;
    use crate::platform::scheduler::ManualScheduler;
    use crate::renderer::{Color, RecordingSurface, TextAlign};
    use crate::sim::GameId;
    use glam::Vec2;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    struct Shared(Rc<RefCell<RecordingSurface>>);

    impl Surface for Shared {
        fn size(&self) -> (f32, f32) {
            self.0.borrow().size()
        }
        fn clear(&mut self, color: Color) {
            self.0.borrow_mut().clear(color)
        }
        fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
            self.0.borrow_mut().fill_rect(x, y, w, h, color)
        }
        fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
            self.0.borrow_mut().fill_circle(center, radius, color)
        }
        fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
            self.0.borrow_mut().fill_polygon(points, color)
        }
        fn fill_text(&mut self, text: &str, pos: Vec2, size: f32, align: TextAlign, color: Color) {
            self.0.borrow_mut().fill_text(text, pos, size, align, color)
        }
    }

    struct Rig {
        driver: FrameDriver,
        input: Rc<RefCell<InputAggregator>>,
        storage: Rc<RefCell<MemoryStorage>>,
    }

    fn rig(id: GameId) -> Rig {
        let input = Rc::new(RefCell::new(InputAggregator::new()));
        let storage = Rc::new(RefCell::new(MemoryStorage::new()));
        let driver = FrameDriver::new(
            GameState::new(id, Difficulty::Normal, 42),
            input.clone(),
            storage.clone(),
        );
        Rig { driver, input, storage }
    }

    fn bullets(d: &FrameDriver) -> usize {
        match d.state() {
            GameState::Asteroids(g) => g.bullets.len(),
            _ => panic!("not asteroids"),
        }
    }

    #[test]
    fn test_fixed_steps_and_clamp() {
        let mut r = rig(GameId::Snake);
        assert_eq!(r.driver.frame(0.0), 1);
        let steps = r.driver.frame(5000.0);
        assert!((5..=6).contains(&steps), "steps {steps}");
        assert!(steps <= MAX_SUBSTEPS);
    }

    #[test]
    fn test_edges_reach_first_step_only() {
        let mut r = rig(GameId::Asteroids);
        r.driver.frame(0.0);
        r.input.borrow_mut().key_down(" ");
        let steps = r.driver.frame(50.0);
        assert!(steps >= 2);
        assert_eq!(bullets(&r.driver), 1);
    }

    #[test]
    fn test_unconsumed_edges_carry_over() {
        let mut r = rig(GameId::Asteroids);
        r.driver.frame(0.0);
        r.input.borrow_mut().key_down(" ");
        assert_eq!(r.driver.frame(1.0), 0);
        assert_eq!(bullets(&r.driver), 0);
        r.input.borrow_mut().key_up(" ");
        assert_eq!(r.driver.frame(1.0 + FRAME_MS), 1);
        assert_eq!(bullets(&r.driver), 1);
    }

    #[test]
    fn test_pause_toggle_freezes_game() {
        let mut r = rig(GameId::Snake);
        r.driver.frame(0.0);
        r.input.borrow_mut().key_down("p");
        r.driver.frame(FRAME_MS);
        assert_eq!(r.driver.phase(), DriverPhase::Paused);

        let before = match r.driver.state() {
            GameState::Snake(g) => g.body.clone(),
            _ => unreachable!(),
        };
        for i in 2..120 {
            assert_eq!(r.driver.frame(i as f64 * FRAME_MS), 0);
        }
        match r.driver.state() {
            GameState::Snake(g) => assert_eq!(g.body, before),
            _ => unreachable!(),
        }

        r.input.borrow_mut().key_up("p");
        r.input.borrow_mut().key_down("p");
        r.driver.frame(120.0 * FRAME_MS);
        assert_eq!(r.driver.phase(), DriverPhase::Running);
    }

    #[test]
    fn test_finished_run_recorded_once() {
        let mut r = rig(GameId::Sudoku);
        r.driver.frame(0.0);
        let digit = match r.driver.state_mut() {
            GameState::Sudoku(g) => {
                let mut last = (0, 0);
                for row in 0..9 {
                    for col in 0..9 {
                        if g.cells[row][col] == 0 {
                            last = (row, col);
                        }
                    }
                }
                for row in 0..9 {
                    for col in 0..9 {
                        if (row, col) != last {
                            g.cells[row][col] = g.solution[row][col];
                        }
                    }
                }
                assert!(g.select(last.0, last.1));
                g.solution[last.0][last.1]
            }
            _ => unreachable!(),
        };
        r.input.borrow_mut().key_down(&digit.to_string());
        r.driver.frame(20.0);
        assert_eq!(r.driver.phase(), DriverPhase::Over);

        for i in 2..10 {
            r.driver.frame(i as f64 * 20.0);
        }
        let scores = HighScores::load(&*r.storage.borrow());
        assert_eq!(scores.entries(GameId::Sudoku).len(), 1);
        assert_eq!(scores.top_score(GameId::Sudoku), Some(1300));

        r.driver.reset(Difficulty::Easy);
        assert_eq!(r.driver.phase(), DriverPhase::Running);
        assert_eq!(r.driver.state().difficulty(), Difficulty::Easy);
    }

    #[test]
    fn test_render_skipped_without_surface() {
        let mut r = rig(GameId::Pong);
        r.driver.frame(0.0);
        r.driver.frame(FRAME_MS);
        assert!(r.driver.warned_no_surface);

        let shared = Rc::new(RefCell::new(RecordingSurface::new(400.0, 300.0)));
        r.driver.set_surface(Box::new(Shared(shared.clone())));
        r.driver.frame(2.0 * FRAME_MS);
        assert!(!shared.borrow().commands.is_empty());

        r.input.borrow_mut().key_down("Escape");
        r.driver.frame(3.0 * FRAME_MS);
        assert!(shared.borrow().has_text("PAUSED"));
    }

    #[test]
    fn test_loop_rearms_and_stops() {
        let r = rig(GameId::Tetris);
        let driver = Rc::new(RefCell::new(r.driver));
        let sched = Rc::new(ManualScheduler::new());
        let frame_loop = FrameLoop::start(driver.clone(), sched.clone());
        assert_eq!(sched.pending_count(), 1);

        for i in 0..5 {
            assert_eq!(sched.advance(i as f64 * FRAME_MS), 1);
            assert_eq!(sched.pending_count(), 1);
        }
        assert_eq!(driver.borrow().frames(), 5);

        frame_loop.stop();
        assert!(!frame_loop.is_running());
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(sched.advance(100.0), 0);
        assert_eq!(driver.borrow().frames(), 5);
    }

    #[test]
    fn test_drop_releases_scheduler() {
        let r = rig(GameId::Breakout);
        let driver = Rc::new(RefCell::new(r.driver));
        let sched = Rc::new(ManualScheduler::new());
        {
            let _frame_loop = FrameLoop::start(driver.clone(), sched.clone());
            sched.advance(0.0);
        }
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(Rc::strong_count(&driver), 1);
    }
}
