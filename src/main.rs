//! Retro Arcade entry point
//!
//! On the web this mounts one game on the page canvas. Natively it runs a
//! short headless demo of every game with scripted input and prints the
//! resulting score ledger.

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;

    use wasm_bindgen::prelude::*;

    use retro_arcade::platform::web::{self, MountedGame};
    use retro_arcade::sim::GameId;

    const CANVAS_ID: &str = "canvas";

    thread_local! {
        static RUNNING: RefCell<Option<MountedGame>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn start() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("Retro Arcade starting...");

        let game = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(CANVAS_ID))
            .and_then(|c| c.get_attribute("data-game"))
            .unwrap_or_else(|| GameId::Snake.as_str().to_string());
        play(&game)
    }

    /// Replace the running game with `game` (a game id such as "tetris")
    #[wasm_bindgen]
    pub fn play(game: &str) -> Result<(), JsValue> {
        let id = GameId::from_str(game).ok_or_else(|| JsValue::from_str(&format!("unknown game {game:?}")))?;
        stop();
        let mounted = web::mount(CANVAS_ID, id)?;
        log::debug!("{} input listeners attached", mounted.listener_count());
        RUNNING.with(|r| *r.borrow_mut() = Some(mounted));
        Ok(())
    }

    /// Stop the running game, cancelling its pending frame and removing its
    /// input listeners
    #[wasm_bindgen]
    pub fn stop() {
        if RUNNING.with(|r| r.borrow_mut().take()).is_some() {
            log::info!("Game stopped");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Retro Arcade (native) starting...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_app::start
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;

    use retro_arcade::highscores::{HighScores, format_date};
    use retro_arcade::persistence::{FileStorage, MemoryStorage, Storage};
    use retro_arcade::platform::{InputAggregator, ManualScheduler};
    use retro_arcade::renderer::RecordingSurface;
    use retro_arcade::{FrameDriver, FrameLoop, Game, GameId, GameState, Settings};

    const DEFAULT_DATA: &str = "arcade-data.json";
    const DEFAULT_FRAMES: u64 = 1800;
    const FRAME_MS: f64 = 1000.0 / 60.0;
    const TURN_KEYS: [&str; 4] = ["ArrowLeft", "ArrowUp", "ArrowRight", "ArrowDown"];

    fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
        std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
    }

    fn open_storage() -> Rc<RefCell<dyn Storage>> {
        let path = std::env::var("ARCADE_DATA").unwrap_or_else(|_| DEFAULT_DATA.to_string());
        match FileStorage::open(&path) {
            Ok(s) => {
                log::info!("Using data file {}", s.path().display());
                Rc::new(RefCell::new(s))
            }
            Err(e) => {
                log::warn!("Cannot open {path}: {e}; using memory storage");
                Rc::new(RefCell::new(MemoryStorage::new()))
            }
        }
    }

    /// Wander around, fire now and then, click across the board
    fn script(input: &mut InputAggregator, frame: u64, size: (f32, f32)) {
        if frame % 20 == 0 {
            for key in TURN_KEYS {
                input.key_up(key);
            }
            input.key_down(TURN_KEYS[(frame / 20 % 4) as usize]);
        }
        match frame % 15 {
            0 => {
                input.key_down(" ");
            }
            1 => input.key_up(" "),
            _ => {}
        }
        if frame % 45 == 0 {
            let t = frame as f32 * 0.37;
            let pos = Vec2::new((t.sin() * 0.5 + 0.5) * size.0, (t.cos() * 0.5 + 0.5) * size.1);
            input.pointer_down(pos);
            input.key_down(&(frame / 45 % 9 + 1).to_string());
        }
    }

    fn play(id: GameId, storage: Rc<RefCell<dyn Storage>>, seed: u64, frames: u64) {
        let difficulty = Settings::load(&*storage.borrow()).difficulty(id);
        let input = Rc::new(RefCell::new(InputAggregator::new()));
        let (w, h) = id.canvas_size();

        let mut driver = FrameDriver::new(GameState::new(id, difficulty, seed), input.clone(), storage);
        driver.set_surface(Box::new(RecordingSurface::new(w, h)));
        let driver = Rc::new(RefCell::new(driver));
        let scheduler = Rc::new(ManualScheduler::new());
        let frame_loop = FrameLoop::start(driver.clone(), scheduler.clone());

        for frame in 0..frames {
            script(&mut input.borrow_mut(), frame, (w, h));
            scheduler.advance(frame as f64 * FRAME_MS);
        }
        frame_loop.stop();

        let d = driver.borrow();
        let state = d.state();
        println!(
            "{:<16} {:<8} {:<8} score {:>6}  {}",
            id.title(),
            state.difficulty().as_str(),
            d.phase().as_str(),
            state.score(),
            match state.outcome() {
                Some(o) if o.won => "won",
                Some(_) => "lost",
                None => "-",
            }
        );
    }

    pub fn run() {
        let seed: u64 = env_or("ARCADE_SEED", 1);
        let frames: u64 = env_or("ARCADE_FRAMES", DEFAULT_FRAMES);
        let storage = open_storage();
        log::info!("Demo seed {seed}, {frames} frames per game");

        println!("\nRunning every game headless...");
        for id in GameId::ALL {
            play(id, storage.clone(), seed, frames);
        }

        let scores = HighScores::load(&*storage.borrow());
        let now = chrono::Utc::now();
        println!("\nHigh scores:");
        for id in GameId::ALL {
            for (i, e) in scores.entries(id).iter().enumerate() {
                println!(
                    "  {:<16} #{} {:>6} ({}, {})",
                    id.title(),
                    i + 1,
                    e.score,
                    e.difficulty,
                    format_date(e.date, now)
                );
            }
        }
        if scores.is_empty() {
            println!("  (none yet)");
        }
    }
}
