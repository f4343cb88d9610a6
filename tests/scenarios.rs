//! End-to-end scenarios driving whole games through their public surface

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use retro_arcade::persistence::MemoryStorage;
use retro_arcade::platform::{Button, Direction, InputAggregator, InputFrame};
use retro_arcade::sim::asteroids::{AsteroidSize, AsteroidsGame};
use retro_arcade::sim::breakout::{self, BreakoutGame};
use retro_arcade::sim::chess::{Castle, ChessGame, PieceKind, Side, Square, movegen};
use retro_arcade::sim::collision::paddle_deflection;
use retro_arcade::sim::pong::{self, PongGame};
use retro_arcade::sim::snake::SnakeGame;
use retro_arcade::sim::sudoku::SudokuGame;
use retro_arcade::{Difficulty, DriverPhase, FrameDriver, Game, GameId, GameState, HighScores, Outcome};

const DT: f32 = 1.0 / 60.0;
const FRAME_MS: f64 = 20.0;

fn idle() -> InputFrame {
    InputFrame::default()
}

#[test]
fn test_breakout_easy_full_run() {
    let mut g = BreakoutGame::new(Difficulty::Easy, 3);
    assert_eq!(g.lives, 5);
    assert_eq!(g.paddle_width(), 85.0);
    assert_eq!(g.bricks_left(), 40);

    // Park the ball inside the first brick
    g.ball = g.bricks[0].rect.center();
    g.ball_vel = Vec2::new(0.0, -60.0);
    g.update(&idle(), DT);
    assert_eq!(g.score, 8);
    assert_eq!(g.bricks_left(), 39);
    assert!(g.ball_vel.y > 0.0);
    assert!(g.outcome().is_none());

    for i in 1..g.bricks.len() {
        g.ball = g.bricks[i].rect.center();
        g.ball_vel = Vec2::new(0.0, -60.0);
        g.update(&idle(), DT);
    }
    assert_eq!(g.bricks_left(), 0);
    assert_eq!(g.score, 8 * 40);
    assert_eq!(g.outcome(), Some(Outcome::WON));
}

#[test]
fn test_sudoku_hard_correct_entry() {
    let mut g = SudokuGame::new(Difficulty::Hard, 11);
    assert_eq!(g.blank_count(), 55);

    let (row, col) = (0..81)
        .map(|i| (i / 9, i % 9))
        .find(|&(r, c)| g.cells[r][c] == 0)
        .expect("hard puzzle has blanks");
    assert!(g.select(row, col));
    let digit = g.solution[row][col];
    assert!(g.enter(digit));
    assert_eq!(g.cells[row][col], digit);
    assert_eq!(g.mistakes, 0);
    assert_eq!(g.blank_count(), 54);
    assert!(g.outcome().is_none());
}

#[test]
fn test_asteroid_splits_down_to_nothing() {
    let mut g = AsteroidsGame::new(Difficulty::Normal, 5);
    g.asteroids.truncate(1);
    {
        let rock = &mut g.asteroids[0];
        rock.pos = Vec2::new(80.0, 80.0);
        rock.vel = Vec2::ZERO;
        rock.radius = 30.0;
        rock.size = AsteroidSize::Large;
    }
    g.bullets.clear();
    g.score = 0;

    g.destroy_asteroid(0);
    assert_eq!(g.score, 20);
    assert_eq!(g.asteroids.len(), 2);
    assert!(g.asteroids.iter().all(|a| a.size == AsteroidSize::Medium && a.radius == 15.0));

    g.destroy_asteroid(0);
    assert_eq!(g.score, 70);
    let smalls: Vec<_> = g.asteroids.iter().filter(|a| a.size == AsteroidSize::Small).collect();
    assert_eq!(smalls.len(), 2);
    assert!(smalls.iter().all(|a| a.radius == 8.0));

    let small = g
        .asteroids
        .iter()
        .position(|a| a.size == AsteroidSize::Small)
        .expect("small rock present");
    let before = g.asteroids.len();
    g.destroy_asteroid(small);
    assert_eq!(g.score, 170);
    assert_eq!(g.asteroids.len(), before - 1);
}

#[test]
fn test_pong_paddle_reflects_with_bounded_spin() {
    let mut g = PongGame::new(Difficulty::Normal, 8);
    g.player_y = 100.0;
    let paddle = g.player_paddle();
    g.ball = Vec2::new(paddle.x + paddle.w + 4.0, paddle.center().y + 20.0);
    g.ball_vel = Vec2::new(-300.0, 0.0);

    g.update(&idle(), DT);
    assert!(g.ball_vel.x > 0.0);
    assert!(g.ball_vel.y > 0.0);
    assert!(g.ball_vel.y.abs() <= pong::MAX_DEFLECTION * 60.0);

    // The deflection saturates at the paddle ends
    let half = pong::PADDLE_HEIGHT / 2.0;
    assert_eq!(paddle_deflection(500.0, 0.0, half, 5.0), 5.0);
    assert_eq!(paddle_deflection(-500.0, 0.0, half, 5.0), -5.0);
    assert_eq!(paddle_deflection(0.0, 0.0, half, 5.0), 0.0);
}

#[test]
fn test_snake_refuses_reversal_mid_game() {
    let mut g = SnakeGame::new(Difficulty::Normal, 2);
    assert_eq!(g.heading, Direction::Right);
    let before = g.head();

    let interval = g.tuning().step_interval;
    g.update(&idle().press(Button::Left), interval);
    assert_eq!(g.heading, Direction::Right);
    assert_eq!(g.head(), (before.0 + 1, before.1));
    assert!(g.outcome().is_none());

    assert!(!g.steer(Direction::Left));
    assert!(g.steer(Direction::Up));
}

#[test]
fn test_chess_castles_through_clicks() {
    let mut g = ChessGame::new(Difficulty::Normal, 4);
    g.board.set(Square::new(7, 5), None);
    g.board.set(Square::new(7, 6), None);
    assert!(movegen::can_castle(&g.board, Side::White, Castle::KingSide));

    assert!(!g.click_square(Square::new(7, 4)));
    assert!(g.targets.iter().any(|m| m.to == Square::new(7, 6)));
    assert!(g.click_square(Square::new(7, 6)));

    let king = g.board.get(Square::new(7, 6)).expect("king moved");
    let rook = g.board.get(Square::new(7, 5)).expect("rook moved");
    assert_eq!(king.kind, PieceKind::King);
    assert_eq!(rook.kind, PieceKind::Rook);
    assert!(g.board.get(Square::new(7, 7)).is_none());
    assert_eq!(g.turn, Side::Black);
}

#[test]
fn test_last_life_ends_the_run_once() {
    let input = Rc::new(RefCell::new(InputAggregator::new()));
    let storage = Rc::new(RefCell::new(MemoryStorage::new()));
    let mut driver = FrameDriver::new(
        GameState::new(GameId::Breakout, Difficulty::Normal, 9),
        input,
        storage.clone(),
    );
    match driver.state_mut() {
        GameState::Breakout(g) => {
            g.lives = 1;
            g.score = 40;
            g.paddle_x = breakout::WIDTH - g.paddle_width();
            g.ball = Vec2::new(50.0, breakout::HEIGHT - 2.0);
            g.ball_vel = Vec2::new(0.0, 240.0);
        }
        _ => unreachable!(),
    }

    driver.frame(0.0);
    assert_eq!(driver.phase(), DriverPhase::Over);
    for i in 1..30 {
        assert_eq!(driver.frame(i as f64 * FRAME_MS), 0);
    }
    match driver.state() {
        GameState::Breakout(g) => assert_eq!(g.lives, 0),
        _ => unreachable!(),
    }
    assert_eq!(driver.state().outcome(), Some(Outcome::LOST));

    let ledger = HighScores::load(&*storage.borrow());
    let entries = ledger.entries(GameId::Breakout);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].score, 40);
}
