//! Property tests over the simulations and the shared plumbing

use std::collections::HashSet;

use chrono::Utc;
use glam::Vec2;
use proptest::prelude::*;

use retro_arcade::highscores::{HighScoreEntry, HighScores, MAX_HIGH_SCORES};
use retro_arcade::platform::{Button, InputAggregator, InputFrame, Source};
use retro_arcade::sim::chess::{Board, Side, movegen};
use retro_arcade::sim::collision::wrap_position;
use retro_arcade::sim::{asteroids, pong, snake, tetris};
use retro_arcade::{Difficulty, Game, GameId};

const DT: f32 = 1.0 / 60.0;

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![Just(Difficulty::Easy), Just(Difficulty::Normal), Just(Difficulty::Hard)]
}

/// Bit i holds Button::ALL[i]; bit i+7 presses it
fn frame_from_bits(bits: u16) -> InputFrame {
    let mut frame = InputFrame::default();
    for (i, b) in Button::ALL.into_iter().enumerate() {
        if b == Button::Pause {
            continue;
        }
        if bits & (1 << i) != 0 {
            frame = frame.hold(b);
        }
        if bits & (1 << (i + 7)) != 0 {
            frame = frame.press(b);
        }
    }
    frame
}

fn source() -> impl Strategy<Value = Source> {
    prop_oneof![
        Just(Source::Keyboard),
        Just(Source::Pointer),
        Just(Source::Touch),
        Just(Source::Pad)
    ]
}

proptest! {
    #[test]
    fn ledger_stays_sorted_and_capped(scores in prop::collection::vec(0u64..10_000, 0..30)) {
        let mut ledger = HighScores::new();
        for s in &scores {
            ledger.add_score(GameId::Tetris, HighScoreEntry::new(*s, Difficulty::Normal, Utc::now()));
        }
        let table = ledger.entries(GameId::Tetris);
        prop_assert!(table.len() <= MAX_HIGH_SCORES);
        prop_assert!(table.windows(2).all(|w| w[0].score >= w[1].score));
        prop_assert!(table.iter().all(|e| e.score > 0));

        let mut best: Vec<u64> = scores.iter().copied().filter(|&s| s > 0).collect();
        best.sort_by(|a, b| b.cmp(a));
        best.truncate(MAX_HIGH_SCORES);
        let kept: Vec<u64> = table.iter().map(|e| e.score).collect();
        prop_assert_eq!(kept, best);
    }

    #[test]
    fn button_held_while_any_source_holds(ops in prop::collection::vec((source(), any::<bool>()), 1..40)) {
        let mut agg = InputAggregator::new();
        let mut holders: HashSet<Source> = HashSet::new();
        for (src, down) in &ops {
            let key = *src;
            if *down {
                agg.press(Button::A, *src);
                holders.insert(key);
            } else {
                agg.release(Button::A, *src);
                holders.remove(&key);
            }
            prop_assert_eq!(agg.is_held(Button::A), !holders.is_empty());
        }
    }

    #[test]
    fn wrapped_positions_stay_in_extended_bounds(
        x in -500.0f32..900.0,
        y in -500.0f32..900.0,
        margin in 0.0f32..40.0,
    ) {
        let p = wrap_position(Vec2::new(x, y), 400.0, 400.0, margin);
        let inside = |v: f32| v >= -margin && v <= 400.0 + margin;
        prop_assert!(inside(p.x));
        prop_assert!(inside(p.y));
        if (-margin..=400.0 + margin).contains(&x) {
            prop_assert_eq!(p.x, x);
        }
    }

    #[test]
    fn snake_head_never_inside_body(seed in any::<u64>(), d in difficulty(), inputs in prop::collection::vec(any::<u16>(), 1..600)) {
        let mut g = snake::SnakeGame::new(d, seed);
        for bits in inputs {
            g.update(&frame_from_bits(bits), DT);
            if g.outcome().is_none() {
                let head = g.head();
                // Growth stacks segments on the tail, never on the head
                prop_assert!(!g.body.iter().skip(1).any(|&c| c == head));
                let (hx, hy) = head;
                prop_assert!((0..snake::GRID_SIZE).contains(&hx) && (0..snake::GRID_SIZE).contains(&hy));
            }
        }
    }

    #[test]
    fn tetris_piece_never_overlaps_board(seed in any::<u64>(), d in difficulty(), inputs in prop::collection::vec(any::<u16>(), 1..600)) {
        let mut g = tetris::TetrisGame::new(d, seed);
        for bits in inputs {
            g.update(&frame_from_bits(bits), DT);
            if g.outcome().is_some() {
                break;
            }
            for (x, y) in g.piece.cells() {
                prop_assert!((0..tetris::COLS as i32).contains(&x));
                prop_assert!(y < tetris::ROWS as i32);
                if y >= 0 {
                    prop_assert!(g.board[y as usize][x as usize].is_none());
                }
            }
        }
    }

    #[test]
    fn pong_ball_stays_between_walls(seed in any::<u64>(), d in difficulty(), inputs in prop::collection::vec(any::<u16>(), 1..900)) {
        let mut g = pong::PongGame::new(d, seed);
        for bits in inputs {
            g.update(&frame_from_bits(bits), DT);
            prop_assert!(g.ball.y >= 0.0 && g.ball.y <= pong::HEIGHT);
            prop_assert!(g.player_score <= 5 && g.cpu_score <= 5);
        }
    }

    #[test]
    fn asteroids_stay_on_the_torus(seed in any::<u64>(), d in difficulty(), inputs in prop::collection::vec(any::<u16>(), 1..600)) {
        let mut g = asteroids::AsteroidsGame::new(d, seed);
        for bits in inputs {
            g.update(&frame_from_bits(bits), DT);
            for a in &g.asteroids {
                let m = a.radius + 1.0;
                prop_assert!(a.pos.x >= -m && a.pos.x <= asteroids::WIDTH + m);
                prop_assert!(a.pos.y >= -m && a.pos.y <= asteroids::HEIGHT + m);
            }
            prop_assert!(g.bullets.len() <= asteroids::BULLET_MAX);
        }
    }

    #[test]
    fn chess_moves_never_land_on_own_pieces(seed in any::<u64>(), plies in 0usize..40) {
        use rand::SeedableRng;
        use rand::seq::IndexedRandom;
        let mut rng = rand_pcg::Pcg32::seed_from_u64(seed);
        let mut board = Board::start();
        let mut side = Side::White;
        for _ in 0..plies {
            let moves = movegen::all_moves(&board, side);
            for m in &moves {
                let target = board.get(m.to);
                prop_assert!(target.is_none_or(|p| p.side != side));
            }
            let Some(mv) = moves.choose(&mut rng).copied() else {
                break;
            };
            board.apply(&mv);
            if !board.has_king(Side::White) || !board.has_king(Side::Black) {
                break;
            }
            side = side.opposite();
        }
        prop_assert!(board.pieces().count() <= 32);
    }
}
