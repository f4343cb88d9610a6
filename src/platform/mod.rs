//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input events (keyboard, pointer, touch, on-screen pad)
//! - Frame ticks (`requestAnimationFrame` on web, manual stepping elsewhere)
//! - Storage and drawing (LocalStorage / canvas 2D on web)

pub mod input;
pub mod listeners;
pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{Button, Direction, InputAggregator, InputFrame, Source};
pub use listeners::{Subscription, Subscriptions};
pub use scheduler::{ManualScheduler, Scheduler, TickCallback, TickHandle};
