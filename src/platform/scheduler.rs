//! Tick scheduling port
//!
//! The frame driver never calls the host's animation-frame API directly. It
//! asks a [`Scheduler`] for one tick at a time and keeps the returned handle
//! so the tick can be cancelled on teardown.

use std::cell::{Cell, RefCell};

/// Identifies one outstanding tick request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(pub u64);

/// Called once with the host timestamp in milliseconds
pub type TickCallback = Box<dyn FnOnce(f64)>;

pub trait Scheduler {
    /// Run `callback` on the next tick
    fn request_tick(&self, callback: TickCallback) -> TickHandle;
    /// Drop a pending tick. Unknown or already-fired handles are ignored.
    fn cancel_tick(&self, handle: TickHandle);
}

/// Scheduler stepped by hand (headless runs and tests)
#[derive(Default)]
pub struct ManualScheduler {
    next_id: Cell<u64>,
    pending: RefCell<Vec<(TickHandle, TickCallback)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every tick requested before this call. Ticks requested from inside
    /// a callback wait for the next `advance`. Returns how many fired.
    pub fn advance(&self, timestamp_ms: f64) -> usize {
        let due = std::mem::take(&mut *self.pending.borrow_mut());
        let fired = due.len();
        for (_, callback) in due {
            callback(timestamp_ms);
        }
        fired
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl Scheduler for ManualScheduler {
    fn request_tick(&self, callback: TickCallback) -> TickHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let handle = TickHandle(id);
        self.pending.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel_tick(&self, handle: TickHandle) {
        self.pending.borrow_mut().retain(|(h, _)| *h != handle);
    }
}
