//! Host event subscriptions
//!
//! Input handlers registered with the host (DOM listeners on the web) are kept
//! as [`Subscription`]s so that stopping a game detaches them again instead of
//! leaking handlers that keep feeding a dead aggregator.

/// One registered host handler
pub trait Subscription {
    /// Detach from the host. Called at most once.
    fn unsubscribe(&mut self);
}

/// Every subscription owned by one mounted game. Dropping detaches them all.
#[derive(Default)]
pub struct Subscriptions {
    active: Vec<Box<dyn Subscription>>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Box<dyn Subscription>) {
        self.active.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Detach and drop every subscription, newest first
    pub fn clear(&mut self) {
        let count = self.active.len();
        while let Some(mut sub) = self.active.pop() {
            sub.unsubscribe();
        }
        if count > 0 {
            log::debug!("Detached {count} input listeners");
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.clear();
    }
}
