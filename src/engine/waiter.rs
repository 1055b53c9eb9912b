//! Clock and wakeup primitive the dispatch loop sleeps on.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::engine::Ds;

/// Blocking primitive the dispatch loop sleeps on between iterations.
pub trait Waiter: Send + Sync {
    /// Deciseconds elapsed on the waiter's clock.
    fn ds(&self) -> Ds;
    /// Block until notified or until `timeout` elapses.
    ///
    /// A notification that arrived since the last wait returns immediately.
    fn wait(&self, timeout: Duration);
    fn notify(&self);
}

/// [`Waiter`] over a condition variable, clocked from its creation.
pub struct CondvarWaiter {
    started: Instant,
    pending: Mutex<bool>,
    cond: Condvar,
}

impl CondvarWaiter {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            pending: Mutex::new(false),
            cond: Condvar::new(),
        }
    }
}

impl Default for CondvarWaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl Waiter for CondvarWaiter {
    fn ds(&self) -> Ds {
        (self.started.elapsed().as_millis() / 100) as Ds
    }

    fn wait(&self, timeout: Duration) {
        let mut pending = self.pending.lock();
        if !*pending {
            self.cond.wait_for(&mut pending, timeout);
        }
        *pending = false;
    }

    fn notify(&self) {
        *self.pending.lock() = true;
        self.cond.notify_one();
    }
}
