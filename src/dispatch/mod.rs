//! The dispatch thread and the state it shares with caller threads.
//!
//! One worker drains the transfer and request queues, runs an engine round
//! and handles its events, all under the facade lock. Notifications raised
//! on the way are delivered after each step, with the lock still held, so
//! listener callbacks may call back into the read accessors.

mod callbacks;
pub(crate) mod core;
mod requests;
mod transfers;


use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, warn};

pub use self::core::TransferCounters;

use crate::api::MegaApi;
use crate::dispatch::core::Core;
use crate::engine::Waiter;
use crate::error::Result;
use crate::listener::Listeners;
use crate::queue::{RequestQueue, TransferQueue};

const THREAD_NAME: &str = "megafacade-dispatch";

/// State behind every [`MegaApi`] handle.
pub(crate) struct Shared {
    pub(crate) core: ReentrantMutex<RefCell<Core>>,
    pub(crate) requests: RequestQueue,
    pub(crate) transfers: TransferQueue,
    pub(crate) listeners: Listeners,
    pub(crate) waiter: Arc<dyn Waiter>,
    max_wait: Duration,
    exit: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Shared {
    /// Wrap `core` and start the dispatch thread on it.
    pub(crate) fn start(core: Core) -> Result<Arc<Shared>> {
        let waiter = core.waiter.clone();
        let max_wait = core.config.max_wait();
        let shared = Arc::new(Shared {
            core: ReentrantMutex::new(RefCell::new(core)),
            requests: RequestQueue::new(),
            transfers: TransferQueue::new(),
            listeners: Listeners::new(),
            waiter,
            max_wait,
            exit: AtomicBool::new(false),
            worker: Mutex::new(None),
        });

        let weak = Arc::downgrade(&shared);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(weak))?;
        *shared.worker.lock() = Some(handle);
        Ok(shared)
    }

    /// Wake the dispatch thread early.
    pub(crate) fn wake(&self) {
        self.waiter.notify();
    }

    /// Deliver queued notifications until none are left.
    ///
    /// Callbacks may queue more by reentering the facade, so this drains
    /// until the outbox stays empty.
    pub(crate) fn flush(&self, api: &MegaApi, core: &RefCell<Core>) {
        loop {
            let pending = std::mem::take(&mut core.borrow_mut().outbox);
            if pending.is_empty() {
                break;
            }
            for notification in pending {
                self.listeners.deliver(api, notification);
            }
        }
    }

    /// One pass of the dispatch loop. Returns how long to sleep afterwards.
    fn iterate(&self, api: &MegaApi) -> Duration {
        let core = self.core.lock();

        while let Some(transfer) = self.transfers.pop() {
            core.borrow_mut().send_transfer(transfer);
            self.flush(api, &core);
        }

        while let Some(request) = self.requests.pop() {
            core.borrow_mut().send_request(request);
            self.flush(api, &core);
        }

        let events = core.borrow_mut().engine.exec();
        for event in events {
            core.borrow_mut().handle_event(event);
            self.flush(api, &core);
        }

        let wakeup = core.borrow().engine.next_wakeup();
        wakeup.map_or(self.max_wait, |w| w.min(self.max_wait))
    }

    /// Stop the dispatch thread and wait for it, unless called from it.
    pub(crate) fn stop(&self) {
        self.exit.store(true, Ordering::Release);
        self.waiter.notify();

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Dropping the handle detaches; the loop exits at its next check
            return;
        }
        if handle.join().is_err() {
            warn!("Dispatch thread panicked");
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.exit.store(true, Ordering::Release);
        self.waiter.notify();
    }
}

/// Body of the dispatch thread.
///
/// Holds only a weak reference between iterations, so dropping every
/// handle ends the loop.
fn run(shared: Weak<Shared>) {
    debug!("Dispatch loop started");
    loop {
        let Some(strong) = shared.upgrade() else {
            break;
        };
        if strong.exit.load(Ordering::Acquire) {
            break;
        }

        let waiter = strong.waiter.clone();
        let api = MegaApi::from_shared(strong);
        let timeout = api.shared.iterate(&api);
        drop(api);

        waiter.wait(timeout);
    }
    debug!("Dispatch loop stopped");
}
