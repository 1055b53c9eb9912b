//! Unbounded FIFO queues feeding the dispatch loop.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};

use crate::request::Request;
use crate::transfer::Transfer;

/// Multi-producer FIFO drained by the dispatch thread.
///
/// The queue owns both channel ends, so pushes never see a disconnected
/// receiver.
pub struct WorkQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Append `item`. Never blocks.
    pub fn push(&self, item: T) {
        // rx lives as long as self
        let _ = self.tx.send(item);
    }

    /// Remove the oldest item, if any.
    pub fn pop(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub type RequestQueue = WorkQueue<Request>;
pub type TransferQueue = WorkQueue<Transfer>;
