//! Engine state and correlation maps guarded by the facade lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::api::error::{ApiError, ErrorCode};
use crate::config::Config;
use crate::engine::{Ds, Engine, Tag, TransferId, Waiter};
use crate::fs::FileSystemAccess;
use crate::listener::Notification;
use crate::preview::Thumbnailer;
use crate::request::{Request, RequestType};
use crate::transfer::{Transfer, TransferType};

/// Running transfer counts exposed through the facade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferCounters {
    pub pending_uploads: u32,
    pub pending_downloads: u32,
    pub total_uploads: u32,
    pub total_downloads: u32,
}

impl TransferCounters {
    pub(crate) fn added(&mut self, direction: TransferType) {
        match direction {
            TransferType::Upload => {
                self.pending_uploads += 1;
                self.total_uploads += 1;
            }
            TransferType::Download => {
                self.pending_downloads += 1;
                self.total_downloads += 1;
            }
        }
    }

    pub(crate) fn settled(&mut self, direction: TransferType) {
        match direction {
            TransferType::Upload => self.pending_uploads = self.pending_uploads.saturating_sub(1),
            TransferType::Download => {
                self.pending_downloads = self.pending_downloads.saturating_sub(1)
            }
        }
    }
}

/// Everything the dispatch loop and the read accessors share.
///
/// Only touched with the facade lock held. Notifications raised while it
/// is borrowed go to `outbox` and are delivered after the borrow ends.
pub(crate) struct Core {
    pub(crate) engine: Box<dyn Engine>,
    pub(crate) fs: Box<dyn FileSystemAccess>,
    pub(crate) thumbnailer: Box<dyn Thumbnailer>,
    pub(crate) waiter: Arc<dyn Waiter>,
    pub(crate) config: Config,
    pub(crate) requests: BTreeMap<Tag, Request>,
    pub(crate) transfers: BTreeMap<Tag, Transfer>,
    pub(crate) transfer_tags: HashMap<TransferId, Tag>,
    pub(crate) pause_time: Option<Ds>,
    pub(crate) counters: TransferCounters,
    pub(crate) sync_scanning: bool,
    pub(crate) outbox: Vec<Notification>,
}

impl Core {
    pub(crate) fn new(
        engine: Box<dyn Engine>,
        fs: Box<dyn FileSystemAccess>,
        thumbnailer: Box<dyn Thumbnailer>,
        waiter: Arc<dyn Waiter>,
        config: Config,
    ) -> Self {
        Self {
            engine,
            fs,
            thumbnailer,
            waiter,
            config,
            requests: BTreeMap::new(),
            transfers: BTreeMap::new(),
            transfer_tags: HashMap::new(),
            pause_time: None,
            counters: TransferCounters::default(),
            sync_scanning: false,
            outbox: Vec::new(),
        }
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.outbox.push(notification);
    }

    /// Retire `request` with `error`.
    pub(crate) fn finish_request(&mut self, request: Request, error: ApiError) {
        debug!(
            "Request {} ({:?}) finished: {}",
            request.request_type(),
            request.tag(),
            error
        );
        self.notify(Notification::RequestFinish(request, error));
    }

    /// Retire the request filed under `tag`, if it is still pending.
    pub(crate) fn finish_tag(&mut self, tag: Tag, code: ErrorCode) {
        match self.requests.remove(&tag) {
            Some(request) => self.finish_request(request, code.into()),
            None => trace!("No pending request for tag {}", tag),
        }
    }

    pub(crate) fn request_temporary_error(&mut self, tag: Tag, error: ApiError) {
        if let Some(request) = self.requests.get(&tag) {
            let snapshot = request.clone();
            self.notify(Notification::RequestTemporaryError(snapshot, error));
        }
    }

    /// File the request pending under `old` under a freshly allocated tag.
    ///
    /// Returns the new tag, or `None` if nothing was pending under `old`.
    pub(crate) fn rearm(&mut self, old: Tag) -> Option<Tag> {
        let mut request = self.requests.remove(&old)?;
        let tag = self.engine.next_tag();
        request.tag = Some(tag);
        trace!("Request {} re-armed: {} -> {}", request.request_type(), old, tag);
        self.requests.insert(tag, request);
        Some(tag)
    }

    pub(crate) fn finish_transfer(&mut self, transfer: Transfer, error: ApiError) {
        debug!(
            "Transfer {} ({:?}) finished: {}",
            transfer.transfer_type(),
            transfer.tag(),
            error
        );
        self.notify(Notification::TransferFinish(transfer, error));
    }

    /// Remove a transfer from both indexes.
    pub(crate) fn detach_transfer(&mut self, id: TransferId) -> Option<Transfer> {
        let tag = self.transfer_tags.remove(&id)?;
        self.transfers.remove(&tag)
    }

    pub(crate) fn transfer_mut(&mut self, id: TransferId) -> Option<&mut Transfer> {
        let tag = self.transfer_tags.get(&id)?;
        self.transfers.get_mut(tag)
    }

    /// Finish every pending request and transfer with `code`, oldest
    /// first, requests before transfers.
    ///
    /// Upload commits are released silently and finish their transfer
    /// instead. Pending counters are settled here for every transfer
    /// retired.
    pub(crate) fn close_pending(&mut self, code: ErrorCode) {
        let requests = std::mem::take(&mut self.requests);
        for (_, mut request) in requests {
            if request.request_type() == RequestType::Upload {
                if let Some(transfer) = request.transfer.take() {
                    self.finish_transfer(*transfer, code.into());
                }
                continue;
            }
            self.finish_request(request, code.into());
        }

        let transfers = std::mem::take(&mut self.transfers);
        self.transfer_tags.clear();
        for (_, transfer) in transfers {
            if transfer.engine_id.is_some() {
                self.counters.settled(transfer.transfer_type);
            }
            self.finish_transfer(transfer, code.into());
        }
    }

    /// Ask the engine to stop a caller-started transfer.
    ///
    /// Does nothing unless the engine still runs it; the outcome arrives
    /// through the normal transfer events.
    pub(crate) fn cancel_transfer(&mut self, tag: Tag) {
        let Some(id) = self.transfers.get(&tag).and_then(|t| t.engine_id) else {
            return;
        };
        if !self.engine.has_transfer(id) || self.engine.is_sync_transfer(id) {
            return;
        }
        debug!("Cancelling transfer {:?}", id);
        self.engine.stop_transfer(id);
    }

    pub(crate) fn cancel_regular_transfers(&mut self, direction: TransferType) {
        for id in self.engine.transfers(direction) {
            if !self.engine.is_sync_transfer(id) {
                self.engine.stop_transfer(id);
            }
        }
    }

    /// Pause or resume all transfers.
    ///
    /// On resume every transfer's start time moves forward by the paused
    /// span so speeds ignore the pause.
    pub(crate) fn set_paused(&mut self, pause: bool) {
        let now = self.waiter.ds();
        if pause {
            self.pause_time.get_or_insert(now);
        } else if let Some(paused_at) = self.pause_time.take() {
            let span = now - paused_at;
            for transfer in self.transfers.values_mut() {
                if let Some(start) = transfer.start_time.as_mut() {
                    *start += span;
                }
            }
        }
        self.engine.pause_transfers(TransferType::Upload, pause);
        self.engine.pause_transfers(TransferType::Download, pause);
    }
}
