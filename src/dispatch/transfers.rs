//! Transfer submission and transfer events.

use std::path::Path;

use tracing::{debug, trace};

use crate::api::error::{ApiError, ErrorCode};
use crate::dispatch::core::Core;
use crate::engine::{Ds, NodeTree, Tag, TransferFile, TransferId, UploadToken};
use crate::fs::Handle;
use crate::fs::local::join_local;
use crate::listener::Notification;
use crate::request::{Request, RequestType};
use crate::transfer::{Transfer, TransferType};

impl Core {
    /// File a dequeued transfer under a new tag and hand it to the engine.
    pub(crate) fn send_transfer(&mut self, mut transfer: Transfer) {
        let tag = self.engine.next_tag();
        transfer.tag = Some(tag);
        transfer.max_retries = self.config.max_transfer_retries;

        match self.describe_transfer(&mut transfer) {
            Ok(file) => {
                debug!("Starting {} as tag {}", transfer.transfer_type, tag);
                self.transfers.insert(tag, transfer);
                self.engine.start_transfer(file);
            }
            Err(code) => {
                debug!("{} rejected: {}", transfer.transfer_type, code.description());
                self.finish_transfer(transfer, code.into());
            }
        }
    }

    fn describe_transfer(&mut self, transfer: &mut Transfer) -> Result<TransferFile, ErrorCode> {
        let tag = transfer.tag.ok_or(ErrorCode::Internal)?;
        match transfer.transfer_type {
            TransferType::Upload => {
                let path = transfer
                    .path
                    .clone()
                    .filter(|p| !p.is_empty())
                    .ok_or(ErrorCode::Args)?;
                let name = transfer.file_name.clone().unwrap_or_default();
                let thumbnail = self
                    .thumbnailer
                    .create_thumbnail(Path::new(&path), self.config.thumbnail_size);
                Ok(TransferFile::Upload {
                    tag,
                    local_path: self.fs.path_to_local(&path),
                    parent: transfer.parent_handle,
                    name,
                    thumbnail,
                    connections: transfer.num_connections,
                    max_speed: transfer.max_speed,
                })
            }
            TransferType::Download => {
                let parent_path = transfer
                    .parent_path
                    .clone()
                    .filter(|p| !p.is_empty())
                    .ok_or(ErrorCode::Args)?;

                let node = transfer.node_handle.and_then(|h| self.engine.node(h));
                let name = match (&node, &transfer.public_node) {
                    (Some(node), _) => node.name.clone(),
                    (None, Some(public)) => public.name().to_string(),
                    (None, None) => return Err(ErrorCode::Args),
                };

                if transfer.path.is_none() {
                    let target = join_local(&parent_path, &name, self.fs.local_separator());
                    transfer.set_path(Some(&target));
                }
                let path = transfer.path.clone().unwrap_or_default();

                Ok(TransferFile::Download {
                    tag,
                    node: node.map(|n| n.handle),
                    public_node: transfer.public_node.clone(),
                    local_path: self.fs.path_to_local(&path),
                    start: transfer.start_pos,
                    end: transfer.end_pos,
                    connections: transfer.num_connections,
                })
            }
        }
    }

    pub(crate) fn transfer_added(
        &mut self,
        id: TransferId,
        tag: Option<Tag>,
        direction: TransferType,
        size: u64,
    ) {
        let tag = match tag.filter(|t| self.transfers.contains_key(t)) {
            Some(tag) => tag,
            None => {
                // Started by the engine itself, e.g. by a sync
                let tag = self.engine.next_tag();
                let mut transfer = Transfer::new(direction);
                transfer.tag = Some(tag);
                transfer.max_retries = self.config.max_transfer_retries;
                self.transfers.insert(tag, transfer);
                tag
            }
        };

        self.transfer_tags.insert(id, tag);
        self.counters.added(direction);

        if let Some(transfer) = self.transfers.get_mut(&tag) {
            transfer.engine_id = Some(id);
            transfer.total_bytes = size;
            let snapshot = transfer.clone();
            self.notify(Notification::TransferStart(snapshot));
        }
    }

    pub(crate) fn transfer_prepare(
        &mut self,
        id: TransferId,
        local_path: &str,
        size: u64,
        node: Option<Handle>,
    ) {
        let path = self.fs.local_to_path(local_path);
        let temp = match self.config.base_path.as_deref() {
            Some(base) => join_local(base, &self.fs.tmp_name_local(), self.fs.local_separator()),
            None => self.fs.tmp_name_local(),
        };

        let Some(transfer) = self.transfer_mut(id) else {
            return;
        };
        transfer.set_path(Some(&path));
        transfer.total_bytes = size;

        if transfer.transfer_type == TransferType::Download {
            if node.is_some() {
                transfer.node_handle = node;
            }
            trace!("Download {:?} staged at {}", id, temp);
            self.engine.set_transfer_temp_path(id, &temp);
        }
    }

    pub(crate) fn transfer_update(&mut self, id: TransferId, progress: u64, last_data: Ds) {
        let now = self.waiter.ds();
        let Some(transfer) = self.transfer_mut(id) else {
            return;
        };

        transfer.time = last_data;
        let start = match transfer.start_time {
            Some(start) if start <= now => start,
            _ => now,
        };
        transfer.start_time = Some(start);
        transfer.delta_size = progress.saturating_sub(transfer.transferred_bytes);
        transfer.transferred_bytes = progress;
        transfer.speed = speed(progress, start, now);
        transfer.update_time = now;

        if progress > 0 {
            let snapshot = transfer.clone();
            self.notify(Notification::TransferUpdate(snapshot));
        }
    }

    pub(crate) fn transfer_failed(&mut self, id: TransferId, error: ErrorCode, next: Option<Ds>) {
        let now = self.waiter.ds();
        let Some(transfer) = self.transfer_mut(id) else {
            return;
        };
        transfer.time = now;
        transfer.num_retry += 1;

        let mut error = ApiError::new(error);
        if let Some(next) = next {
            error = error.with_next_attempt(next);
        }
        let snapshot = transfer.clone();
        self.notify(Notification::TransferTemporaryError(snapshot, error));
    }

    pub(crate) fn transfer_limit(&mut self, id: TransferId) {
        let Some(transfer) = self.transfer_mut(id) else {
            return;
        };
        let snapshot = transfer.clone();
        self.notify(Notification::TransferTemporaryError(
            snapshot,
            ApiError::new(ErrorCode::OverQuota),
        ));
    }

    /// The engine dropped a transfer without completing it.
    pub(crate) fn transfer_removed(&mut self, id: TransferId, direction: TransferType) {
        let Some(transfer) = self.detach_transfer(id) else {
            trace!("Removed {} {:?} already retired", direction, id);
            return;
        };
        self.counters.settled(direction);
        self.finish_transfer(transfer, ApiError::new(ErrorCode::Incomplete));
    }

    pub(crate) fn transfer_complete(
        &mut self,
        id: TransferId,
        direction: TransferType,
        size: u64,
        node: Option<Handle>,
        upload_token: Option<UploadToken>,
    ) {
        let now = self.waiter.ds();
        let Some(mut transfer) = self.detach_transfer(id) else {
            return;
        };
        self.counters.settled(direction);

        let start = match transfer.start_time {
            Some(start) if start <= now => start,
            _ => now,
        };
        transfer.start_time = Some(start);
        transfer.time = now;
        transfer.update_time = now;
        transfer.delta_size = size.saturating_sub(transfer.transferred_bytes);
        transfer.transferred_bytes = size;
        transfer.speed = speed(size, start, now);
        if node.is_some() {
            transfer.node_handle = node;
        }

        match upload_token {
            Some(token) if transfer.transfer_type == TransferType::Upload => {
                self.commit_upload(transfer, &token)
            }
            _ => self.finish_transfer(transfer, ApiError::ok()),
        }
    }

    /// Create the node for a finished upload; the transfer finishes when
    /// the engine reports the commit.
    fn commit_upload(&mut self, transfer: Transfer, token: &UploadToken) {
        let tag = self.engine.next_tag();
        let parent = transfer.parent_handle;
        let name = transfer.file_name.clone().unwrap_or_default();

        let mut request = Request::new(RequestType::Upload);
        request.tag = Some(tag);
        request.parent_handle = parent;
        request.name = Some(name.clone());
        request.transfer = Some(Box::new(transfer));
        self.requests.insert(tag, request);

        debug!("Committing upload {} as tag {}", name, tag);
        self.engine.put_upload(tag, parent, &name, token);
    }
}

/// Bytes per second for `bytes` moved between two decisecond stamps.
fn speed(bytes: u64, start: Ds, now: Ds) -> u64 {
    let elapsed = u64::try_from(now - start + 1).unwrap_or(1).max(1);
    10 * bytes / elapsed
}
