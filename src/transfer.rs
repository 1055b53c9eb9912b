//! Listener-facing transfer records.

use std::fmt;
use std::sync::Arc;

use crate::engine::{Ds, Tag, TransferId};
use crate::fs::Handle;
use crate::listener::TransferListener;
use crate::public::PublicNode;

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferType {
    Download,
    Upload,
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Download => write!(f, "download"),
            TransferType::Upload => write!(f, "upload"),
        }
    }
}

/// One upload or download, from enqueue until its finish notification.
#[derive(Clone)]
pub struct Transfer {
    pub(crate) transfer_type: TransferType,
    pub(crate) tag: Option<Tag>,
    pub(crate) engine_id: Option<TransferId>,
    pub(crate) path: Option<String>,
    pub(crate) parent_path: Option<String>,
    pub(crate) file_name: Option<String>,
    pub(crate) node_handle: Option<Handle>,
    pub(crate) parent_handle: Option<Handle>,
    pub(crate) public_node: Option<PublicNode>,
    pub(crate) base64_key: Option<String>,
    pub(crate) start_pos: u64,
    pub(crate) end_pos: u64,
    pub(crate) num_connections: u32,
    pub(crate) max_speed: Option<u64>,
    pub(crate) num_retry: u32,
    pub(crate) max_retries: u32,
    pub(crate) start_time: Option<Ds>,
    pub(crate) time: Ds,
    pub(crate) update_time: Ds,
    pub(crate) speed: u64,
    pub(crate) delta_size: u64,
    pub(crate) transferred_bytes: u64,
    pub(crate) total_bytes: u64,
    pub(crate) listener: Option<Arc<dyn TransferListener>>,
}

impl Transfer {
    pub fn new(transfer_type: TransferType) -> Self {
        Self {
            transfer_type,
            tag: None,
            engine_id: None,
            path: None,
            parent_path: None,
            file_name: None,
            node_handle: None,
            parent_handle: None,
            public_node: None,
            base64_key: None,
            start_pos: 0,
            end_pos: 0,
            num_connections: 1,
            max_speed: None,
            num_retry: 0,
            max_retries: 0,
            start_time: None,
            time: 0,
            update_time: 0,
            speed: 0,
            delta_size: 0,
            transferred_bytes: 0,
            total_bytes: 0,
            listener: None,
        }
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    /// Tag the transfer is filed under once the dispatch loop accepted it.
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    pub fn engine_id(&self) -> Option<TransferId> {
        self.engine_id
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn parent_path(&self) -> Option<&str> {
        self.parent_path.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn node_handle(&self) -> Option<Handle> {
        self.node_handle
    }

    pub fn parent_handle(&self) -> Option<Handle> {
        self.parent_handle
    }

    pub fn public_node(&self) -> Option<&PublicNode> {
        self.public_node.as_ref()
    }

    pub fn base64_key(&self) -> Option<&str> {
        self.base64_key.as_deref()
    }

    pub fn start_pos(&self) -> u64 {
        self.start_pos
    }

    pub fn end_pos(&self) -> u64 {
        self.end_pos
    }

    pub fn num_connections(&self) -> u32 {
        self.num_connections
    }

    pub fn max_speed(&self) -> Option<u64> {
        self.max_speed
    }

    pub fn num_retry(&self) -> u32 {
        self.num_retry
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn start_time(&self) -> Option<Ds> {
        self.start_time
    }

    /// Time the engine last moved data for this transfer.
    pub fn time(&self) -> Ds {
        self.time
    }

    pub fn update_time(&self) -> Ds {
        self.update_time
    }

    /// Bytes per second.
    pub fn speed(&self) -> u64 {
        self.speed
    }

    /// Bytes moved since the previous update.
    pub fn delta_size(&self) -> u64 {
        self.delta_size
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn listener(&self) -> Option<&Arc<dyn TransferListener>> {
        self.listener.as_ref()
    }

    /// Set the local path; the file name becomes its last component.
    pub fn set_path(&mut self, path: Option<&str>) {
        self.path = path.map(str::to_string);
        if let Some(p) = path {
            let name = p.rsplit(['/', '\\']).next().unwrap_or(p);
            self.file_name = Some(name.to_string());
        }
    }

    pub fn set_parent_path(&mut self, path: Option<&str>) {
        self.parent_path = path.map(str::to_string);
    }

    pub fn set_file_name(&mut self, name: Option<&str>) {
        self.file_name = name.map(str::to_string);
    }

    /// Attach an owned copy of `node`, or drop the current one.
    pub fn set_public_node(&mut self, node: Option<&PublicNode>) {
        self.public_node = node.cloned();
    }

    pub(crate) fn with_listener(mut self, listener: Option<Arc<dyn TransferListener>>) -> Self {
        self.listener = listener;
        self
    }
}

impl fmt::Debug for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transfer")
            .field("type", &self.transfer_type)
            .field("tag", &self.tag)
            .field("engine_id", &self.engine_id)
            .field("path", &self.path)
            .field("file_name", &self.file_name)
            .field("node_handle", &self.node_handle)
            .field("transferred_bytes", &self.transferred_bytes)
            .field("total_bytes", &self.total_bytes)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}
