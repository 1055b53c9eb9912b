//! Interface to the client engine driven by the dispatch loop.
//!
//! The engine owns the session, the node tree, transfer execution and the
//! sync engine. Every call here happens on the dispatch thread (or under
//! the facade lock from a reader thread); results of asynchronous calls
//! come back as [`EngineEvent`]s from [`Engine::exec`], tagged with the
//! tag passed to the originating call.

mod event;
mod waiter;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

pub use event::{EngineEvent, ExportedLink, OpenedLink, SignupLink, UploadToken};
pub use waiter::{CondvarWaiter, Waiter};

use crate::api::error::ErrorCode;
use crate::fs::{AccessLevel, DetailParts, Handle, Node, User};
use crate::public::PublicNode;
use crate::transfer::TransferType;

/// Correlation tag allocated by the engine for each submitted operation.
pub type Tag = u32;

/// Engine clock value in deciseconds.
pub type Ds = i64;

/// Password-derived key used for login and account operations.
pub type PwKey = [u8; 16];

/// Stable identifier of a transfer inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(pub u64);

/// Handles of the account roots, once the tree is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RootNodes {
    pub root: Option<Handle>,
    pub inbox: Option<Handle>,
    pub rubbish: Option<Handle>,
    pub mail: Option<Handle>,
}

/// Sync status of a local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    NotFound,
    Synced,
    Pending,
    Syncing,
    Ignored,
}

/// File descriptor submitted to the engine when a transfer starts.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferFile {
    Upload {
        tag: Tag,
        /// Source in local encoding.
        local_path: String,
        parent: Option<Handle>,
        name: String,
        thumbnail: Option<Vec<u8>>,
        connections: u32,
        max_speed: Option<u64>,
    },
    Download {
        tag: Tag,
        /// Node in the logged-in tree, if not a public download.
        node: Option<Handle>,
        public_node: Option<PublicNode>,
        /// Target in local encoding.
        local_path: String,
        start: u64,
        end: u64,
        connections: u32,
    },
}

impl TransferFile {
    pub fn tag(&self) -> Tag {
        match self {
            TransferFile::Upload { tag, .. } | TransferFile::Download { tag, .. } => *tag,
        }
    }
}

/// Read-only view of the engine's node tree and contacts.
pub trait NodeTree {
    fn logged_in(&self) -> bool;
    fn my_email(&self) -> Option<String>;
    fn root_nodes(&self) -> RootNodes;
    fn node(&self, handle: Handle) -> Option<Node>;
    /// Direct children in engine order.
    fn children(&self, handle: Handle) -> Vec<Node>;
    fn users(&self) -> Vec<User>;
}

/// The client engine.
///
/// Submit calls either return synchronously with a local error (the
/// operation was not started) or start the operation, whose outcome later
/// arrives as an event carrying the same tag.
pub trait Engine: NodeTree + Send {
    /// Allocate the next correlation tag.
    fn next_tag(&mut self) -> Tag;
    /// Run one round of network and timer work.
    fn exec(&mut self) -> Vec<EngineEvent>;
    /// Latest time the dispatch loop may sleep before calling `exec` again.
    fn next_wakeup(&self) -> Option<Duration>;

    // Session and account.
    fn pw_key(&self, password: &str) -> Result<PwKey, ErrorCode>;
    fn login(&mut self, tag: Tag, email: &str, pw_key: &PwKey);
    fn logout(&mut self);
    fn fetch_nodes(&mut self, tag: Tag);
    fn folder_access(&mut self, handle: &str, key: &str) -> Result<(), ErrorCode>;
    fn account_details(&mut self, tag: Tag, parts: DetailParts);
    fn change_password(&mut self, tag: Tag, old: &PwKey, new: &PwKey) -> Result<(), ErrorCode>;
    fn invite(&mut self, tag: Tag, email: &str);
    fn create_ephemeral(&mut self, tag: Tag);
    fn send_signup_link(&mut self, tag: Tag, email: &str, name: &str, pw_key: &PwKey);
    fn query_signup_link(&mut self, tag: Tag, code: &[u8]);
    fn confirm_signup_link(
        &mut self,
        tag: Tag,
        link: &SignupLink,
        pw_key: &PwKey,
    ) -> Result<(), ErrorCode>;
    fn retry_pending_connections(&mut self);

    // Tree mutation.
    fn create_folder(&mut self, tag: Tag, parent: Handle, name: &str);
    fn move_node(&mut self, tag: Tag, node: Handle, new_parent: Handle) -> Result<(), ErrorCode>;
    fn copy_node(&mut self, tag: Tag, node: Handle, target: Handle) -> Result<(), ErrorCode>;
    fn rename_node(&mut self, tag: Tag, node: Handle, name: &str) -> Result<(), ErrorCode>;
    fn unlink(&mut self, tag: Tag, node: Handle) -> Result<(), ErrorCode>;
    fn set_share(&mut self, tag: Tag, node: Handle, email: &str, access: AccessLevel);
    fn export_node(&mut self, tag: Tag, node: Handle) -> Result<(), ErrorCode>;
    fn open_file_link(&mut self, tag: Tag, handle: &str, key: &str) -> Result<(), ErrorCode>;
    fn put_public_node(&mut self, tag: Tag, parent: Option<Handle>, node: &PublicNode);
    fn put_upload(&mut self, tag: Tag, parent: Option<Handle>, name: &str, token: &UploadToken);
    fn get_file_attribute(&mut self, tag: Tag, node: Handle, attr_type: u32)
    -> Result<(), ErrorCode>;
    /// Stop retrying the file attribute fetch filed under `tag`.
    fn abandon_file_attribute(&mut self, tag: Tag);
    fn put_file_attribute(&mut self, tag: Tag, node: Handle, attr_type: u32, data: Vec<u8>);

    // Tree checks.
    fn check_access(&self, node: Handle, level: AccessLevel) -> bool;
    fn check_move(&self, node: Handle, target: Handle) -> ErrorCode;

    // Transfers.
    fn start_transfer(&mut self, file: TransferFile);
    fn has_transfer(&self, id: TransferId) -> bool;
    /// True for transfers started by the sync engine rather than a caller.
    fn is_sync_transfer(&self, id: TransferId) -> bool;
    fn transfers(&self, direction: TransferType) -> Vec<TransferId>;
    fn stop_transfer(&mut self, id: TransferId);
    fn set_transfer_temp_path(&mut self, id: TransferId, local_path: &str);
    fn pause_transfers(&mut self, direction: TransferType, pause: bool);
    fn set_upload_limit(&mut self, bytes_per_second: i32);

    // Syncs.
    fn add_sync(&mut self, local_path: &str, node: Handle) -> Result<(), ErrorCode>;
    /// Remove the sync rooted at `node`; false if there is none.
    fn remove_sync(&mut self, node: Handle) -> bool;
    fn stop_syncs(&mut self);
    fn num_syncs(&self) -> usize;
    fn sync_path_state(&self, local_path: &str) -> PathState;
}
