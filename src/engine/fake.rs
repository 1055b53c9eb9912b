//! Scripted in-memory engine for tests.
//!
//! Every engine call is recorded. A responder closure turns calls into the
//! events the next `exec` round returns, so a test scripts the engine's
//! side of each exchange.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::api::error::ErrorCode;
use crate::engine::{
    Engine, EngineEvent, NodeTree, PathState, PwKey, RootNodes, SignupLink, Tag, TransferFile,
    TransferId, UploadToken,
};
use crate::fs::{AccessLevel, DetailParts, Handle, InShare, Node, NodeType, User, Visibility};
use crate::public::PublicNode;
use crate::transfer::TransferType;

/// Node tree kept in insertion order.
pub(crate) struct FakeTree {
    pub(crate) logged_in: bool,
    pub(crate) email: Option<String>,
    pub(crate) roots: RootNodes,
    nodes: HashMap<Handle, Node>,
    order: Vec<Handle>,
    users: Vec<User>,
}

impl FakeTree {
    pub(crate) fn empty() -> Self {
        Self {
            logged_in: true,
            email: Some("me@example.com".into()),
            roots: RootNodes::default(),
            nodes: HashMap::new(),
            order: Vec::new(),
            users: Vec::new(),
        }
    }

    pub(crate) fn with_roots(root: Handle, inbox: Handle, rubbish: Handle) -> Self {
        let mut tree = Self::empty();
        tree.insert(root, None, NodeType::Root, "Cloud Drive", 0);
        tree.insert(inbox, None, NodeType::Inbox, "Inbox", 0);
        tree.insert(rubbish, None, NodeType::Rubbish, "Rubbish Bin", 0);
        tree.roots = RootNodes {
            root: Some(root),
            inbox: Some(inbox),
            rubbish: Some(rubbish),
            mail: None,
        };
        tree
    }

    fn insert(
        &mut self,
        handle: Handle,
        parent: Option<Handle>,
        node_type: NodeType,
        name: &str,
        size: u64,
    ) {
        let node = Node {
            handle,
            parent_handle: parent,
            node_type,
            name: name.to_string(),
            size,
            ctime: handle as i64,
            mtime: handle as i64,
            inshare: None,
        };
        if self.nodes.insert(handle, node).is_none() {
            self.order.push(handle);
        }
    }

    pub(crate) fn add_folder(&mut self, handle: Handle, parent: Handle, name: &str) {
        self.insert(handle, Some(parent), NodeType::Folder, name, 0);
    }

    pub(crate) fn add_file(&mut self, handle: Handle, parent: Handle, name: &str, size: u64) {
        self.insert(handle, Some(parent), NodeType::File, name, size);
    }

    pub(crate) fn set_inshare(&mut self, handle: Handle, share: InShare) {
        if let Some(node) = self.nodes.get_mut(&handle) {
            node.inshare = Some(share);
        }
    }

    pub(crate) fn add_user(&mut self, handle: Handle, email: &str, sharing: Vec<Handle>) {
        self.users.push(User {
            handle,
            email: email.to_string(),
            visibility: Visibility::Visible,
            sharing,
        });
    }

    pub(crate) fn remove(&mut self, handle: Handle) {
        self.nodes.remove(&handle);
        self.order.retain(|h| *h != handle);
    }
}

impl NodeTree for FakeTree {
    fn logged_in(&self) -> bool {
        self.logged_in
    }

    fn my_email(&self) -> Option<String> {
        self.email.clone()
    }

    fn root_nodes(&self) -> RootNodes {
        self.roots
    }

    fn node(&self, handle: Handle) -> Option<Node> {
        self.nodes.get(&handle).cloned()
    }

    fn children(&self, handle: Handle) -> Vec<Node> {
        self.order
            .iter()
            .filter_map(|h| self.nodes.get(h))
            .filter(|n| n.parent_handle == Some(handle))
            .cloned()
            .collect()
    }

    fn users(&self) -> Vec<User> {
        self.users.clone()
    }
}

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Login { tag: Tag, email: String, pw_key: PwKey },
    Logout,
    FetchNodes { tag: Tag },
    FolderAccess { handle: String, key: String },
    AccountDetails { tag: Tag, parts: DetailParts },
    ChangePassword { tag: Tag },
    Invite { tag: Tag, email: String },
    CreateEphemeral { tag: Tag },
    SendSignupLink { tag: Tag, email: String, name: String },
    QuerySignupLink { tag: Tag, code: Vec<u8> },
    ConfirmSignupLink { tag: Tag, email: String },
    RetryPendingConnections,
    CreateFolder { tag: Tag, parent: Handle, name: String },
    MoveNode { tag: Tag, node: Handle, new_parent: Handle },
    CopyNode { tag: Tag, node: Handle, target: Handle },
    RenameNode { tag: Tag, node: Handle, name: String },
    Unlink { tag: Tag, node: Handle },
    SetShare { tag: Tag, node: Handle, email: String, access: AccessLevel },
    ExportNode { tag: Tag, node: Handle },
    OpenFileLink { tag: Tag, handle: String, key: String },
    PutPublicNode { tag: Tag, parent: Option<Handle>, name: String },
    PutUpload { tag: Tag, parent: Option<Handle>, name: String },
    GetFileAttribute { tag: Tag, node: Handle, attr_type: u32 },
    AbandonFileAttribute { tag: Tag },
    PutFileAttribute { tag: Tag, node: Handle, attr_type: u32, data: Vec<u8> },
    StartTransfer { id: TransferId, file: TransferFile },
    StopTransfer { id: TransferId },
    SetTransferTempPath { id: TransferId, local_path: String },
    PauseTransfers { direction: TransferType, pause: bool },
    SetUploadLimit { bytes_per_second: i32 },
    AddSync { local_path: String, node: Handle },
    RemoveSync { node: Handle },
    StopSyncs,
}

type Responder = Box<dyn FnMut(&Call) -> Vec<EngineEvent> + Send>;

struct ActiveTransfer {
    direction: TransferType,
    sync: bool,
}

struct FakeState {
    tree: FakeTree,
    next_tag: Tag,
    next_transfer: u64,
    calls: Vec<Call>,
    events: VecDeque<EngineEvent>,
    active: HashMap<TransferId, ActiveTransfer>,
    syncs: Vec<(String, Handle)>,
    denied: HashSet<Handle>,
    move_check: ErrorCode,
}

/// Engine half of the fake, handed to the facade.
pub(crate) struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    responder: Arc<Mutex<Responder>>,
}

/// Test half of the fake: scripts responses and inspects calls.
#[derive(Clone)]
pub(crate) struct FakeHandle {
    state: Arc<Mutex<FakeState>>,
    responder: Arc<Mutex<Responder>>,
}

impl FakeEngine {
    pub(crate) fn new() -> (FakeEngine, FakeHandle) {
        Self::with_tree(FakeTree::empty())
    }

    pub(crate) fn with_tree(tree: FakeTree) -> (FakeEngine, FakeHandle) {
        let state = Arc::new(Mutex::new(FakeState {
            tree,
            next_tag: 0,
            next_transfer: 0,
            calls: Vec::new(),
            events: VecDeque::new(),
            active: HashMap::new(),
            syncs: Vec::new(),
            denied: HashSet::new(),
            move_check: ErrorCode::Ok,
        }));
        let responder: Arc<Mutex<Responder>> = Arc::new(Mutex::new(Box::new(|_| Vec::new())));
        let engine = FakeEngine {
            state: state.clone(),
            responder: responder.clone(),
        };
        (engine, FakeHandle { state, responder })
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call.clone());
        let events = {
            let mut responder = self.responder.lock();
            (&mut **responder)(&call)
        };
        self.state.lock().events.extend(events);
    }
}

impl FakeHandle {
    /// Replace the responder consulted on every engine call.
    pub(crate) fn respond_with<F>(&self, responder: F)
    where
        F: FnMut(&Call) -> Vec<EngineEvent> + Send + 'static,
    {
        *self.responder.lock() = Box::new(responder);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Queue an event for the next `exec` round.
    pub(crate) fn push_event(&self, event: EngineEvent) {
        self.state.lock().events.push_back(event);
    }

    pub(crate) fn with_tree<R>(&self, f: impl FnOnce(&mut FakeTree) -> R) -> R {
        f(&mut self.state.lock().tree)
    }

    pub(crate) fn set_logged_in(&self, logged_in: bool) {
        self.state.lock().tree.logged_in = logged_in;
    }

    pub(crate) fn deny_access(&self, node: Handle) {
        self.state.lock().denied.insert(node);
    }

    pub(crate) fn set_move_check(&self, code: ErrorCode) {
        self.state.lock().move_check = code;
    }

    /// Register a transfer the engine runs without a facade request.
    pub(crate) fn add_active_transfer(&self, id: TransferId, direction: TransferType, sync: bool) {
        self.state
            .lock()
            .active
            .insert(id, ActiveTransfer { direction, sync });
    }

    pub(crate) fn is_active(&self, id: TransferId) -> bool {
        self.state.lock().active.contains_key(&id)
    }
}

impl NodeTree for FakeEngine {
    fn logged_in(&self) -> bool {
        self.state.lock().tree.logged_in()
    }

    fn my_email(&self) -> Option<String> {
        self.state.lock().tree.my_email()
    }

    fn root_nodes(&self) -> RootNodes {
        self.state.lock().tree.root_nodes()
    }

    fn node(&self, handle: Handle) -> Option<Node> {
        self.state.lock().tree.node(handle)
    }

    fn children(&self, handle: Handle) -> Vec<Node> {
        self.state.lock().tree.children(handle)
    }

    fn users(&self) -> Vec<User> {
        self.state.lock().tree.users()
    }
}

impl Engine for FakeEngine {
    fn next_tag(&mut self) -> Tag {
        let mut state = self.state.lock();
        state.next_tag += 1;
        state.next_tag
    }

    fn exec(&mut self) -> Vec<EngineEvent> {
        self.state.lock().events.drain(..).collect()
    }

    fn next_wakeup(&self) -> Option<Duration> {
        if self.state.lock().events.is_empty() {
            None
        } else {
            Some(Duration::ZERO)
        }
    }

    fn pw_key(&self, password: &str) -> Result<PwKey, ErrorCode> {
        if password.is_empty() {
            return Err(ErrorCode::Args);
        }
        let mut key = [0u8; 16];
        for (i, b) in password.bytes().enumerate() {
            key[i % 16] ^= b;
        }
        Ok(key)
    }

    fn login(&mut self, tag: Tag, email: &str, pw_key: &PwKey) {
        self.record(Call::Login {
            tag,
            email: email.to_string(),
            pw_key: *pw_key,
        });
    }

    fn logout(&mut self) {
        self.state.lock().tree.logged_in = false;
        self.record(Call::Logout);
    }

    fn fetch_nodes(&mut self, tag: Tag) {
        self.record(Call::FetchNodes { tag });
    }

    fn folder_access(&mut self, handle: &str, key: &str) -> Result<(), ErrorCode> {
        self.record(Call::FolderAccess {
            handle: handle.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    fn account_details(&mut self, tag: Tag, parts: DetailParts) {
        self.record(Call::AccountDetails { tag, parts });
    }

    fn change_password(&mut self, tag: Tag, _old: &PwKey, _new: &PwKey) -> Result<(), ErrorCode> {
        self.record(Call::ChangePassword { tag });
        Ok(())
    }

    fn invite(&mut self, tag: Tag, email: &str) {
        self.record(Call::Invite {
            tag,
            email: email.to_string(),
        });
    }

    fn create_ephemeral(&mut self, tag: Tag) {
        self.record(Call::CreateEphemeral { tag });
    }

    fn send_signup_link(&mut self, tag: Tag, email: &str, name: &str, _pw_key: &PwKey) {
        self.record(Call::SendSignupLink {
            tag,
            email: email.to_string(),
            name: name.to_string(),
        });
    }

    fn query_signup_link(&mut self, tag: Tag, code: &[u8]) {
        self.record(Call::QuerySignupLink {
            tag,
            code: code.to_vec(),
        });
    }

    fn confirm_signup_link(
        &mut self,
        tag: Tag,
        link: &SignupLink,
        _pw_key: &PwKey,
    ) -> Result<(), ErrorCode> {
        self.record(Call::ConfirmSignupLink {
            tag,
            email: link.email.clone(),
        });
        Ok(())
    }

    fn retry_pending_connections(&mut self) {
        self.record(Call::RetryPendingConnections);
    }

    fn create_folder(&mut self, tag: Tag, parent: Handle, name: &str) {
        self.record(Call::CreateFolder {
            tag,
            parent,
            name: name.to_string(),
        });
    }

    fn move_node(&mut self, tag: Tag, node: Handle, new_parent: Handle) -> Result<(), ErrorCode> {
        self.record(Call::MoveNode {
            tag,
            node,
            new_parent,
        });
        Ok(())
    }

    fn copy_node(&mut self, tag: Tag, node: Handle, target: Handle) -> Result<(), ErrorCode> {
        self.record(Call::CopyNode { tag, node, target });
        Ok(())
    }

    fn rename_node(&mut self, tag: Tag, node: Handle, name: &str) -> Result<(), ErrorCode> {
        self.record(Call::RenameNode {
            tag,
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn unlink(&mut self, tag: Tag, node: Handle) -> Result<(), ErrorCode> {
        self.record(Call::Unlink { tag, node });
        Ok(())
    }

    fn set_share(&mut self, tag: Tag, node: Handle, email: &str, access: AccessLevel) {
        self.record(Call::SetShare {
            tag,
            node,
            email: email.to_string(),
            access,
        });
    }

    fn export_node(&mut self, tag: Tag, node: Handle) -> Result<(), ErrorCode> {
        self.record(Call::ExportNode { tag, node });
        Ok(())
    }

    fn open_file_link(&mut self, tag: Tag, handle: &str, key: &str) -> Result<(), ErrorCode> {
        self.record(Call::OpenFileLink {
            tag,
            handle: handle.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    fn put_public_node(&mut self, tag: Tag, parent: Option<Handle>, node: &PublicNode) {
        self.record(Call::PutPublicNode {
            tag,
            parent,
            name: node.name().to_string(),
        });
    }

    fn put_upload(&mut self, tag: Tag, parent: Option<Handle>, name: &str, _token: &UploadToken) {
        self.record(Call::PutUpload {
            tag,
            parent,
            name: name.to_string(),
        });
    }

    fn get_file_attribute(
        &mut self,
        tag: Tag,
        node: Handle,
        attr_type: u32,
    ) -> Result<(), ErrorCode> {
        self.record(Call::GetFileAttribute {
            tag,
            node,
            attr_type,
        });
        Ok(())
    }

    fn abandon_file_attribute(&mut self, tag: Tag) {
        self.record(Call::AbandonFileAttribute { tag });
    }

    fn put_file_attribute(&mut self, tag: Tag, node: Handle, attr_type: u32, data: Vec<u8>) {
        self.record(Call::PutFileAttribute {
            tag,
            node,
            attr_type,
            data,
        });
    }

    fn check_access(&self, node: Handle, _level: AccessLevel) -> bool {
        !self.state.lock().denied.contains(&node)
    }

    fn check_move(&self, _node: Handle, _target: Handle) -> ErrorCode {
        self.state.lock().move_check
    }

    fn start_transfer(&mut self, file: TransferFile) {
        let id = {
            let mut state = self.state.lock();
            state.next_transfer += 1;
            let id = TransferId(state.next_transfer);
            let direction = match file {
                TransferFile::Upload { .. } => TransferType::Upload,
                TransferFile::Download { .. } => TransferType::Download,
            };
            state.active.insert(
                id,
                ActiveTransfer {
                    direction,
                    sync: false,
                },
            );
            id
        };
        self.record(Call::StartTransfer { id, file });
    }

    fn has_transfer(&self, id: TransferId) -> bool {
        self.state.lock().active.contains_key(&id)
    }

    fn is_sync_transfer(&self, id: TransferId) -> bool {
        self.state.lock().active.get(&id).is_some_and(|t| t.sync)
    }

    fn transfers(&self, direction: TransferType) -> Vec<TransferId> {
        let state = self.state.lock();
        let mut ids: Vec<TransferId> = state
            .active
            .iter()
            .filter(|(_, t)| t.direction == direction)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Stopped transfers are reported removed on the next round.
    fn stop_transfer(&mut self, id: TransferId) {
        let removed = self.state.lock().active.remove(&id);
        self.record(Call::StopTransfer { id });
        if let Some(transfer) = removed {
            self.state.lock().events.push_back(EngineEvent::TransferRemoved {
                id,
                direction: transfer.direction,
            });
        }
    }

    fn set_transfer_temp_path(&mut self, id: TransferId, local_path: &str) {
        self.record(Call::SetTransferTempPath {
            id,
            local_path: local_path.to_string(),
        });
    }

    fn pause_transfers(&mut self, direction: TransferType, pause: bool) {
        self.record(Call::PauseTransfers { direction, pause });
    }

    fn set_upload_limit(&mut self, bytes_per_second: i32) {
        self.record(Call::SetUploadLimit { bytes_per_second });
    }

    fn add_sync(&mut self, local_path: &str, node: Handle) -> Result<(), ErrorCode> {
        self.state
            .lock()
            .syncs
            .push((local_path.to_string(), node));
        self.record(Call::AddSync {
            local_path: local_path.to_string(),
            node,
        });
        Ok(())
    }

    fn remove_sync(&mut self, node: Handle) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let before = state.syncs.len();
            state.syncs.retain(|(_, h)| *h != node);
            state.syncs.len() != before
        };
        self.record(Call::RemoveSync { node });
        removed
    }

    fn stop_syncs(&mut self) {
        self.state.lock().syncs.clear();
        self.record(Call::StopSyncs);
    }

    fn num_syncs(&self) -> usize {
        self.state.lock().syncs.len()
    }

    fn sync_path_state(&self, local_path: &str) -> PathState {
        let state = self.state.lock();
        if state
            .syncs
            .iter()
            .any(|(root, _)| local_path.starts_with(root.as_str()))
        {
            PathState::Synced
        } else {
            PathState::NotFound
        }
    }
}
