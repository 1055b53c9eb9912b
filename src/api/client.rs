//! The thread-safe facade over the client engine.
//!
//! Operations that talk to the service are queued and return at once; their
//! outcome arrives through listener callbacks on the dispatch thread.
//! Accessors read the engine's state synchronously under the facade lock.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::api::error::{ApiError, ErrorCode};
use crate::base64;
use crate::config::Config;
use crate::dispatch::core::Core;
use crate::dispatch::{Shared, TransferCounters};
use crate::engine::{CondvarWaiter, Engine, NodeTree, PathState, Waiter};
use crate::error::Result;
use crate::fs::tree::{self, NodeOrder};
use crate::fs::{AccessLevel, DetailParts, FileSystemAccess, Handle, LocalFileSystem, Node, User};
use crate::listener::{
    GlobalListener, ListenerId, MegaListener, RequestListener, TransferListener,
};
use crate::preview::{ImageThumbnailer, Thumbnailer};
use crate::public::PublicNode;
use crate::request::{Request, RequestType};
use crate::transfer::{Transfer, TransferType};

/// File attribute type of thumbnails.
pub const ATTR_THUMBNAIL: u32 = 0;
/// File attribute type of previews.
pub const ATTR_PREVIEW: u32 = 1;

/// Parts requested by [`MegaApi::get_account_details`].
const DEFAULT_DETAILS: u32 = DetailParts::STORAGE | DetailParts::TRANSFER | DetailParts::PRO;

/// Local services the dispatch loop relies on besides the engine.
pub struct Collaborators {
    pub fs: Box<dyn FileSystemAccess>,
    pub thumbnailer: Box<dyn Thumbnailer>,
    pub waiter: Arc<dyn Waiter>,
}

impl Collaborators {
    /// Default collaborators honoring `config`.
    pub fn for_config(config: &Config) -> Self {
        Self {
            fs: Box::new(LocalFileSystem),
            thumbnailer: Box::new(ImageThumbnailer {
                videos: config.video_thumbnails,
            }),
            waiter: Arc::new(CondvarWaiter::new()),
        }
    }
}

/// Optional upload settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    /// Parallel connections; `None` keeps the engine default.
    pub connections: Option<u32>,
    /// Speed cap in bytes per second.
    pub max_speed: Option<u64>,
    /// Remote name instead of the local file name.
    pub name: Option<String>,
}

/// Handle to one facade instance. Clones share the same dispatch thread.
///
/// The thread stops when [`shutdown`](MegaApi::shutdown) is called or the
/// last handle is dropped.
#[derive(Clone)]
pub struct MegaApi {
    pub(crate) shared: Arc<Shared>,
}

impl MegaApi {
    /// Start a facade over `engine` with the default collaborators.
    pub fn new<E: Engine + 'static>(engine: E, config: Config) -> Result<Self> {
        let collaborators = Collaborators::for_config(&config);
        Self::with_collaborators(engine, config, collaborators)
    }

    pub fn with_collaborators<E: Engine + 'static>(
        mut engine: E,
        config: Config,
        collaborators: Collaborators,
    ) -> Result<Self> {
        if let Some(limit) = config.upload_limit {
            engine.set_upload_limit(limit);
        }
        let core = Core::new(
            Box::new(engine),
            collaborators.fs,
            collaborators.thumbnailer,
            collaborators.waiter,
            config,
        );
        let shared = Shared::start(core)?;
        debug!("Facade started");
        Ok(Self { shared })
    }

    pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Stop the dispatch thread and wait for it.
    ///
    /// Queued operations that were not dispatched yet are dropped without
    /// notifications. Safe to call from a listener callback.
    pub fn shutdown(&self) {
        self.shared.stop();
    }

    fn with_core<R>(&self, f: impl FnOnce(&Core) -> R) -> R {
        let guard = self.shared.core.lock();
        let core = guard.borrow();
        f(&core)
    }

    fn with_core_mut<R>(&self, f: impl FnOnce(&mut Core) -> R) -> R {
        let guard = self.shared.core.lock();
        let result = f(&mut guard.borrow_mut());
        self.shared.flush(self, &guard);
        result
    }

    fn enqueue(&self, request: Request, listener: Option<Arc<dyn RequestListener>>) {
        self.shared.requests.push(request.with_listener(listener));
        self.shared.wake();
    }

    fn enqueue_transfer(&self, transfer: Transfer, listener: Option<Arc<dyn TransferListener>>) {
        self.shared.transfers.push(transfer.with_listener(listener));
        self.shared.wake();
    }

    // Listener registration.

    pub fn add_request_listener(&self, listener: Arc<dyn RequestListener>) -> ListenerId {
        self.shared.listeners.add_request_listener(listener)
    }

    pub fn add_transfer_listener(&self, listener: Arc<dyn TransferListener>) -> ListenerId {
        self.shared.listeners.add_transfer_listener(listener)
    }

    pub fn add_global_listener(&self, listener: Arc<dyn GlobalListener>) -> ListenerId {
        self.shared.listeners.add_global_listener(listener)
    }

    /// Register a listener for every notification.
    pub fn add_listener(&self, listener: Arc<dyn MegaListener>) -> ListenerId {
        self.shared.listeners.add_listener(listener)
    }

    /// Unregister a listener. Returns false if `id` is not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id)
    }

    // Session and account.

    pub fn login(&self, email: &str, password: &str, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::Login);
        request.email = Some(email.to_string());
        request.password = Some(password.to_string());
        self.enqueue(request, listener);
    }

    /// Log in with a precomputed password key (base64).
    pub fn fast_login(
        &self,
        email: &str,
        string_hash: &str,
        base64_pw_key: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::FastLogin);
        request.email = Some(email.to_string());
        request.password = Some(string_hash.to_string());
        request.private_key = Some(base64_pw_key.to_string());
        self.enqueue(request, listener);
    }

    /// Open a public folder link as the session's tree.
    pub fn folder_access(&self, link: &str, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::FolderAccess);
        request.link = Some(link.to_string());
        self.enqueue(request, listener);
    }

    pub fn fetch_nodes(&self, listener: Option<Arc<dyn RequestListener>>) {
        self.enqueue(Request::new(RequestType::FetchNodes), listener);
    }

    /// Close the session. Everything still pending finishes with
    /// [`ErrorCode::Access`] before the logout itself finishes.
    pub fn logout(&self, listener: Option<Arc<dyn RequestListener>>) {
        self.enqueue(Request::new(RequestType::Logout), listener);
    }

    /// Storage, transfer and plan details of the account.
    pub fn get_account_details(&self, listener: Option<Arc<dyn RequestListener>>) {
        self.get_extended_account_details(DEFAULT_DETAILS, listener);
    }

    /// Account details for a mask of [`DetailParts`] flags.
    pub fn get_extended_account_details(
        &self,
        mask: u32,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::AccountDetails);
        request.num_details = mask;
        self.enqueue(request, listener);
    }

    pub fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::ChangePassword);
        request.password = Some(old_password.to_string());
        request.new_password = Some(new_password.to_string());
        self.enqueue(request, listener);
    }

    pub fn add_contact(&self, email: &str, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::AddContact);
        request.email = Some(email.to_string());
        self.enqueue(request, listener);
    }

    /// Register a new account; the service mails a confirmation link.
    pub fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::CreateAccount);
        request.email = Some(email.to_string());
        request.password = Some(password.to_string());
        request.name = Some(name.to_string());
        self.enqueue(request, listener);
    }

    pub fn fast_create_account(
        &self,
        email: &str,
        base64_pw_key: &str,
        name: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::FastCreateAccount);
        request.email = Some(email.to_string());
        request.private_key = Some(base64_pw_key.to_string());
        request.name = Some(name.to_string());
        self.enqueue(request, listener);
    }

    /// Read the email and name a confirmation link was issued for.
    pub fn query_signup_link(&self, link: &str, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::QuerySignupLink);
        request.link = Some(link.to_string());
        self.enqueue(request, listener);
    }

    pub fn confirm_account(
        &self,
        link: &str,
        password: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::ConfirmAccount);
        request.link = Some(link.to_string());
        request.password = Some(password.to_string());
        self.enqueue(request, listener);
    }

    pub fn fast_confirm_account(
        &self,
        link: &str,
        base64_pw_key: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::FastConfirmAccount);
        request.link = Some(link.to_string());
        request.private_key = Some(base64_pw_key.to_string());
        self.enqueue(request, listener);
    }

    pub fn retry_pending_connections(&self, listener: Option<Arc<dyn RequestListener>>) {
        self.enqueue(Request::new(RequestType::RetryPendingConnections), listener);
    }

    // Tree operations.

    pub fn create_folder(
        &self,
        name: &str,
        parent: Option<&Node>,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::Mkdir);
        request.name = Some(name.to_string());
        request.parent_handle = parent.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    /// Move `node` under `new_parent`. Moving to the current parent
    /// succeeds without contacting the service.
    pub fn move_node(
        &self,
        node: Option<&Node>,
        new_parent: Option<&Node>,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::Move);
        request.node_handle = node.map(|n| n.handle);
        request.parent_handle = new_parent.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    pub fn copy_node(
        &self,
        node: Option<&Node>,
        target: Option<&Node>,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::Copy);
        request.node_handle = node.map(|n| n.handle);
        request.parent_handle = target.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    pub fn rename_node(
        &self,
        node: Option<&Node>,
        new_name: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::Rename);
        request.node_handle = node.map(|n| n.handle);
        request.name = Some(new_name.to_string());
        self.enqueue(request, listener);
    }

    pub fn remove(&self, node: Option<&Node>, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::Remove);
        request.node_handle = node.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    /// Share a folder with a contact. `access` is `"r"`, `"rw"` or `"full"`.
    pub fn share(
        &self,
        node: Option<&Node>,
        email: &str,
        access: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::Share);
        request.node_handle = node.map(|n| n.handle);
        request.email = Some(email.to_string());
        request.access = Some(access.to_string());
        self.enqueue(request, listener);
    }

    /// Create a public link; it is available from the finished request.
    pub fn export_node(&self, node: Option<&Node>, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::Export);
        request.node_handle = node.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    /// Copy the file behind a public link into `parent`.
    pub fn import_file_link(
        &self,
        link: &str,
        parent: Option<&Node>,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::ImportLink);
        request.link = Some(link.to_string());
        request.parent_handle = parent.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    pub fn import_public_node(
        &self,
        public_node: Option<&PublicNode>,
        parent: Option<&Node>,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::ImportNode);
        request.set_public_node(public_node);
        request.parent_handle = parent.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    /// Resolve a public file link; the node is attached to the finished
    /// request.
    pub fn get_public_node(&self, link: &str, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::GetPublicNode);
        request.link = Some(link.to_string());
        self.enqueue(request, listener);
    }

    /// Fetch a file attribute of `node` into `dst_file_path`.
    pub fn get_node_attribute(
        &self,
        node: Option<&Node>,
        attr_type: u32,
        dst_file_path: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::GetAttrFile);
        request.node_handle = node.map(|n| n.handle);
        request.attr_type = attr_type;
        request.file = Some(dst_file_path.to_string());
        self.enqueue(request, listener);
    }

    /// Store the contents of `src_file_path` as a file attribute of `node`.
    pub fn set_node_attribute(
        &self,
        node: Option<&Node>,
        attr_type: u32,
        src_file_path: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::SetAttrFile);
        request.node_handle = node.map(|n| n.handle);
        request.attr_type = attr_type;
        request.file = Some(src_file_path.to_string());
        self.enqueue(request, listener);
    }

    pub fn get_thumbnail(
        &self,
        node: Option<&Node>,
        dst_file_path: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        self.get_node_attribute(node, ATTR_THUMBNAIL, dst_file_path, listener);
    }

    pub fn set_thumbnail(
        &self,
        node: Option<&Node>,
        src_file_path: &str,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        self.set_node_attribute(node, ATTR_THUMBNAIL, src_file_path, listener);
    }

    /// Keep `local_folder` and the remote folder `remote` in sync.
    pub fn sync_folder(
        &self,
        local_folder: &str,
        remote: Option<&Node>,
        listener: Option<Arc<dyn RequestListener>>,
    ) {
        let mut request = Request::new(RequestType::Sync);
        request.file = Some(local_folder.to_string());
        request.node_handle = remote.map(|n| n.handle);
        self.enqueue(request, listener);
    }

    pub fn pause_transfers(&self, pause: bool, listener: Option<Arc<dyn RequestListener>>) {
        let mut request = Request::new(RequestType::PauseTransfers);
        request.flag = pause;
        self.enqueue(request, listener);
    }

    // Transfers.

    pub fn start_upload(
        &self,
        local_path: &str,
        parent: Option<&Node>,
        listener: Option<Arc<dyn TransferListener>>,
    ) {
        self.start_upload_with(local_path, parent, UploadOptions::default(), listener);
    }

    pub fn start_upload_with(
        &self,
        local_path: &str,
        parent: Option<&Node>,
        options: UploadOptions,
        listener: Option<Arc<dyn TransferListener>>,
    ) {
        let mut transfer = Transfer::new(TransferType::Upload);
        transfer.set_path(Some(local_path));
        transfer.parent_handle = parent.map(|n| n.handle);
        if let Some(name) = options.name.as_deref() {
            transfer.set_file_name(Some(name));
        }
        if let Some(connections) = options.connections {
            transfer.num_connections = connections;
        }
        transfer.max_speed = options.max_speed;
        self.enqueue_transfer(transfer, listener);
    }

    /// Download `node` into the local folder `local_folder`.
    pub fn start_download(
        &self,
        node: Option<&Node>,
        local_folder: &str,
        listener: Option<Arc<dyn TransferListener>>,
    ) {
        self.start_download_range(node, local_folder, 0, 0, listener);
    }

    /// Download bytes `start..end` of `node`; `end == 0` means to the end.
    pub fn start_download_range(
        &self,
        node: Option<&Node>,
        local_folder: &str,
        start: u64,
        end: u64,
        listener: Option<Arc<dyn TransferListener>>,
    ) {
        let mut transfer = Transfer::new(TransferType::Download);
        transfer.node_handle = node.map(|n| n.handle);
        transfer.set_parent_path(Some(local_folder));
        transfer.start_pos = start;
        transfer.end_pos = end;
        self.enqueue_transfer(transfer, listener);
    }

    /// Download `node` to exactly `local_path`.
    pub fn start_download_to_file(
        &self,
        node: Option<&Node>,
        local_path: &str,
        listener: Option<Arc<dyn TransferListener>>,
    ) {
        let mut transfer = Transfer::new(TransferType::Download);
        transfer.node_handle = node.map(|n| n.handle);
        transfer.set_path(Some(local_path));
        transfer.set_parent_path(Some(parent_dir(local_path)));
        self.enqueue_transfer(transfer, listener);
    }

    /// Download the file behind a resolved public link.
    pub fn start_public_download(
        &self,
        public_node: Option<&PublicNode>,
        local_folder: &str,
        listener: Option<Arc<dyn TransferListener>>,
    ) {
        let mut transfer = Transfer::new(TransferType::Download);
        transfer.set_public_node(public_node);
        if let Some(node) = public_node {
            transfer.base64_key = Some(node.base64_key());
        }
        transfer.set_parent_path(Some(local_folder));
        self.enqueue_transfer(transfer, listener);
    }

    /// Ask the engine to stop `transfer`.
    ///
    /// Nothing happens if the engine no longer runs it or if the sync
    /// engine owns it. The finish arrives through the listeners.
    pub fn cancel_transfer(&self, transfer: &Transfer) {
        if let Some(tag) = transfer.tag() {
            self.with_core_mut(|core| core.cancel_transfer(tag));
        }
    }

    /// Stop every transfer in `direction` except those run by syncs.
    pub fn cancel_regular_transfers(&self, direction: TransferType) {
        self.with_core_mut(|core| core.cancel_regular_transfers(direction));
    }

    pub fn transfer_counters(&self) -> TransferCounters {
        self.with_core(|core| core.counters)
    }

    pub fn num_pending_uploads(&self) -> u32 {
        self.transfer_counters().pending_uploads
    }

    pub fn num_pending_downloads(&self) -> u32 {
        self.transfer_counters().pending_downloads
    }

    pub fn total_uploads(&self) -> u32 {
        self.transfer_counters().total_uploads
    }

    pub fn total_downloads(&self) -> u32 {
        self.transfer_counters().total_downloads
    }

    pub fn reset_transfer_counters(&self) {
        self.with_core_mut(|core| core.counters = TransferCounters::default());
    }

    /// Cap upload speed in bytes per second; 0 lets the engine pick, a
    /// negative value removes the cap.
    pub fn set_upload_limit(&self, bytes_per_second: i32) {
        self.with_core_mut(|core| core.engine.set_upload_limit(bytes_per_second));
    }

    // Syncs.

    pub fn sync_path_state(&self, path: &str) -> PathState {
        self.with_core(|core| {
            let local = core.fs.path_to_local(path);
            core.engine.sync_path_state(&local)
        })
    }

    /// Stop the sync rooted at `node`.
    pub fn remove_sync(&self, node: Option<&Node>) -> bool {
        match node {
            Some(node) => self.with_core_mut(|core| core.engine.remove_sync(node.handle)),
            None => false,
        }
    }

    pub fn num_active_syncs(&self) -> usize {
        self.with_core(|core| core.engine.num_syncs())
    }

    pub fn stop_syncs(&self) {
        self.with_core_mut(|core| core.engine.stop_syncs());
    }

    /// True while the sync engine scans local folders.
    pub fn is_sync_scanning(&self) -> bool {
        self.with_core(|core| core.sync_scanning)
    }

    // Tree reads.

    pub fn is_logged_in(&self) -> bool {
        self.with_core(|core| core.engine.logged_in())
    }

    pub fn my_email(&self) -> Option<String> {
        self.with_core(|core| core.engine.my_email())
    }

    pub fn root_node(&self) -> Option<Node> {
        self.with_core(|core| core.engine.root_nodes().root.and_then(|h| core.engine.node(h)))
    }

    pub fn inbox_node(&self) -> Option<Node> {
        self.with_core(|core| core.engine.root_nodes().inbox.and_then(|h| core.engine.node(h)))
    }

    pub fn rubbish_node(&self) -> Option<Node> {
        self.with_core(|core| {
            core.engine
                .root_nodes()
                .rubbish
                .and_then(|h| core.engine.node(h))
        })
    }

    pub fn mail_node(&self) -> Option<Node> {
        self.with_core(|core| core.engine.root_nodes().mail.and_then(|h| core.engine.node(h)))
    }

    pub fn node_by_handle(&self, handle: Handle) -> Option<Node> {
        self.with_core(|core| core.engine.node(handle))
    }

    pub fn children(&self, parent: &Node, order: NodeOrder) -> Vec<Node> {
        self.with_core(|core| tree::children(&*core.engine, parent.handle, order))
    }

    pub fn num_children(&self, parent: &Node) -> usize {
        self.with_core(|core| core.engine.children(parent.handle).len())
    }

    pub fn child_node(&self, parent: &Node, name: &str) -> Option<Node> {
        self.with_core(|core| tree::child_node(&*core.engine, parent.handle, name))
    }

    pub fn parent_node(&self, node: &Node) -> Option<Node> {
        self.with_core(|core| node.parent_handle.and_then(|h| core.engine.node(h)))
    }

    pub fn node_path(&self, node: &Node) -> Option<String> {
        self.with_core(|core| tree::node_path(&*core.engine, node.handle))
    }

    /// Resolve `path`; relative paths start at `cwd`.
    pub fn node_by_path(&self, path: &str, cwd: Option<&Node>) -> Option<Node> {
        self.with_core(|core| tree::node_by_path(&*core.engine, path, cwd.map(|n| n.handle)))
    }

    pub fn search(&self, node: &Node, needle: &str, recursive: bool) -> Vec<Node> {
        self.with_core(|core| tree::search(&*core.engine, node.handle, needle, recursive))
    }

    /// Access the logged-in account has on `node`.
    pub fn access(&self, node: &Node) -> Option<AccessLevel> {
        self.with_core(|core| tree::access_of(&*core.engine, node.handle))
    }

    /// Whether `node` grants `level` (`"r"`, `"rw"`, `"full"` or
    /// `"owner"`).
    pub fn check_access(&self, node: Option<&Node>, level: &str) -> ApiError {
        let Some(node) = node else {
            return ApiError::new(ErrorCode::Internal);
        };
        let level = tree::parse_check_level(level);
        let granted = self.with_core(|core| core.engine.check_access(node.handle, level));
        if granted {
            ApiError::ok()
        } else {
            ApiError::new(ErrorCode::Access)
        }
    }

    pub fn check_move(&self, node: Option<&Node>, target: Option<&Node>) -> ApiError {
        let (Some(node), Some(target)) = (node, target) else {
            return ApiError::new(ErrorCode::Internal);
        };
        self.with_core(|core| core.engine.check_move(node.handle, target.handle))
            .into()
    }

    /// Contacts ordered by email, case-insensitively.
    pub fn contacts(&self) -> Vec<User> {
        let mut users = self.with_core(|core| core.engine.users());
        users.sort_by(|a, b| cmp_emails(&a.email, &b.email));
        users
    }

    pub fn contact(&self, email: &str) -> Option<User> {
        self.with_core(|core| core.engine.users())
            .into_iter()
            .find(|u| u.email == email)
    }

    /// Folders `user` shares with this account.
    pub fn in_shares_of(&self, user: &User) -> Vec<Node> {
        self.with_core(|core| {
            user.sharing
                .iter()
                .filter_map(|h| core.engine.node(*h))
                .collect()
        })
    }

    /// Folders shared with this account by any contact.
    pub fn in_shares(&self) -> Vec<Node> {
        self.with_core(|core| {
            core.engine
                .users()
                .iter()
                .flat_map(|u| u.sharing.iter())
                .filter_map(|h| core.engine.node(*h))
                .collect()
        })
    }

    // Utilities.

    pub fn handle_to_base64(handle: Handle) -> String {
        base64::handle_to_base64(handle)
    }

    pub fn base64_to_handle(encoded: &str) -> Result<Handle> {
        base64::base64_to_handle(encoded)
    }
}

fn cmp_emails(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Folder part of a local file path.
fn parent_dir(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(0) => &path[..1],
        Some(pos) => &path[..pos],
        None => ".",
    }
}
