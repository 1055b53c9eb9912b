//! Listener traits, registries and notification fan-out.
//!
//! Every notification is delivered in a fixed order: the registry of its
//! category, then the all-events registry, then the listener embedded in
//! the request or transfer it concerns. All callbacks run on the dispatch
//! thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::api::MegaApi;
use crate::api::error::ApiError;
use crate::fs::{Node, User};
use crate::request::Request;
use crate::transfer::Transfer;

/// Receives request lifecycle notifications.
pub trait RequestListener: Send + Sync {
    fn on_request_start(&self, _api: &MegaApi, _request: &Request) {}
    /// Last notification for `request`.
    fn on_request_finish(&self, _api: &MegaApi, _request: &Request, _error: &ApiError) {}
    fn on_request_temporary_error(&self, _api: &MegaApi, _request: &Request, _error: &ApiError) {}
}

/// Receives transfer lifecycle notifications.
pub trait TransferListener: Send + Sync {
    fn on_transfer_start(&self, _api: &MegaApi, _transfer: &Transfer) {}
    /// Last notification for `transfer`.
    fn on_transfer_finish(&self, _api: &MegaApi, _transfer: &Transfer, _error: &ApiError) {}
    fn on_transfer_update(&self, _api: &MegaApi, _transfer: &Transfer) {}
    fn on_transfer_temporary_error(
        &self,
        _api: &MegaApi,
        _transfer: &Transfer,
        _error: &ApiError,
    ) {
    }
}

/// Receives account-wide change notifications.
pub trait GlobalListener: Send + Sync {
    fn on_users_update(&self, _api: &MegaApi, _users: &[User]) {}
    /// `None` means the whole tree must be considered changed.
    fn on_nodes_update(&self, _api: &MegaApi, _nodes: Option<&[Node]>) {}
    fn on_reload_needed(&self, _api: &MegaApi) {}
}

/// Receives every notification.
pub trait MegaListener: RequestListener + TransferListener + GlobalListener {
    fn on_sync_state_changed(&self, _api: &MegaApi) {}
}

/// Identifies one registration; pass it back to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registry<L: ?Sized> {
    entries: Mutex<Vec<(ListenerId, Arc<L>)>>,
}

impl<L: ?Sized> Registry<L> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn add(&self, id: ListenerId, listener: Arc<L>) {
        self.entries.lock().push((id, listener));
    }

    fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Members at this instant; the lock is not held while calling them.
    fn snapshot(&self) -> Vec<Arc<L>> {
        self.entries.lock().iter().map(|(_, l)| l.clone()).collect()
    }
}

/// Something to tell listeners, queued while the engine state is borrowed.
pub(crate) enum Notification {
    RequestStart(Request),
    RequestFinish(Request, ApiError),
    RequestTemporaryError(Request, ApiError),
    TransferStart(Transfer),
    TransferFinish(Transfer, ApiError),
    TransferUpdate(Transfer),
    TransferTemporaryError(Transfer, ApiError),
    UsersUpdated(Vec<User>),
    NodesUpdated(Option<Vec<Node>>),
    ReloadNeeded,
    SyncStateChanged,
}

/// The four listener registries.
pub(crate) struct Listeners {
    next_id: AtomicU64,
    request: Registry<dyn RequestListener>,
    transfer: Registry<dyn TransferListener>,
    global: Registry<dyn GlobalListener>,
    all: Registry<dyn MegaListener>,
}

impl Listeners {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            request: Registry::new(),
            transfer: Registry::new(),
            global: Registry::new(),
            all: Registry::new(),
        }
    }

    fn allocate(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn add_request_listener(&self, listener: Arc<dyn RequestListener>) -> ListenerId {
        let id = self.allocate();
        self.request.add(id, listener);
        id
    }

    pub(crate) fn add_transfer_listener(&self, listener: Arc<dyn TransferListener>) -> ListenerId {
        let id = self.allocate();
        self.transfer.add(id, listener);
        id
    }

    pub(crate) fn add_global_listener(&self, listener: Arc<dyn GlobalListener>) -> ListenerId {
        let id = self.allocate();
        self.global.add(id, listener);
        id
    }

    pub(crate) fn add_listener(&self, listener: Arc<dyn MegaListener>) -> ListenerId {
        let id = self.allocate();
        self.all.add(id, listener);
        id
    }

    /// Remove a registration from whichever registry holds it.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        self.request.remove(id)
            || self.transfer.remove(id)
            || self.global.remove(id)
            || self.all.remove(id)
    }

    /// Deliver one notification. Dropping it afterwards retires the record
    /// for finish notifications.
    pub(crate) fn deliver(&self, api: &MegaApi, notification: Notification) {
        match notification {
            Notification::RequestStart(request) => {
                trace!("request start: {} ({:?})", request.request_type(), request.tag());
                for l in self.request.snapshot() {
                    l.on_request_start(api, &request);
                }
                for l in self.all.snapshot() {
                    l.on_request_start(api, &request);
                }
                if let Some(l) = request.listener() {
                    l.on_request_start(api, &request);
                }
            }
            Notification::RequestFinish(request, error) => {
                trace!(
                    "request finish: {} ({:?}): {}",
                    request.request_type(),
                    request.tag(),
                    error
                );
                for l in self.request.snapshot() {
                    l.on_request_finish(api, &request, &error);
                }
                for l in self.all.snapshot() {
                    l.on_request_finish(api, &request, &error);
                }
                if let Some(l) = request.listener() {
                    l.on_request_finish(api, &request, &error);
                }
            }
            Notification::RequestTemporaryError(request, error) => {
                for l in self.request.snapshot() {
                    l.on_request_temporary_error(api, &request, &error);
                }
                for l in self.all.snapshot() {
                    l.on_request_temporary_error(api, &request, &error);
                }
                if let Some(l) = request.listener() {
                    l.on_request_temporary_error(api, &request, &error);
                }
            }
            Notification::TransferStart(transfer) => {
                for l in self.transfer.snapshot() {
                    l.on_transfer_start(api, &transfer);
                }
                for l in self.all.snapshot() {
                    l.on_transfer_start(api, &transfer);
                }
                if let Some(l) = transfer.listener() {
                    l.on_transfer_start(api, &transfer);
                }
            }
            Notification::TransferFinish(transfer, error) => {
                trace!("transfer finish: {:?}: {}", transfer.tag(), error);
                for l in self.transfer.snapshot() {
                    l.on_transfer_finish(api, &transfer, &error);
                }
                for l in self.all.snapshot() {
                    l.on_transfer_finish(api, &transfer, &error);
                }
                if let Some(l) = transfer.listener() {
                    l.on_transfer_finish(api, &transfer, &error);
                }
            }
            Notification::TransferUpdate(transfer) => {
                for l in self.transfer.snapshot() {
                    l.on_transfer_update(api, &transfer);
                }
                for l in self.all.snapshot() {
                    l.on_transfer_update(api, &transfer);
                }
                if let Some(l) = transfer.listener() {
                    l.on_transfer_update(api, &transfer);
                }
            }
            Notification::TransferTemporaryError(transfer, error) => {
                for l in self.transfer.snapshot() {
                    l.on_transfer_temporary_error(api, &transfer, &error);
                }
                for l in self.all.snapshot() {
                    l.on_transfer_temporary_error(api, &transfer, &error);
                }
                if let Some(l) = transfer.listener() {
                    l.on_transfer_temporary_error(api, &transfer, &error);
                }
            }
            Notification::UsersUpdated(users) => {
                for l in self.global.snapshot() {
                    l.on_users_update(api, &users);
                }
                for l in self.all.snapshot() {
                    l.on_users_update(api, &users);
                }
            }
            Notification::NodesUpdated(nodes) => {
                for l in self.global.snapshot() {
                    l.on_nodes_update(api, nodes.as_deref());
                }
                for l in self.all.snapshot() {
                    l.on_nodes_update(api, nodes.as_deref());
                }
            }
            Notification::ReloadNeeded => {
                for l in self.global.snapshot() {
                    l.on_reload_needed(api);
                }
                for l in self.all.snapshot() {
                    l.on_reload_needed(api);
                }
            }
            Notification::SyncStateChanged => {
                for l in self.all.snapshot() {
                    l.on_sync_state_changed(api);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorCode;
    use crate::config::Config;
    use crate::engine::fake::FakeEngine;
    use crate::request::RequestType;

    struct Tracer {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RequestListener for Tracer {
        fn on_request_finish(&self, _api: &MegaApi, request: &Request, error: &ApiError) {
            self.log
                .lock()
                .push(format!("{}:{}:{}", self.name, request.request_type(), error.error_code()));
        }
    }

    impl TransferListener for Tracer {}

    impl GlobalListener for Tracer {
        fn on_reload_needed(&self, _api: &MegaApi) {
            self.log.lock().push(format!("{}:reload", self.name));
        }
    }

    impl MegaListener for Tracer {
        fn on_sync_state_changed(&self, _api: &MegaApi) {
            self.log.lock().push(format!("{}:sync", self.name));
        }
    }

    fn tracer(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<Tracer> {
        Arc::new(Tracer {
            name,
            log: log.clone(),
        })
    }

    fn idle_api() -> MegaApi {
        let (engine, _handle) = FakeEngine::new();
        MegaApi::new(engine, Config::default()).unwrap()
    }

    #[test]
    fn test_fan_out_order() {
        let api = idle_api();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new();
        listeners.add_listener(tracer("all", &log));
        listeners.add_request_listener(tracer("category", &log));

        let embedded: Arc<dyn RequestListener> = tracer("embedded", &log);
        let request = Request::new(RequestType::Mkdir).with_listener(Some(embedded));
        listeners.deliver(
            &api,
            Notification::RequestFinish(request, ApiError::new(ErrorCode::Args)),
        );

        assert_eq!(
            *log.lock(),
            vec!["category:mkdir:-2", "all:mkdir:-2", "embedded:mkdir:-2"]
        );
        api.shutdown();
    }

    #[test]
    fn test_remove_by_id() {
        let api = idle_api();
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new();
        let global = listeners.add_global_listener(tracer("global", &log));
        let all = listeners.add_listener(tracer("all", &log));

        listeners.deliver(&api, Notification::ReloadNeeded);
        assert!(listeners.remove(global));
        assert!(!listeners.remove(global));
        listeners.deliver(&api, Notification::ReloadNeeded);
        listeners.deliver(&api, Notification::SyncStateChanged);
        assert!(listeners.remove(all));
        listeners.deliver(&api, Notification::SyncStateChanged);

        assert_eq!(
            *log.lock(),
            vec!["global:reload", "all:reload", "all:reload", "all:sync"]
        );
        api.shutdown();
    }

    #[test]
    fn test_listener_ids_are_unique() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let listeners = Listeners::new();
        let a = listeners.add_request_listener(tracer("a", &log));
        let b = listeners.add_request_listener(tracer("b", &log));
        assert_ne!(a, b);
    }
}
