//! Awaitable completions for queued operations.
//!
//! A completion is a listener that forwards the finish notification of one
//! request or transfer into a `tokio` oneshot channel:
//!
//! ```no_run
//! # use megafacade::{MegaApi, RequestCompletion};
//! # async fn example(api: &MegaApi) -> megafacade::Result<()> {
//! let (listener, done) = RequestCompletion::new();
//! api.fetch_nodes(Some(listener));
//! let request = done.wait().await?;
//! println!("fetched as tag {:?}", request.tag());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::api::MegaApi;
use crate::api::error::ApiError;
use crate::error::{MegaError, Result};
use crate::listener::{RequestListener, TransferListener};
use crate::request::Request;
use crate::transfer::Transfer;

/// Listener side of a request completion.
pub struct RequestCompletion {
    tx: Mutex<Option<oneshot::Sender<(Request, ApiError)>>>,
}

/// Receiving side of a request completion.
pub struct PendingRequest {
    rx: oneshot::Receiver<(Request, ApiError)>,
}

impl RequestCompletion {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Arc<RequestCompletion>, PendingRequest) {
        let (tx, rx) = oneshot::channel();
        let listener = Arc::new(RequestCompletion {
            tx: Mutex::new(Some(tx)),
        });
        (listener, PendingRequest { rx })
    }
}

impl RequestListener for RequestCompletion {
    fn on_request_finish(&self, _api: &MegaApi, request: &Request, error: &ApiError) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send((request.clone(), *error));
        }
    }
}

impl PendingRequest {
    /// The finished request, or its error.
    pub async fn wait(self) -> Result<Request> {
        let (request, error) = self.rx.await.map_err(|_| MegaError::Stopped)?;
        settle(request, error)
    }

    /// Blocking variant of [`wait`](Self::wait) for threads outside a
    /// runtime.
    pub fn blocking_wait(self) -> Result<Request> {
        let (request, error) = self.rx.blocking_recv().map_err(|_| MegaError::Stopped)?;
        settle(request, error)
    }
}

/// Listener side of a transfer completion.
pub struct TransferCompletion {
    tx: Mutex<Option<oneshot::Sender<(Transfer, ApiError)>>>,
}

/// Receiving side of a transfer completion.
pub struct PendingTransfer {
    rx: oneshot::Receiver<(Transfer, ApiError)>,
}

impl TransferCompletion {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Arc<TransferCompletion>, PendingTransfer) {
        let (tx, rx) = oneshot::channel();
        let listener = Arc::new(TransferCompletion {
            tx: Mutex::new(Some(tx)),
        });
        (listener, PendingTransfer { rx })
    }
}

impl TransferListener for TransferCompletion {
    fn on_transfer_finish(&self, _api: &MegaApi, transfer: &Transfer, error: &ApiError) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send((transfer.clone(), *error));
        }
    }
}

impl PendingTransfer {
    pub async fn wait(self) -> Result<Transfer> {
        let (transfer, error) = self.rx.await.map_err(|_| MegaError::Stopped)?;
        settle(transfer, error)
    }

    pub fn blocking_wait(self) -> Result<Transfer> {
        let (transfer, error) = self.rx.blocking_recv().map_err(|_| MegaError::Stopped)?;
        settle(transfer, error)
    }
}

fn settle<T>(value: T, error: ApiError) -> Result<T> {
    if error.is_ok() {
        Ok(value)
    } else {
        Err(MegaError::Api(error))
    }
}
