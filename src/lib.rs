//! # megafacade
//!
//! Thread-safe, listener-driven facade over a MEGA client engine.
//!
//! ## Features
//!
//! - **Queued operations**: login, account registration, folder and file
//!   management, sharing, public links and file attributes. Calls return at
//!   once and report their outcome to listeners.
//! - **Transfers**: uploads with thumbnails, downloads to a folder or an
//!   exact path, byte ranges, public link downloads, cancellation and
//!   pause/resume.
//! - **Listeners**: request, transfer, global and all-events registries, plus
//!   a per-call listener. Every operation gets exactly one finish.
//! - **Tree reads**: paths, children with ordering, search, access checks
//!   and contacts, read synchronously from any thread.
//! - **Async bridge**: [`RequestCompletion`] and [`TransferCompletion`] turn
//!   a finish into a future.
//!
//! The engine itself (session, crypto, network, sync) is supplied by the
//! caller through the [`Engine`] trait. A dedicated dispatch thread drives
//! it and delivers every listener callback.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use megafacade::{ApiError, Config, Engine, MegaApi, MegaListener, Request};
//! use megafacade::{GlobalListener, RequestListener, TransferListener};
//!
//! struct Printer;
//!
//! impl RequestListener for Printer {
//!     fn on_request_finish(&self, _api: &MegaApi, request: &Request, error: &ApiError) {
//!         println!("{} finished: {}", request.request_type(), error);
//!     }
//! }
//! impl TransferListener for Printer {}
//! impl GlobalListener for Printer {}
//! impl MegaListener for Printer {}
//!
//! # fn example(engine: impl Engine + 'static) -> megafacade::Result<()> {
//! let api = MegaApi::new(engine, Config::default())?;
//! api.add_listener(Arc::new(Printer));
//! api.login("user@example.com", "password", None);
//! api.fetch_nodes(None);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod base64;
pub mod completion;
pub mod config;
mod dispatch;
pub mod engine;
pub mod error;
pub mod fs;
pub mod listener;
pub mod preview;
pub mod public;
pub mod queue;
pub mod request;
pub mod transfer;

// Re-export commonly used types
pub use api::{ApiError, Collaborators, ErrorCode, MegaApi, UploadOptions};
pub use completion::{PendingRequest, PendingTransfer, RequestCompletion, TransferCompletion};
pub use config::Config;
pub use dispatch::TransferCounters;
pub use engine::{Engine, EngineEvent, NodeTree, PathState, Tag, TransferId, Waiter};
pub use error::{MegaError, Result};
pub use fs::{AccessLevel, AccountDetails, Handle, Node, NodeOrder, NodeType, User};
pub use listener::{GlobalListener, ListenerId, MegaListener, RequestListener, TransferListener};
pub use public::{PublicNode, parse_mega_link};
pub use request::{Request, RequestType};
pub use transfer::{Transfer, TransferType};
