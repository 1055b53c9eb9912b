use crate::api::error::ErrorCode;
use crate::engine::{Ds, Tag, TransferId};
use crate::fs::{AccountDetails, Handle, Node, NodeType, User};
use crate::transfer::TransferType;

/// Result of a successful export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedLink {
    pub node: Handle,
    pub public_handle: Handle,
    pub node_type: NodeType,
    /// Node key, absent when the engine lacks it.
    pub key: Option<Vec<u8>>,
}

/// Metadata served for an opened public file link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedLink {
    pub public_handle: Handle,
    pub key: Option<Vec<u8>>,
    pub size: u64,
    pub attr_string: Vec<u8>,
    /// Decrypted name; `None` when decryption failed.
    pub name: Option<String>,
    pub ctime: i64,
    pub mtime: i64,
}

/// Contents of a signup confirmation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupLink {
    pub email: String,
    pub name: String,
    /// Opaque confirmation payload.
    pub code: Vec<u8>,
}

/// Proof that an upload's data reached storage; committing it creates the
/// node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadToken {
    pub upload_handle: Handle,
    pub token: Vec<u8>,
    pub file_key: Vec<u8>,
}

/// Outcome reported by one engine round.
///
/// Request results carry the tag the request was submitted under;
/// transfer events carry the engine's transfer id.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    LoginResult { tag: Tag, error: ErrorCode },
    FetchNodesResult { tag: Tag, error: ErrorCode },
    /// Attribute update, the result of a rename.
    NodeAttrUpdated { tag: Tag, node: Handle, error: ErrorCode },
    /// Parent change, the result of a move.
    NodeMoved { tag: Tag, node: Handle, error: ErrorCode },
    NodeUnlinked { tag: Tag, node: Handle, error: ErrorCode },
    /// New nodes committed (folder, copy, import or upload).
    PutNodesResult { tag: Tag, error: ErrorCode, node: Option<Handle> },
    ShareResult { tag: Tag, error: ErrorCode },
    ExportResult { tag: Tag, result: Result<ExportedLink, ErrorCode> },
    OpenFileLinkResult { tag: Tag, result: Result<OpenedLink, ErrorCode> },
    FileAttributeFetched { tag: Tag, node: Handle, data: Vec<u8> },
    FileAttributeFailed { tag: Tag, node: Handle, retries: u32 },
    FileAttributeStored { tag: Tag, error: ErrorCode },
    /// One part of an account details reply.
    AccountDetails { tag: Tag, details: AccountDetails },
    AccountDetailsFailed { tag: Tag, error: ErrorCode },
    ChangePasswordResult { tag: Tag, error: ErrorCode },
    InviteResult { tag: Tag, error: ErrorCode },
    EphemeralResult { tag: Tag, error: ErrorCode },
    SignupLinkSent { tag: Tag, error: ErrorCode },
    SignupLinkQueried { tag: Tag, result: Result<SignupLink, ErrorCode> },
    SignupConfirmed { tag: Tag, error: ErrorCode },
    /// Generic failure of the request filed under `tag`.
    RequestError { tag: Tag, error: ErrorCode },
    /// The engine backs off before retrying its pending connections.
    NotifyRetry { delay: Ds },

    TransferAdded { id: TransferId, tag: Option<Tag>, direction: TransferType, size: u64 },
    TransferPrepare { id: TransferId, local_path: String, size: u64, node: Option<Handle> },
    TransferUpdate { id: TransferId, progress: u64, last_data: Ds },
    TransferFailed { id: TransferId, error: ErrorCode, next_attempt: Option<Ds> },
    TransferLimit { id: TransferId },
    TransferRemoved { id: TransferId, direction: TransferType },
    TransferComplete {
        id: TransferId,
        direction: TransferType,
        size: u64,
        node: Option<Handle>,
        /// Set when the upload still needs its node committed.
        upload_token: Option<UploadToken>,
    },

    UsersUpdated(Vec<User>),
    /// `None` means the whole tree changed.
    NodesUpdated(Option<Vec<Node>>),
    ReloadNeeded { reason: String },
    SyncStateChanged,
    SyncScanning(bool),
}
