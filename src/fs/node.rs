//! Snapshots of engine-owned tree entries, users and account details.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Engine node handle. Six significant bytes on the wire.
pub type Handle = u64;

/// Node type enumeration matching MEGA's internal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    /// Regular file
    File = 0,
    /// Folder/directory
    Folder = 1,
    /// Root folder (Cloud Drive)
    Root = 2,
    /// Inbox folder
    Inbox = 3,
    /// Rubbish bin
    Rubbish = 4,
    /// Mail root
    Mail = 5,
}

impl NodeType {
    /// Create from integer type value.
    pub fn from_i64(t: i64) -> Option<Self> {
        match t {
            0 => Some(NodeType::File),
            1 => Some(NodeType::Folder),
            2 => Some(NodeType::Root),
            3 => Some(NodeType::Inbox),
            4 => Some(NodeType::Rubbish),
            5 => Some(NodeType::Mail),
            _ => None,
        }
    }

    /// Check if this node type is a container (can have children).
    pub fn is_container(&self) -> bool {
        !matches!(self, NodeType::File)
    }

    /// True for the account-level roots (cloud drive, inbox, rubbish, mail).
    pub fn is_root(&self) -> bool {
        matches!(
            self,
            NodeType::Root | NodeType::Inbox | NodeType::Rubbish | NodeType::Mail
        )
    }
}

/// Access level on a node, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    ReadOnly,
    ReadWrite,
    Full,
    Owner,
}

impl AccessLevel {
    /// Parse an access level as accepted by share requests.
    ///
    /// `"r"`/`"ro"`, `"rw"` and `"full"` are recognized; ownership cannot be
    /// granted so `"own"` is rejected.
    pub fn from_share_str(s: &str) -> Option<Self> {
        match s {
            "r" | "ro" => Some(AccessLevel::ReadOnly),
            "rw" => Some(AccessLevel::ReadWrite),
            "full" => Some(AccessLevel::Full),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::ReadOnly => "r",
            AccessLevel::ReadWrite => "rw",
            AccessLevel::Full => "full",
            AccessLevel::Owner => "own",
        }
    }
}

/// Inbound share attached to the top folder of a share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InShare {
    /// Email of the sharing user, if the engine knows it.
    pub owner: Option<String>,
    pub access: AccessLevel,
}

/// Owned copy of one node of the engine's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Node handle (unique identifier)
    pub handle: Handle,
    /// Parent node handle
    pub parent_handle: Option<Handle>,
    /// Node type
    pub node_type: NodeType,
    /// Node name (decrypted)
    pub name: String,
    /// File size in bytes (0 for folders)
    pub size: u64,
    /// Creation time (Unix epoch)
    pub ctime: i64,
    /// Modification time (Unix epoch)
    pub mtime: i64,
    /// Set on the top folder of an inbound share.
    pub inshare: Option<InShare>,
}

impl Node {
    /// Check if this node is a file.
    pub fn is_file(&self) -> bool {
        self.node_type == NodeType::File
    }

    /// Check if this node is a folder (any container type).
    pub fn is_folder(&self) -> bool {
        self.node_type.is_container()
    }

    /// Check if this node is the top of an inbound share.
    pub fn is_inshare(&self) -> bool {
        self.inshare.is_some()
    }
}

/// Contact visibility as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Unknown,
    Hidden,
    Visible,
    Me,
}

/// Owned copy of a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub handle: Handle,
    pub email: String,
    pub visibility: Visibility,
    /// Nodes this user shares with us.
    pub sharing: Vec<Handle>,
}

/// Storage consumed under one account root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUsage {
    pub bytes: u64,
    pub files: u64,
    pub folders: u64,
}

/// Account quota and history snapshot.
///
/// Built up incrementally while the engine reports the requested parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub pro_level: i32,
    pub storage_used: u64,
    pub storage_max: u64,
    pub transfer_used: u64,
    pub transfer_max: u64,
    pub storage: HashMap<Handle, StorageUsage>,
    pub num_sessions: usize,
    pub num_transactions: usize,
    pub num_purchases: usize,
}

impl AccountDetails {
    /// Get free storage in bytes.
    pub fn storage_free(&self) -> u64 {
        self.storage_max.saturating_sub(self.storage_used)
    }

    /// Get storage usage percentage.
    pub fn usage_percent(&self) -> f64 {
        if self.storage_max == 0 {
            0.0
        } else {
            (self.storage_used as f64 / self.storage_max as f64) * 100.0
        }
    }

    /// Storage consumed under `root`, zero when the engine did not report it.
    pub fn storage_of(&self, root: Handle) -> StorageUsage {
        self.storage.get(&root).copied().unwrap_or_default()
    }
}

/// Which parts of the account details to fetch.
///
/// Each flag maps to one bit of the request mask: storage `0x01`,
/// transfer `0x02`, pro `0x04`, transactions `0x08`, purchases `0x10`,
/// sessions `0x20`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailParts {
    pub storage: bool,
    pub transfer: bool,
    pub pro: bool,
    pub transactions: bool,
    pub purchases: bool,
    pub sessions: bool,
}

impl DetailParts {
    pub const STORAGE: u32 = 0x01;
    pub const TRANSFER: u32 = 0x02;
    pub const PRO: u32 = 0x04;
    pub const TRANSACTIONS: u32 = 0x08;
    pub const PURCHASES: u32 = 0x10;
    pub const SESSIONS: u32 = 0x20;

    pub fn from_mask(mask: u32) -> Self {
        Self {
            storage: mask & Self::STORAGE != 0,
            transfer: mask & Self::TRANSFER != 0,
            pro: mask & Self::PRO != 0,
            transactions: mask & Self::TRANSACTIONS != 0,
            purchases: mask & Self::PURCHASES != 0,
            sessions: mask & Self::SESSIONS != 0,
        }
    }

    /// Number of result callbacks the engine will deliver.
    ///
    /// Storage, transfer and pro come back together in one reply; the
    /// history parts each arrive separately.
    pub fn expected_replies(&self) -> u32 {
        1 + u32::from(self.transactions) + u32::from(self.purchases) + u32::from(self.sessions)
    }
}
