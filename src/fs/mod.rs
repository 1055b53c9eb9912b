//! Node snapshots, tree queries and local filesystem helpers.

pub mod local;
pub(crate) mod node;
pub mod tree;

pub use local::{FileSystemAccess, LocalFileSystem};
pub use node::{
    AccessLevel, AccountDetails, DetailParts, Handle, InShare, Node, NodeType, StorageUsage, User,
    Visibility,
};
pub use tree::NodeOrder;
