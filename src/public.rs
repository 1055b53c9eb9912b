//! Public links and the snapshots of the files they point at.

use serde::{Deserialize, Serialize};

use crate::base64::{base64url_encode, handle_to_base64};
use crate::fs::{Handle, NodeType};

/// Name used when a public link carries no key.
pub const NAME_NO_KEY: &str = "NO_KEY";
/// Name used when the attributes could not be decrypted.
pub const NAME_CRYPTO_ERROR: &str = "CRYPTO_ERROR";
/// Name used when the decrypted name is empty.
pub const NAME_BLANK: &str = "BLANK";

/// Snapshot of a file reachable through a public link.
///
/// Requests and transfers always hold their own copy; see
/// [`Request::set_public_node`](crate::request::Request::set_public_node).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicNode {
    name: String,
    node_type: NodeType,
    size: u64,
    ctime: i64,
    mtime: i64,
    handle: Handle,
    /// Encrypted attribute blob as served by the link.
    attr_string: Vec<u8>,
    node_key: Vec<u8>,
}

impl PublicNode {
    /// Build a file snapshot.
    ///
    /// `name` is the decrypted name; `None` means decryption failed.
    pub fn new_file(
        handle: Handle,
        node_key: Option<Vec<u8>>,
        name: Option<String>,
        size: u64,
        attr_string: Vec<u8>,
    ) -> Self {
        let name = match (&node_key, name) {
            (None, _) => NAME_NO_KEY.to_string(),
            (Some(_), None) => NAME_CRYPTO_ERROR.to_string(),
            (Some(_), Some(n)) if n.is_empty() => NAME_BLANK.to_string(),
            (Some(_), Some(n)) => n,
        };

        Self {
            name,
            node_type: NodeType::File,
            size,
            ctime: 0,
            mtime: 0,
            handle,
            attr_string,
            node_key: node_key.unwrap_or_default(),
        }
    }

    pub fn with_times(mut self, ctime: i64, mtime: i64) -> Self {
        self.ctime = ctime;
        self.mtime = mtime;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn creation_time(&self) -> i64 {
        self.ctime
    }

    pub fn modification_time(&self) -> i64 {
        self.mtime
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn attr_string(&self) -> &[u8] {
        &self.attr_string
    }

    pub fn node_key(&self) -> &[u8] {
        &self.node_key
    }

    pub fn base64_handle(&self) -> String {
        handle_to_base64(self.handle)
    }

    pub fn base64_key(&self) -> String {
        base64url_encode(&self.node_key)
    }
}

/// What a MEGA link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    File,
    Folder,
}

/// Handle and key extracted from a MEGA link, both still base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParts {
    pub kind: LinkKind,
    pub handle: String,
    pub key: String,
}

/// Parse a MEGA public link.
///
/// Supports formats:
/// - `https://mega.nz/file/HANDLE#KEY`
/// - `https://mega.nz/folder/HANDLE#KEY`
/// - `https://mega.nz/#!HANDLE!KEY` (legacy file)
/// - `https://mega.nz/#F!HANDLE!KEY` (legacy folder)
///
/// Returns `None` when the link has no recognizable handle/key pair.
pub fn parse_mega_link(url: &str) -> Option<LinkParts> {
    let split = |rest: &str, sep: char, kind: LinkKind| {
        let (handle, key) = rest.split_once(sep)?;
        if handle.is_empty() || key.is_empty() {
            return None;
        }
        Some(LinkParts {
            kind,
            handle: handle.to_string(),
            key: key.to_string(),
        })
    };

    if let Some(pos) = url.find("/file/") {
        return split(&url[pos + 6..], '#', LinkKind::File);
    }
    if let Some(pos) = url.find("/folder/") {
        return split(&url[pos + 8..], '#', LinkKind::Folder);
    }
    if let Some(pos) = url.find("#F!") {
        return split(&url[pos + 3..], '!', LinkKind::Folder);
    }
    if let Some(pos) = url.find("#!") {
        return split(&url[pos + 2..], '!', LinkKind::File);
    }
    None
}

/// Parse a link that must point at a file.
pub fn parse_file_link(url: &str) -> Option<LinkParts> {
    parse_mega_link(url).filter(|p| p.kind == LinkKind::File)
}

/// Parse a link that must point at a folder.
///
/// Folder handles are always eight characters.
pub fn parse_folder_link(url: &str) -> Option<LinkParts> {
    parse_mega_link(url).filter(|p| p.kind == LinkKind::Folder && p.handle.len() == 8)
}

/// Format a public link.
pub fn build_link(kind: LinkKind, public_handle: Handle, key: &[u8]) -> String {
    let path = match kind {
        LinkKind::File => "file",
        LinkKind::Folder => "folder",
    };
    format!(
        "https://mega.nz/{}/{}#{}",
        path,
        handle_to_base64(public_handle),
        base64url_encode(key)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mega_link_new_format() {
        let parts = parse_mega_link("https://mega.nz/file/ABC123#key456").unwrap();
        assert_eq!(parts.kind, LinkKind::File);
        assert_eq!(parts.handle, "ABC123");
        assert_eq!(parts.key, "key456");
    }

    #[test]
    fn test_parse_mega_link_legacy_format() {
        let parts = parse_mega_link("https://mega.nz/#!ABC123!key456").unwrap();
        assert_eq!(parts.kind, LinkKind::File);
        assert_eq!(parts.handle, "ABC123");
        assert_eq!(parts.key, "key456");
    }

    #[test]
    fn test_parse_mega_link_invalid() {
        assert!(parse_mega_link("https://example.com/file").is_none());
        assert!(parse_mega_link("https://mega.nz/file/ABC123").is_none());
        assert!(parse_mega_link("https://mega.nz/#!!key").is_none());
    }

    #[test]
    fn test_parse_folder_links() {
        let parts = parse_folder_link("https://mega.nz/folder/XYZ78901#folderkey").unwrap();
        assert_eq!(parts.handle, "XYZ78901");
        assert_eq!(parts.key, "folderkey");

        let legacy = parse_folder_link("https://mega.nz/#F!XYZ78901!folderkey").unwrap();
        assert_eq!(legacy.kind, LinkKind::Folder);

        assert!(parse_folder_link("https://mega.nz/#F!short!key").is_none());
        assert!(parse_folder_link("https://mega.nz/file/XYZ78901#key").is_none());
        assert!(parse_file_link("https://mega.nz/folder/XYZ78901#key").is_none());
    }

    #[test]
    fn test_build_link() {
        let link = build_link(LinkKind::File, 0x0102_0304_0506, &[1, 2, 3]);
        assert!(link.starts_with("https://mega.nz/file/"));
        let parts = parse_file_link(&link).unwrap();
        assert_eq!(parts.handle, handle_to_base64(0x0102_0304_0506));
        assert_eq!(parts.key, "AQID");

        let folder = build_link(LinkKind::Folder, 7, &[9]);
        assert!(folder.starts_with("https://mega.nz/folder/"));
        assert!(parse_folder_link(&folder).is_some());
    }

    #[test]
    fn test_public_node_names() {
        let no_key = PublicNode::new_file(1, None, Some("a.txt".into()), 5, vec![]);
        assert_eq!(no_key.name(), NAME_NO_KEY);
        assert!(no_key.node_key().is_empty());

        let crypto = PublicNode::new_file(1, Some(vec![1; 32]), None, 5, vec![]);
        assert_eq!(crypto.name(), NAME_CRYPTO_ERROR);

        let blank = PublicNode::new_file(1, Some(vec![1; 32]), Some(String::new()), 5, vec![]);
        assert_eq!(blank.name(), NAME_BLANK);

        let named = PublicNode::new_file(1, Some(vec![1; 32]), Some("doc.pdf".into()), 5, vec![])
            .with_times(10, 20);
        assert_eq!(named.name(), "doc.pdf");
        assert_eq!(named.node_type(), NodeType::File);
        assert_eq!(named.modification_time(), 20);
    }
}
