//! Path resolution, ordering and search over the engine's node tree.

use std::cmp::Ordering;

use crate::engine::NodeTree;
use crate::fs::node::{AccessLevel, Handle, Node, NodeType};

/// Sort order for child listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeOrder {
    /// Engine order.
    #[default]
    None,
    /// Folders first, then case-insensitive name.
    DefaultAsc,
    /// Files first, then case-insensitive name descending.
    DefaultDesc,
    SizeAsc,
    SizeDesc,
    CreationAsc,
    CreationDesc,
    ModificationAsc,
    ModificationDesc,
    AlphabeticalAsc,
    AlphabeticalDesc,
}

fn cmp_names(a: &Node, b: &Node) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

/// Sort `nodes` in place. Ties keep engine order.
pub fn sort_nodes(nodes: &mut [Node], order: NodeOrder) {
    match order {
        NodeOrder::None => {}
        NodeOrder::DefaultAsc => nodes.sort_by(|a, b| {
            (b.node_type as u8)
                .cmp(&(a.node_type as u8))
                .then_with(|| cmp_names(a, b))
        }),
        NodeOrder::DefaultDesc => nodes.sort_by(|a, b| {
            (a.node_type as u8)
                .cmp(&(b.node_type as u8))
                .then_with(|| cmp_names(b, a))
        }),
        NodeOrder::SizeAsc => nodes.sort_by_key(|n| n.size),
        NodeOrder::SizeDesc => nodes.sort_by(|a, b| b.size.cmp(&a.size)),
        NodeOrder::CreationAsc => nodes.sort_by_key(|n| n.ctime),
        NodeOrder::CreationDesc => nodes.sort_by(|a, b| b.ctime.cmp(&a.ctime)),
        NodeOrder::ModificationAsc => nodes.sort_by_key(|n| n.mtime),
        NodeOrder::ModificationDesc => nodes.sort_by(|a, b| b.mtime.cmp(&a.mtime)),
        NodeOrder::AlphabeticalAsc => nodes.sort_by(cmp_names),
        NodeOrder::AlphabeticalDesc => nodes.sort_by(|a, b| cmp_names(b, a)),
    }
}

/// Children of `parent` in the requested order.
pub fn children<T: NodeTree + ?Sized>(tree: &T, parent: Handle, order: NodeOrder) -> Vec<Node> {
    let mut nodes = tree.children(parent);
    sort_nodes(&mut nodes, order);
    nodes
}

/// First child of `parent` named exactly `name`.
pub fn child_node<T: NodeTree + ?Sized>(tree: &T, parent: Handle, name: &str) -> Option<Node> {
    tree.children(parent).into_iter().find(|n| n.name == name)
}

/// Absolute path of a node.
///
/// Cloud drive paths start with `/`; the inbox, rubbish bin and mail roots
/// are `//in`, `//bin` and `//mail`. Nodes inside an inbound share are
/// prefixed with the sharer's email, as in `owner@example.com:Share/file`.
pub fn node_path<T: NodeTree + ?Sized>(tree: &T, handle: Handle) -> Option<String> {
    let mut node = tree.node(handle)?;
    if tree.root_nodes().root == Some(node.handle) {
        return Some("/".to_string());
    }

    let mut path = String::new();
    loop {
        match node.node_type {
            NodeType::Folder => {
                path.insert_str(0, &node.name);
                if let Some(share) = &node.inshare {
                    path.insert(0, ':');
                    path.insert_str(0, share.owner.as_deref().unwrap_or("UNKNOWN"));
                    return Some(path);
                }
            }
            NodeType::Inbox => {
                path.insert_str(0, "//in");
                return Some(path);
            }
            NodeType::Root => return Some(path),
            NodeType::Rubbish => {
                path.insert_str(0, "//bin");
                return Some(path);
            }
            NodeType::Mail => {
                path.insert_str(0, "//mail");
                return Some(path);
            }
            NodeType::File => path.insert_str(0, &node.name),
        }

        path.insert(0, '/');

        match node.parent_handle.and_then(|h| tree.node(h)) {
            Some(parent) => node = parent,
            None => return Some(path),
        }
    }
}

/// Split a path on `/` and `:`; a backslash escapes the next character.
///
/// Returns the components and whether a `:` (remote user path) was seen.
/// A `:` anywhere but after the first component makes the path invalid.
fn split_path(path: &str) -> Option<(Vec<String>, bool)> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut remote = false;
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => break,
            },
            '/' | ':' => {
                if c == ':' {
                    if !components.is_empty() {
                        return None;
                    }
                    remote = true;
                }
                components.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    components.push(current);
    Some((components, remote))
}

/// Resolve a path relative to `cwd`.
///
/// Absolute paths start at the cloud drive root (`/`), the inbox (`//in`),
/// rubbish bin (`//bin`) or mail root (`//mail`). `user@host:Share/sub`
/// resolves inside the inbound share named `Share` from that contact.
/// `.` and `..` are honored; `..` at a root stays there.
pub fn node_by_path<T: NodeTree + ?Sized>(
    tree: &T,
    path: &str,
    cwd: Option<Handle>,
) -> Option<Node> {
    let (c, remote) = split_path(path)?;
    let roots = tree.root_nodes();

    let (mut node, mut index) = if remote {
        // `user:` alone names the contact, not a node
        if c.len() == 2 && c[1].is_empty() {
            return None;
        }
        let user = tree.users().into_iter().find(|u| u.email == c[0])?;
        let share = user
            .sharing
            .iter()
            .filter_map(|h| tree.node(*h))
            .find(|n| c.len() < 2 || n.name == c[1])?;
        (share, 2)
    } else if c.len() > 1 && c[0].is_empty() {
        if c.len() > 2 && c[1].is_empty() {
            let root = match c[2].as_str() {
                "in" => roots.inbox,
                "bin" => roots.rubbish,
                "mail" => roots.mail,
                _ => return None,
            };
            (tree.node(root?)?, 3)
        } else {
            (tree.node(roots.root?)?, 1)
        }
    } else {
        (tree.node(cwd?)?, 0)
    };

    while index < c.len() {
        let component = c[index].as_str();
        match component {
            "." | "" => {}
            ".." => {
                if let Some(parent) = node.parent_handle.and_then(|h| tree.node(h)) {
                    node = parent;
                }
            }
            name => node = child_node(tree, node.handle, name)?,
        }
        index += 1;
    }
    Some(node)
}

/// Nodes under `root` whose name contains `needle`, case-insensitively.
///
/// Children are visited before their parent; `root` itself is a
/// candidate. Without `recursive` only direct children are examined.
pub fn search<T: NodeTree + ?Sized>(
    tree: &T,
    root: Handle,
    needle: &str,
    recursive: bool,
) -> Vec<Node> {
    let needle = needle.to_lowercase();
    let mut results = Vec::new();
    if let Some(node) = tree.node(root) {
        collect_matches(tree, node, &needle, recursive, &mut results);
    }
    results
}

fn collect_matches<T: NodeTree + ?Sized>(
    tree: &T,
    node: Node,
    needle: &str,
    recursive: bool,
    results: &mut Vec<Node>,
) {
    if !node.is_file() {
        for child in tree.children(node.handle) {
            if recursive {
                collect_matches(tree, child, needle, true, results);
            } else if child.name.to_lowercase().contains(needle) {
                results.push(child);
            }
        }
    }
    if node.name.to_lowercase().contains(needle) {
        results.push(node);
    }
}

/// Effective access level of the logged-in account on a node.
pub fn access_of<T: NodeTree + ?Sized>(tree: &T, handle: Handle) -> Option<AccessLevel> {
    let node = tree.node(handle)?;
    if !tree.logged_in() {
        return Some(AccessLevel::ReadOnly);
    }
    if node.node_type.is_root() {
        return Some(AccessLevel::Owner);
    }

    let mut current = Some(node);
    while let Some(n) = current {
        if let Some(share) = &n.inshare {
            return Some(share.access);
        }
        current = n.parent_handle.and_then(|h| tree.node(h));
    }
    Some(AccessLevel::Full)
}

/// Parse an access level as accepted by [`access_of`] comparisons.
///
/// Unlike share requests this accepts `"owner"`; anything unknown asks
/// for ownership.
pub fn parse_check_level(level: &str) -> AccessLevel {
    match level {
        "owner" => AccessLevel::Owner,
        other => AccessLevel::from_share_str(other).unwrap_or(AccessLevel::Owner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeTree;
    use crate::fs::node::InShare;

    const ROOT: Handle = 1;
    const INBOX: Handle = 2;
    const BIN: Handle = 3;
    const DOCS: Handle = 10;
    const REPORT: Handle = 11;
    const NOTES: Handle = 12;
    const PHOTOS: Handle = 13;
    const TRASHED: Handle = 20;
    const SHARE: Handle = 30;
    const SHARED_FILE: Handle = 31;

    fn sample() -> FakeTree {
        let mut tree = FakeTree::with_roots(ROOT, INBOX, BIN);
        tree.add_folder(DOCS, ROOT, "Docs");
        tree.add_file(REPORT, DOCS, "Report.pdf", 300);
        tree.add_file(NOTES, DOCS, "notes.txt", 100);
        tree.add_folder(PHOTOS, DOCS, "photos");
        tree.add_file(TRASHED, BIN, "old report.doc", 5);
        tree.add_folder(SHARE, 999, "Team");
        tree.set_inshare(
            SHARE,
            InShare {
                owner: Some("bob@example.com".into()),
                access: AccessLevel::ReadWrite,
            },
        );
        tree.add_file(SHARED_FILE, SHARE, "plan.txt", 1);
        tree.add_user(77, "bob@example.com", vec![SHARE]);
        tree
    }

    #[test]
    fn test_node_paths() {
        let tree = sample();
        assert_eq!(node_path(&tree, ROOT).as_deref(), Some("/"));
        assert_eq!(node_path(&tree, DOCS).as_deref(), Some("/Docs"));
        assert_eq!(node_path(&tree, REPORT).as_deref(), Some("/Docs/Report.pdf"));
        assert_eq!(node_path(&tree, TRASHED).as_deref(), Some("//bin/old report.doc"));
        assert_eq!(node_path(&tree, INBOX).as_deref(), Some("//in"));
        assert_eq!(
            node_path(&tree, SHARED_FILE).as_deref(),
            Some("bob@example.com:Team/plan.txt")
        );
        assert_eq!(node_path(&tree, 4242), None);
    }

    #[test]
    fn test_node_by_path() {
        let tree = sample();
        let by = |p: &str, cwd: Option<Handle>| node_by_path(&tree, p, cwd).map(|n| n.handle);

        assert_eq!(by("/", None), Some(ROOT));
        assert_eq!(by("/Docs/Report.pdf", None), Some(REPORT));
        assert_eq!(by("/Docs/./photos/..", None), Some(DOCS));
        assert_eq!(by("/..", None), Some(ROOT));
        assert_eq!(by("//bin/old report.doc", None), Some(TRASHED));
        assert_eq!(by("//in", None), Some(INBOX));
        assert_eq!(by("//nowhere", None), None);
        assert_eq!(by("notes.txt", Some(DOCS)), Some(NOTES));
        assert_eq!(by("notes.txt", None), None);
        assert_eq!(by("/Docs/missing", None), None);
        assert_eq!(by("bob@example.com:Team/plan.txt", None), Some(SHARED_FILE));
        assert_eq!(by("bob@example.com:", None), None);
        assert_eq!(by("/Docs/a:b", None), None);
    }

    #[test]
    fn test_escaped_separator() {
        let mut tree = sample();
        tree.add_file(40, DOCS, "a/b", 1);
        assert_eq!(node_by_path(&tree, "/Docs/a\\/b", None).map(|n| n.handle), Some(40));
    }

    #[test]
    fn test_children_ordering() {
        let tree = sample();
        let names = |order| -> Vec<String> {
            children(&tree, DOCS, order).into_iter().map(|n| n.name).collect()
        };

        assert_eq!(names(NodeOrder::None), ["Report.pdf", "notes.txt", "photos"]);
        assert_eq!(names(NodeOrder::DefaultAsc), ["photos", "notes.txt", "Report.pdf"]);
        assert_eq!(names(NodeOrder::DefaultDesc), ["Report.pdf", "notes.txt", "photos"]);
        assert_eq!(names(NodeOrder::SizeAsc), ["photos", "notes.txt", "Report.pdf"]);
        assert_eq!(names(NodeOrder::SizeDesc), ["Report.pdf", "notes.txt", "photos"]);
        assert_eq!(
            names(NodeOrder::AlphabeticalDesc),
            ["Report.pdf", "photos", "notes.txt"]
        );
    }

    #[test]
    fn test_search() {
        let tree = sample();
        let found = |root, needle, recursive| -> Vec<Handle> {
            search(&tree, root, needle, recursive).into_iter().map(|n| n.handle).collect()
        };

        assert_eq!(found(ROOT, "REPORT", true), vec![REPORT]);
        assert_eq!(found(ROOT, "report", false), Vec::<Handle>::new());
        assert_eq!(found(DOCS, "o", false), vec![REPORT, NOTES, PHOTOS, DOCS]);
        assert_eq!(found(BIN, "report", true), vec![TRASHED]);
    }

    #[test]
    fn test_access_levels() {
        let mut tree = sample();
        assert_eq!(access_of(&tree, ROOT), Some(AccessLevel::Owner));
        assert_eq!(access_of(&tree, REPORT), Some(AccessLevel::Full));
        assert_eq!(access_of(&tree, SHARED_FILE), Some(AccessLevel::ReadWrite));
        assert_eq!(access_of(&tree, 4242), None);

        tree.logged_in = false;
        assert_eq!(access_of(&tree, REPORT), Some(AccessLevel::ReadOnly));
    }

    #[test]
    fn test_check_level_parsing() {
        assert_eq!(parse_check_level("ro"), AccessLevel::ReadOnly);
        assert_eq!(parse_check_level("owner"), AccessLevel::Owner);
        assert_eq!(parse_check_level("bogus"), AccessLevel::Owner);
    }
}
