//! Local path conversion and temporary names.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Local filesystem conversions needed by the dispatch loop.
pub trait FileSystemAccess: Send {
    /// Convert a caller path to the engine's local encoding.
    fn path_to_local(&self, path: &str) -> String;
    /// Convert a local-encoding path back to a caller path.
    fn local_to_path(&self, local: &str) -> String;
    /// Fresh file name (no directory) for a download in progress.
    fn tmp_name_local(&self) -> String;
    fn local_separator(&self) -> char;
}

/// UTF-8 paths passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystemAccess for LocalFileSystem {
    fn path_to_local(&self, path: &str) -> String {
        path.to_string()
    }

    fn local_to_path(&self, local: &str) -> String {
        local.to_string()
    }

    fn tmp_name_local(&self) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(char::from)
            .collect();
        format!(".getxfer.{}.{}.mega", std::process::id(), suffix)
    }

    fn local_separator(&self) -> char {
        std::path::MAIN_SEPARATOR
    }
}

/// Join `name` onto `base`, inserting a separator when needed.
pub(crate) fn join_local(base: &str, name: &str, separator: char) -> String {
    if base.is_empty() || base.ends_with(['/', '\\']) {
        format!("{}{}", base, name)
    } else {
        format!("{}{}{}", base, separator, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmp_names_are_unique() {
        let fs = LocalFileSystem;
        let a = fs.tmp_name_local();
        let b = fs.tmp_name_local();
        assert_ne!(a, b);
        assert!(a.starts_with(".getxfer."));
        assert!(a.ends_with(".mega"));
        assert!(!a.contains('/'));
    }

    #[test]
    fn test_passthrough() {
        let fs = LocalFileSystem;
        assert_eq!(fs.path_to_local("/x/ü.txt"), "/x/ü.txt");
        assert_eq!(fs.local_to_path("/x/ü.txt"), "/x/ü.txt");
    }

    #[test]
    fn test_join_local() {
        assert_eq!(join_local("/tmp", "f", '/'), "/tmp/f");
        assert_eq!(join_local("/tmp/", "f", '/'), "/tmp/f");
        assert_eq!(join_local("", "f", '/'), "f");
    }
}
