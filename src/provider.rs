//! Repository content provider
//!
//! The orchestrator reads files through an injected [`FileProvider`]
//! capability instead of touching the filesystem directly. This gives a
//! single point of control for enumeration and I/O, and makes the engine
//! testable against in-memory repositories.

use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::EngineConfig;

/// How many leading bytes are inspected for a NUL when sniffing binaries.
const BINARY_SNIFF_LEN: usize = 8192;

/// Supplies the file list and file contents for one repository.
///
/// Paths exchanged through this trait are relative to the repository
/// root; that is the form reports use. Implementations must be
/// `Send + Sync` so analyses can run concurrently.
pub trait FileProvider: Send + Sync {
    /// Enumerate candidate files, relative to the root, in a
    /// deterministic (lexicographic) order. Failure here is the one
    /// run-level error: no file list, no report.
    fn files(&self) -> io::Result<Vec<PathBuf>>;

    /// Size in bytes, or `None` if the file cannot be inspected.
    fn file_size(&self, path: &Path) -> Option<u64>;

    /// Read a file as text. `None` means unreadable: missing, binary
    /// content, or invalid encoding. A recoverable, per-file condition.
    fn content(&self, path: &Path) -> Option<String>;

    /// Absolute on-disk path, if the file physically exists. External
    /// tools need a real path; providers without one (in-memory mocks)
    /// return `None` and tools are skipped.
    fn absolute(&self, _path: &Path) -> Option<PathBuf> {
        None
    }

    /// Identifier for the repository (used as `repository_ref`).
    fn repository_ref(&self) -> String;
}

/// Filesystem-backed provider using a gitignore-aware walk.
pub struct SourceTree {
    root: PathBuf,
    ignore_dirs: Vec<String>,
}

impl SourceTree {
    pub fn new(root: impl Into<PathBuf>, config: &EngineConfig) -> Self {
        Self {
            root: root.into(),
            ignore_dirs: config.ignore_dirs.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProvider for SourceTree {
    fn files(&self) -> io::Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            ));
        }

        let ignored = self.ignore_dirs.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .filter_entry(move |entry| {
                let name = entry.file_name().to_string_lossy();
                !(entry.file_type().is_some_and(|t| t.is_dir())
                    && ignored.iter().any(|d| *d == name))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("walk error under {}: {e}", self.root.display());
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                files.push(rel.to_path_buf());
            }
        }

        // Deterministic dispatch and merge order.
        files.sort();
        Ok(files)
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(self.root.join(path)).ok().map(|m| m.len())
    }

    fn content(&self, path: &Path) -> Option<String> {
        let bytes = std::fs::read(self.root.join(path)).ok()?;
        if bytes
            .iter()
            .take(BINARY_SNIFF_LEN)
            .any(|b| *b == 0)
        {
            return None;
        }
        String::from_utf8(bytes).ok()
    }

    fn absolute(&self, path: &Path) -> Option<PathBuf> {
        let abs = self.root.join(path);
        abs.is_file().then_some(abs)
    }

    fn repository_ref(&self) -> String {
        self.root.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Test-only mock
// ---------------------------------------------------------------------------

#[cfg(test)]
pub struct MockFileProvider {
    entries: Vec<(PathBuf, Vec<u8>)>,
}

#[cfg(test)]
impl MockFileProvider {
    /// Build a mock from `(relative_path, content)` pairs.
    pub fn new(entries: Vec<(&str, &[u8])>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(p, c)| (PathBuf::from(p), c.to_vec()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl FileProvider for MockFileProvider {
    fn files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self.entries.iter().map(|(p, _)| p.clone()).collect();
        files.sort();
        Ok(files)
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        self.entries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, c)| c.len() as u64)
    }

    fn content(&self, path: &Path) -> Option<String> {
        let (_, bytes) = self.entries.iter().find(|(p, _)| p == path)?;
        if bytes.iter().take(BINARY_SNIFF_LEN).any(|b| *b == 0) {
            return None;
        }
        String::from_utf8(bytes.clone()).ok()
    }

    fn repository_ref(&self) -> String {
        "mock://repo".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_source_tree_enumerates_sorted_relative_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("src")).expect("mkdir");
        fs::write(dir.path().join("src/b.py"), "pass\n").expect("write");
        fs::write(dir.path().join("a.py"), "pass\n").expect("write");

        let tree = SourceTree::new(dir.path(), &EngineConfig::default());
        let files = tree.files().expect("enumeration");
        assert_eq!(
            files,
            vec![PathBuf::from("a.py"), PathBuf::from("src/b.py")]
        );
    }

    #[test]
    fn test_source_tree_skips_ignored_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("node_modules/pkg")).expect("mkdir");
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x").expect("write");
        fs::write(dir.path().join("app.js"), "x").expect("write");

        let tree = SourceTree::new(dir.path(), &EngineConfig::default());
        let files = tree.files().expect("enumeration");
        assert_eq!(files, vec![PathBuf::from("app.js")]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tree = SourceTree::new("/definitely/not/here", &EngineConfig::default());
        assert!(tree.files().is_err());
    }

    #[test]
    fn test_binary_content_is_none() {
        let provider = MockFileProvider::new(vec![
            ("bin.dat", b"\x00\x01\x02" as &[u8]),
            ("ok.py", b"print('hi')\n"),
        ]);
        assert!(provider.content(Path::new("bin.dat")).is_none());
        assert!(provider.content(Path::new("ok.py")).is_some());
    }
}
