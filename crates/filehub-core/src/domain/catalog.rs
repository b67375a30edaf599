//! Catalogue registry: the named directory trees a server exposes.
//!
//! The registry is built once at startup from `(name, directory)` pairs and
//! never changes afterwards, so it is shared between sessions through an
//! `Arc` without any locking.
//!
//! # Validation
//!
//! A pair is kept only when the directory exists and is a directory, and the
//! name is non-empty and not already taken. Rejected pairs are logged and
//! skipped; a server with zero valid catalogues still starts.
//!
//! # Walking
//!
//! File listings and searches walk the whole tree under a catalogue root.
//! Only regular files are reported; directories are descended into but never
//! listed. If the walk hits an I/O error the result is empty and the error is
//! logged, so a broken subtree shows up as "nothing found" to the client
//! rather than a protocol failure.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// A validated catalogue: a unique name bound to an absolute directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub name: String,
    pub root: PathBuf,
}

/// One exact-name match found by [`CatalogueRegistry::search`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub file_name: String,
    pub path: PathBuf,
}

/// Read-only mapping of catalogue names to their roots, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct CatalogueRegistry {
    entries: Vec<CatalogueEntry>,
}

impl CatalogueRegistry {
    /// Builds a registry from `(name, directory)` pairs, dropping invalid ones.
    ///
    /// Roots are canonicalized, so every accepted entry holds an absolute path.
    pub fn from_pairs<I, N, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: AsRef<Path>,
    {
        let mut entries: Vec<CatalogueEntry> = Vec::new();

        for (name, dir) in pairs {
            let name = name.into();
            let dir = dir.as_ref();

            if name.trim().is_empty() {
                warn!("skipping catalogue with empty name (dir {})", dir.display());
                continue;
            }
            if entries.iter().any(|e| e.name == name) {
                warn!("skipping duplicate catalogue name '{name}' (dir {})", dir.display());
                continue;
            }

            let root = match dir.canonicalize() {
                Ok(root) if root.is_dir() => root,
                Ok(root) => {
                    warn!("skipping catalogue '{name}': {} is not a directory", root.display());
                    continue;
                }
                Err(e) => {
                    warn!("skipping catalogue '{name}': cannot open {}: {e}", dir.display());
                    continue;
                }
            };

            debug!("catalogue '{name}' -> {}", root.display());
            entries.push(CatalogueEntry { name, root });
        }

        Self { entries }
    }

    /// Catalogue names in configuration order.
    pub fn list_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Looks up a catalogue by exact, case-sensitive name.
    pub fn resolve(&self, name: &str) -> Option<&CatalogueEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Names of every regular file anywhere under the catalogue root.
    pub fn list_files(&self, entry: &CatalogueEntry) -> Vec<String> {
        walk_files(&entry.root)
            .map(|files| files.into_iter().map(|(name, _)| name).collect())
            .unwrap_or_default()
    }

    /// Every regular file under the catalogue root whose name equals `file_name`.
    pub fn search(&self, entry: &CatalogueEntry, file_name: &str) -> Vec<SearchHit> {
        walk_files(&entry.root)
            .map(|files| {
                files
                    .into_iter()
                    .filter(|(name, _)| name == file_name)
                    .map(|(name, path)| SearchHit {
                        file_name: name,
                        path,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects `(file name, absolute path)` for every regular file under `root`.
///
/// Returns `None` (after logging) if any part of the walk fails.
fn walk_files(root: &Path) -> Option<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for item in WalkDir::new(root).sort_by_file_name() {
        let entry = match item {
            Ok(entry) => entry,
            Err(e) => {
                warn!("walk of {} failed: {e}", root.display());
                return None;
            }
        };
        if entry.file_type().is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push((name, entry.into_path()));
        }
    }
    Some(files)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Builds `root/{a.txt, nested/b.txt, nested/deeper/a.txt, empty/}`.
    fn make_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::create_dir_all(dir.path().join("nested/deeper"))
            .unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("nested/b.txt"), b"beta").unwrap();
        fs::write(dir.path().join("nested/deeper/a.txt"), b"alpha2")
            .unwrap();
        dir
    }

    #[test]
    fn test_from_pairs_keeps_valid_directories_in_order() {
        // Arrange
        let one = TempDir::new().unwrap();
        let two = TempDir::new().unwrap();

        // Act
        let registry =
            CatalogueRegistry::from_pairs([("music", one.path()), ("docs", two.path())]);

        // Assert
        assert_eq!(registry.list_names(), vec!["music", "docs"]);
    }

    #[test]
    fn test_from_pairs_drops_missing_directory() {
        let good = TempDir::new().unwrap();
        let missing = good.path().join("does-not-exist");

        let registry = CatalogueRegistry::from_pairs([
            ("gone", missing.as_path()),
            ("here", good.path()),
        ]);

        assert_eq!(registry.list_names(), vec!["here"]);
    }

    #[test]
    fn test_from_pairs_drops_regular_file_root() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let registry = CatalogueRegistry::from_pairs([("plain", file.as_path())]);

        assert!(registry.is_empty());
    }

    #[test]
    fn test_from_pairs_keeps_first_of_duplicate_names() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();

        let registry =
            CatalogueRegistry::from_pairs([("docs", first.path()), ("docs", second.path())]);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.resolve("docs").unwrap().root,
            first.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_from_pairs_drops_blank_name() {
        let dir = TempDir::new().unwrap();
        let registry = CatalogueRegistry::from_pairs([("  ", dir.path())]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let dir = TempDir::new().unwrap();
        let registry = CatalogueRegistry::from_pairs([("Docs", dir.path())]);
        assert!(registry.resolve("Docs").is_some());
        assert!(registry.resolve("docs").is_none());
    }

    #[test]
    fn test_roots_are_absolute() {
        let dir = TempDir::new().unwrap();
        let registry = CatalogueRegistry::from_pairs([("docs", dir.path())]);
        assert!(registry.resolve("docs").unwrap().root.is_absolute());
    }

    #[test]
    fn test_list_files_walks_recursively_and_skips_directories() {
        // Arrange
        let tree = make_tree();
        let registry = CatalogueRegistry::from_pairs([("tree", tree.path())]);
        let entry = registry.resolve("tree").unwrap();

        // Act
        let mut files = registry.list_files(entry);
        files.sort();

        // Assert
        assert_eq!(files, vec!["a.txt", "a.txt", "b.txt"]);
    }

    #[test]
    fn test_list_files_of_empty_catalogue_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = CatalogueRegistry::from_pairs([("empty", dir.path())]);
        let entry = registry.resolve("empty").unwrap();
        assert!(registry.list_files(entry).is_empty());
    }

    #[test]
    fn test_search_returns_every_exact_match_with_absolute_path() {
        // Arrange
        let tree = make_tree();
        let registry = CatalogueRegistry::from_pairs([("tree", tree.path())]);
        let entry = registry.resolve("tree").unwrap();

        // Act
        let hits = registry.search(entry, "a.txt");

        // Assert
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert_eq!(hit.file_name, "a.txt");
            assert!(hit.path.is_absolute());
            assert!(hit.path.starts_with(&entry.root));
        }
    }

    #[test]
    fn test_search_does_not_match_partial_names() {
        let tree = make_tree();
        let registry = CatalogueRegistry::from_pairs([("tree", tree.path())]);
        let entry = registry.resolve("tree").unwrap();

        assert!(registry.search(entry, "a").is_empty());
        assert!(registry.search(entry, "A.TXT").is_empty());
        assert!(registry.search(entry, "nested").is_empty());
    }

    #[test]
    fn test_walk_of_vanished_root_is_empty_not_error() {
        // Arrange: register, then delete the root out from under the registry
        let dir = TempDir::new().unwrap();
        let registry = CatalogueRegistry::from_pairs([("gone", dir.path())]);
        let entry = registry.resolve("gone").unwrap().clone();
        drop(dir);

        // Act / Assert
        assert!(registry.list_files(&entry).is_empty());
        assert!(registry.search(&entry, "a.txt").is_empty());
    }
}
