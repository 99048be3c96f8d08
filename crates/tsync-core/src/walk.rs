//! Template-tree traversal with regex ignore pruning.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Paths skipped on every run, merged with user-configured entries.
/// Patterns apply to root-relative paths; matching a directory prunes its
/// subtree.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git$",
    ".changelog",
    ".editorconfig",
    ".gitignore",
    "CHANGELOG.md",
    "LICENSE.md",
    "README.md",
    "UPGRADE.md",
];

/// Walks a template tree, yielding the relative paths of syncable files.
#[derive(Debug)]
pub struct TemplateWalker {
    ignores: Vec<Regex>,
}

impl TemplateWalker {
    /// Compiles the default ignore list plus `user_ignores`. Defaults must
    /// compile; a bad user pattern fails the run rather than silently
    /// syncing files the user meant to skip.
    pub fn new(user_ignores: &[String]) -> Result<Self> {
        let mut ignores = Vec::with_capacity(DEFAULT_IGNORES.len() + user_ignores.len());
        for pattern in DEFAULT_IGNORES.iter().copied().chain(user_ignores.iter().map(String::as_str)) {
            let regex = Regex::new(pattern).map_err(|source| Error::IgnorePattern {
                pattern: pattern.to_string(),
                source,
            })?;
            ignores.push(regex);
        }
        Ok(Self { ignores })
    }

    fn is_ignored(&self, rel: &Path) -> bool {
        let rel = rel.to_string_lossy();
        self.ignores.iter().any(|re| re.is_match(&rel))
    }

    /// Relative paths of all files under `root` that survive the ignore
    /// list, in sorted order.
    pub fn files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                match entry.path().strip_prefix(root) {
                    Ok(rel) if !rel.as_os_str().is_empty() => !self.is_ignored(rel),
                    _ => true, // the root itself
                }
            });
        for entry in walker {
            let entry = entry.map_err(|source| Error::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.path().strip_prefix(root) {
                Ok(rel) => files.push(rel.to_path_buf()),
                Err(_) => warn!(path = %entry.path().display(), "entry outside root, skipping"),
            }
        }
        debug!(root = %root.display(), count = files.len(), "walked template tree");
        Ok(files)
    }
}
