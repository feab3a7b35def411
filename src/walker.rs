//! Depth-first directory walk.
//!
//! [`TreeWalker`] is an iterator over [`DirectoryNode`]s driven by an explicit
//! stack. Siblings come out in lexicographic basename order and every node
//! is yielded before anything beneath it, so a whole subtree is finished
//! before the next sibling starts. The start directory itself is listed but
//! never yielded.
//!
//! The walker only reads directories. It never looks inside keepfiles and never
//! writes anything.

use crate::error::{KeepdirError, Result};
use crate::filter::{FilterDecision, PathFilter};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// A direct subdirectory of a visited directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdir {
    pub name: OsString,
    pub path: PathBuf,
    /// Filter verdict. Skipped subdirectories still count as content of
    /// their parent.
    pub decision: FilterDecision,
}

/// One listed directory.
///
/// Produced on demand and dropped after its keepfile has been reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNode {
    pub path: PathBuf,
    /// Non-directory entries, keepfile excluded. Symlinks land here.
    pub files: Vec<OsString>,
    /// Subdirectories in lexicographic order.
    pub subdirs: Vec<Subdir>,
    /// Whether a non-directory entry named like the keepfile exists.
    pub has_keepfile: bool,
}

/// A directory that could not be listed. Its subtree is abandoned.
#[derive(Debug)]
pub struct WalkError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

impl std::fmt::Display for WalkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to read directory {}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for WalkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Lexicographic depth-first walk below a start directory.
pub struct TreeWalker<'a> {
    root: PathBuf,
    filter: &'a PathFilter,
    keepfile: &'a OsStr,
    stack: Vec<PathBuf>,
}

impl<'a> TreeWalker<'a> {
    /// Prepares a walk below `root`, which must be an existing directory.
    ///
    /// `root` should already be in the normalized absolute form used for
    /// exclude matching (see [`crate::paths::absolutize`]).
    ///
    /// # Errors
    ///
    /// Returns [`KeepdirError::StartDirectory`] when `root` is missing, not
    /// a directory or cannot be listed.
    pub fn new(root: &Path, filter: &'a PathFilter, keepfile: &'a str) -> Result<Self> {
        let metadata = fs::metadata(root).map_err(|source| KeepdirError::StartDirectory {
            path: root.to_path_buf(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(KeepdirError::StartDirectory {
                path: root.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            });
        }
        // an unlistable root is fatal, unlike unlistable directories below it
        fs::read_dir(root).map_err(|source| KeepdirError::StartDirectory {
            path: root.to_path_buf(),
            source,
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            filter,
            keepfile: OsStr::new(keepfile),
            stack: vec![root.to_path_buf()],
        })
    }

    /// Reads one directory and splits its entries.
    fn list(&self, path: &Path) -> std::io::Result<DirectoryNode> {
        let mut files = Vec::new();
        let mut subdirs = Vec::new();
        let mut has_keepfile = false;

        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name();
            // file_type() does not follow symlinks
            let is_dir = entry.file_type()?.is_dir();

            if is_dir {
                let child = path.join(&name);
                let decision = self.filter.decide(&name, &child);
                if decision.skips() {
                    tracing::debug!("{:?} {}", decision, child.display());
                }
                subdirs.push(Subdir {
                    name,
                    path: child,
                    decision,
                });
            } else if name.as_os_str() == self.keepfile {
                has_keepfile = true;
            } else {
                files.push(name);
            }
        }

        files.sort();
        subdirs.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(DirectoryNode {
            path: path.to_path_buf(),
            files,
            subdirs,
            has_keepfile,
        })
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = std::result::Result<DirectoryNode, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(path) = self.stack.pop() {
            let node = match self.list(&path) {
                Ok(node) => node,
                Err(source) => return Some(Err(WalkError { path, source })),
            };

            // Reverse so the smallest name is popped first.
            self.stack.extend(
                node.subdirs
                    .iter()
                    .rev()
                    .filter(|sub| !sub.decision.skips())
                    .map(|sub| sub.path.clone()),
            );

            if path == self.root {
                continue;
            }
            tracing::debug!("visit {}", path.display());
            return Some(Ok(node));
        }
        None
    }
}
