//! Emptiness classification and the keepfile action rule.

use crate::walker::DirectoryNode;
use std::fmt;
use std::path::PathBuf;

/// Whether a directory counts as empty for keepfile purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emptiness {
    Empty,
    NonEmpty,
}

/// What the run is reconciling towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Keepfiles in exactly the empty directories.
    #[default]
    Update,
    /// No keepfiles anywhere.
    Purge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Create,
    Delete,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Create => "create",
            ActionKind::Delete => "delete",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Planned outcome for one directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Delete,
    None,
}

impl Action {
    /// The kind to execute, or `None` when nothing needs doing.
    pub fn kind(self) -> Option<ActionKind> {
        match self {
            Action::Create => Some(ActionKind::Create),
            Action::Delete => Some(ActionKind::Delete),
            Action::None => None,
        }
    }
}

/// A keepfile action ready for the executor.
///
/// `path` is the resolved, symlink-free keepfile path used for reporting
/// and hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub path: PathBuf,
}

/// Classifies a directory from its own listing only.
///
/// The keepfile is already left out of `node.files`. Pruned and excluded
/// subdirectories still make the directory non-empty.
pub fn classify(node: &DirectoryNode) -> Emptiness {
    if node.files.is_empty() && node.subdirs.is_empty() {
        Emptiness::Empty
    } else {
        Emptiness::NonEmpty
    }
}

/// Compares the desired state with the current keepfile.
pub fn plan(emptiness: Emptiness, has_keepfile: bool) -> Action {
    match (emptiness, has_keepfile) {
        (Emptiness::Empty, false) => Action::Create,
        (Emptiness::NonEmpty, true) => Action::Delete,
        _ => Action::None,
    }
}

/// Plans one directory for the given mode.
///
/// Purge ignores emptiness and deletes every keepfile it finds.
pub fn plan_node(mode: Mode, node: &DirectoryNode) -> Action {
    match mode {
        Mode::Update => plan(classify(node), node.has_keepfile),
        Mode::Purge if node.has_keepfile => Action::Delete,
        Mode::Purge => Action::None,
    }
}
