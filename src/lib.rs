//! keepdir - keep empty directories visible to file-only trackers
//!
//! Version-control systems such as git track files, not directories, so an
//! empty directory silently disappears from a checkout. keepdir walks a tree
//! and reconciles it against one convention: every directory with no other
//! entries holds a single empty keepfile (`.keep` by default), and no other
//! directory does.
//!
//! The pipeline is a single pass, one directory at a time:
//! [`walker::TreeWalker`] → [`plan::classify`] → [`plan::plan_node`] →
//! [`executor::ActionExecutor`], driven by [`reconcile::reconcile`].

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod filter;
pub mod output;
pub mod paths;
pub mod plan;
pub mod reconcile;
pub mod shell;
pub mod walker;

pub use config::{FileConfig, HookList, RunConfig};
pub use error::{KeepdirError, Result};
pub use executor::{ActionExecutor, LineSource, RunReport};
pub use filter::{ExcludeSet, FilterDecision, PathFilter};
pub use plan::{Action, ActionKind, ActionRecord, Mode};
pub use reconcile::reconcile;
pub use shell::{CommandOutput, CommandRunner, ShellRunner};
pub use walker::{DirectoryNode, TreeWalker};

pub use cli::{Invocation, run_cli};
