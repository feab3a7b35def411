//! The single reconciliation pass.
//!
//! Walks the tree once and, for each visited directory, classifies it, plans
//! the keepfile action and hands it to the executor before moving on.

use crate::config::RunConfig;
use crate::error::Result;
use crate::executor::{ActionExecutor, Flow, LineSource, RunReport};
use crate::paths;
use crate::plan::{ActionRecord, plan_node};
use crate::shell::CommandRunner;
use crate::walker::TreeWalker;
use std::io::Write;
use std::path::Path;

/// Reconciles keepfiles below `start`.
///
/// `start` may be relative; it is resolved against `cwd`, the same base the
/// exclude list was resolved against. Directories that cannot be listed are
/// logged and their subtrees skipped.
///
/// # Errors
///
/// Fails when `start` is not a readable directory or when the output or
/// confirmation streams fail. Directories already handled stay handled.
pub fn reconcile<R, L, W>(
    config: &RunConfig,
    start: &Path,
    cwd: &Path,
    runner: &R,
    input: L,
    out: W,
) -> Result<RunReport>
where
    R: CommandRunner,
    L: LineSource,
    W: Write,
{
    let root = paths::absolutize(start, cwd);
    let walker = TreeWalker::new(&root, &config.filter, &config.keepfile)?;
    let options = config.exec_options();
    let mut executor = ActionExecutor::new(&options, runner, input, out);

    tracing::debug!(
        "reconciling {} (mode {:?}, prune {:?}, {} excluded)",
        root.display(),
        config.mode,
        config.filter.prune_names(),
        config.filter.exclude_set().len()
    );

    for visit in walker {
        let node = match visit {
            Ok(node) => node,
            Err(e) => {
                tracing::warn!("{}; skipping subtree", e);
                continue;
            }
        };

        let Some(kind) = plan_node(config.mode, &node).kind() else {
            continue;
        };

        // Reports and hooks always see the symlink-free absolute path.
        let path = match dunce::canonicalize(&node.path) {
            Ok(dir) => dir.join(&config.keepfile),
            Err(e) => {
                tracing::warn!("Cannot resolve {}: {}; skipping", node.path.display(), e);
                continue;
            }
        };

        if executor.execute(&ActionRecord { kind, path })? == Flow::Halt {
            break;
        }
    }

    let report = executor.into_report();
    tracing::info!(
        "created {}, deleted {}, failed {}, hook failures {}{}",
        report.created,
        report.deleted,
        report.failures,
        report.hook_failures,
        if report.halted { " (stopped early)" } else { "" }
    );
    Ok(report)
}
