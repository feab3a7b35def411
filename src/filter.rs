//! Subtree filtering by basename (prune) and by exact path (exclude).
//!
//! Both filters remove a whole subtree from the walk: the directory is not
//! descended into and nothing inside it gets a keepfile action. They differ
//! only in what they match on.
//!
//! - Prune names are plain basenames such as `.git`, matched on every level.
//! - Exclude paths come from an external command's stdout, one per line.
//!   Relative lines are resolved against the invocation's working directory
//!   (not the directory being visited) and compared exactly, with no prefix
//!   or glob matching.

use crate::error::{KeepdirError, Result};
use crate::paths;
use crate::shell::CommandRunner;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Outcome of checking one directory against the filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// Basename is in the prune set.
    Prune,
    /// Path is in the exclude set.
    Exclude,
    /// Walk into it and manage its keepfile.
    Proceed,
}

impl FilterDecision {
    /// Returns true when the subtree is skipped.
    pub fn skips(self) -> bool {
        !matches!(self, FilterDecision::Proceed)
    }
}

/// Set of absolute, lexically normalized directory paths to skip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeSet {
    paths: HashSet<PathBuf>,
}

impl ExcludeSet {
    /// Builds the set from raw lines, resolving each one against `cwd`.
    ///
    /// Blank lines are ignored.
    pub fn from_lines<I, S>(lines: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let paths = lines
            .into_iter()
            .filter(|line| !line.as_ref().trim().is_empty())
            .map(|line| paths::absolutize(Path::new(line.as_ref()), cwd))
            .collect();
        Self { paths }
    }

    /// Runs `command` once and builds the set from its stdout.
    ///
    /// A non-zero exit status is only a warning; whatever the command printed
    /// is still used.
    ///
    /// # Errors
    ///
    /// Returns [`KeepdirError::ExcludeCommand`] if the command cannot be started.
    pub fn load<R: CommandRunner>(command: &str, runner: &R, cwd: &Path) -> Result<Self> {
        let output = runner
            .run(command)
            .map_err(|source| KeepdirError::ExcludeCommand {
                command: command.to_string(),
                source,
            })?;

        if !output.success() {
            tracing::warn!(
                "exclude command '{}' exited with status {:?}",
                command,
                output.code
            );
        }

        let set = Self::from_lines(output.lines(), cwd);
        tracing::debug!("loaded {} exclude paths", set.len());
        Ok(set)
    }

    /// Adds every path from `other`.
    pub fn extend(&mut self, other: ExcludeSet) {
        self.paths.extend(other.paths);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Decides whether a directory is walked and managed.
///
/// Built once before the walk and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    prune: Vec<String>,
    exclude: ExcludeSet,
}

impl PathFilter {
    pub fn new(prune: Vec<String>, exclude: ExcludeSet) -> Self {
        Self { prune, exclude }
    }

    /// Classifies a directory by its basename and normalized absolute path.
    ///
    /// Prune wins when both match.
    pub fn decide(&self, name: &OsStr, path: &Path) -> FilterDecision {
        if self.prune.iter().any(|p| OsStr::new(p) == name) {
            FilterDecision::Prune
        } else if self.exclude.contains(path) {
            FilterDecision::Exclude
        } else {
            FilterDecision::Proceed
        }
    }

    pub fn prune_names(&self) -> &[String] {
        &self.prune
    }

    pub fn exclude_set(&self) -> &ExcludeSet {
        &self.exclude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::CommandOutput;
    use std::cell::RefCell;
    use std::io;

    struct FakeRunner {
        stdout: &'static str,
        code: i32,
        calls: RefCell<Vec<String>>,
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, command_line: &str) -> io::Result<CommandOutput> {
            self.calls.borrow_mut().push(command_line.to_string());
            Ok(CommandOutput {
                stdout: self.stdout.as_bytes().to_vec(),
                code: Some(self.code),
            })
        }
    }

    struct BrokenRunner;

    impl CommandRunner for BrokenRunner {
        fn run(&self, _command_line: &str) -> io::Result<CommandOutput> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no shell"))
        }
    }

    #[test]
    fn test_prune_matches_basename_anywhere() {
        let filter = PathFilter::new(vec![".git".to_string()], ExcludeSet::default());
        assert_eq!(
            filter.decide(OsStr::new(".git"), Path::new("/w/a/b/.git")),
            FilterDecision::Prune
        );
        assert_eq!(
            filter.decide(OsStr::new("git"), Path::new("/w/a/git")),
            FilterDecision::Proceed
        );
    }

    #[test]
    fn test_exclude_is_exact_path_match() {
        let exclude = ExcludeSet::from_lines(["a/b"], Path::new("/w"));
        let filter = PathFilter::new(Vec::new(), exclude);

        assert_eq!(
            filter.decide(OsStr::new("b"), Path::new("/w/a/b")),
            FilterDecision::Exclude
        );
        // no prefix matching
        assert_eq!(
            filter.decide(OsStr::new("c"), Path::new("/w/a/b/c")),
            FilterDecision::Proceed
        );
        // relative lines are anchored at cwd, not at the visited directory
        assert_eq!(
            filter.decide(OsStr::new("b"), Path::new("/w/x/a/b")),
            FilterDecision::Proceed
        );
    }

    #[test]
    fn test_prune_takes_precedence_over_exclude() {
        let exclude = ExcludeSet::from_lines(["/w/.git"], Path::new("/w"));
        let filter = PathFilter::new(vec![".git".to_string()], exclude);
        assert_eq!(
            filter.decide(OsStr::new(".git"), Path::new("/w/.git")),
            FilterDecision::Prune
        );
        assert!(FilterDecision::Prune.skips());
        assert!(FilterDecision::Exclude.skips());
        assert!(!FilterDecision::Proceed.skips());
    }

    #[test]
    fn test_from_lines_skips_blank_and_normalizes() {
        let set = ExcludeSet::from_lines(["./a/d", "", "   ", "/abs/e/"], Path::new("/w"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(Path::new("/w/a/d")));
        assert!(set.contains(Path::new("/abs/e")));
    }

    #[test]
    fn test_load_runs_command_once() {
        let runner = FakeRunner {
            stdout: "a/b\n/abs/c\n",
            code: 0,
            calls: RefCell::new(Vec::new()),
        };
        let set = ExcludeSet::load("list-excludes", &runner, Path::new("/w")).unwrap();

        assert_eq!(runner.calls.borrow().as_slice(), ["list-excludes"]);
        assert!(set.contains(Path::new("/w/a/b")));
        assert!(set.contains(Path::new("/abs/c")));
    }

    #[test]
    fn test_load_keeps_output_of_failing_command() {
        let runner = FakeRunner {
            stdout: "a/b\n",
            code: 1,
            calls: RefCell::new(Vec::new()),
        };
        let set = ExcludeSet::load("false-ish", &runner, Path::new("/w")).unwrap();
        assert!(set.contains(Path::new("/w/a/b")));
    }

    #[test]
    fn test_load_reports_spawn_failure() {
        let err = ExcludeSet::load("anything", &BrokenRunner, Path::new("/w")).unwrap_err();
        assert!(matches!(err, KeepdirError::ExcludeCommand { .. }));
    }
}
