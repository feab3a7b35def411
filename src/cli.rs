//! Command-line interface module for keepdir.
//!
//! This module handles:
//! - Argument parsing with clap
//! - Recovering the relative order of `--prune` and `--no-prune`
//! - Folding arguments and the config file into a [`RunConfig`]
//! - Running the reconciliation against the real terminal

use crate::config::{
    FileConfig, HookList, PruneEvent, RunConfig, fold_prune_set, resolve_replace_token,
    validate_keepfile,
};
use crate::error::Result;
use crate::executor::RunReport;
use crate::filter::{ExcludeSet, PathFilter};
use crate::plan::Mode;
use crate::reconcile::reconcile;
use crate::shell::{CommandRunner, ShellRunner};
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "keepdir",
    author,
    version,
    args_override_self = true,
    about = "Keep empty directories trackable by maintaining a keepfile in each of them",
    long_about = "Walks DIRECTORY depth-first and makes sure every directory without other \
                  entries holds an empty keepfile, and that no other directory does."
)]
pub struct Args {
    /// Directory to reconcile (defaults to current directory)
    #[arg(default_value = ".")]
    pub directory: PathBuf,

    /// Create and delete keepfiles so that exactly the empty directories have one (default)
    #[arg(long, overrides_with = "purge")]
    pub update: bool,

    /// Delete every keepfile found
    #[arg(long, overrides_with = "update")]
    pub purge: bool,

    /// Report actions and run hooks without touching the filesystem
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Do not print create/delete lines (hook output is still shown)
    #[arg(long, short)]
    pub quiet: bool,

    /// Ask before each action; anything but y/Y stops the run
    #[arg(long, short)]
    pub interactive: bool,

    /// Do not descend into directories with this name (repeatable)
    #[arg(long, value_name = "NAME", action = ArgAction::Append)]
    pub prune: Vec<String>,

    /// Forget prune names given so far
    #[arg(long)]
    pub no_prune: bool,

    /// Shell command printing directories to skip, one path per line (repeatable)
    #[arg(long, value_name = "COMMAND", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Token in hook commands replaced by the keepfile path
    #[arg(long, value_name = "TOKEN", action = ArgAction::Append)]
    pub replace: Vec<String>,

    /// Shell command run after each create (repeatable, run in order)
    #[arg(long, value_name = "COMMAND", action = ArgAction::Append)]
    pub create_hook: Vec<String>,

    /// Shell command run after each delete (repeatable, run in order)
    #[arg(long, value_name = "COMMAND", action = ArgAction::Append)]
    pub delete_hook: Vec<String>,

    /// Keepfile name [default: .keep]
    #[arg(long, value_name = "NAME")]
    pub keepfile: Option<String>,

    /// Configuration file to use instead of .keepdirrc.toml discovery
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(long, short, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Parsed arguments plus the prune flags in command-line order.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub args: Args,
    pub prune_events: Vec<PruneEvent>,
}

impl Invocation {
    /// Parses `std::env::args_os`, exiting on `--help`, `--version` or usage errors.
    pub fn parse() -> Self {
        let matches = Args::command().get_matches();
        Self::from_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// Parses an explicit argument list.
    ///
    /// # Errors
    ///
    /// Returns the clap error for usage problems and for `--help`/`--version`.
    pub fn try_parse_from<I, T>(itr: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Args::command().try_get_matches_from(itr)?;
        Self::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> std::result::Result<Self, clap::Error> {
        let args = Args::from_arg_matches(matches)?;
        let prune_events = prune_events(matches);
        Ok(Self { args, prune_events })
    }

    /// Folds the arguments over `file` into a run configuration.
    ///
    /// Replace tokens and the keepfile name are validated first, so a bad
    /// `--replace` or `--keepfile` fails before any exclude command runs or
    /// any directory is read.
    ///
    /// # Errors
    ///
    /// Fails on invalid `--replace` usage, an invalid keepfile name (from the
    /// flag or the config file) or when an exclude command cannot be started.
    pub fn into_run_config<R: CommandRunner>(
        self,
        file: FileConfig,
        runner: &R,
        cwd: &Path,
    ) -> Result<RunConfig> {
        let Invocation { args, prune_events } = self;

        let replace = resolve_replace_token(&args.replace, file.replace.as_deref())?;
        let keepfile = args.keepfile.unwrap_or(file.keepfile);
        validate_keepfile(&keepfile)?;
        let prune = fold_prune_set(file.prune, prune_events);

        let mut exclude = ExcludeSet::default();
        for command in &args.exclude {
            exclude.extend(ExcludeSet::load(command, runner, cwd)?);
        }

        let hooks = HookList {
            create: file.create_hooks.into_iter().chain(args.create_hook).collect(),
            delete: file.delete_hooks.into_iter().chain(args.delete_hook).collect(),
        };

        Ok(RunConfig {
            mode: if args.purge { Mode::Purge } else { Mode::Update },
            dry_run: args.dry_run,
            quiet: args.quiet,
            interactive: args.interactive,
            keepfile,
            filter: PathFilter::new(prune, exclude),
            replace,
            hooks,
        })
    }
}

/// Recovers `--prune`/`--no-prune` order from clap's argument indices.
///
/// Repeated `--no-prune` flags collapse into the last one, which is the only
/// one that matters for the fold.
fn prune_events(matches: &ArgMatches) -> Vec<PruneEvent> {
    let mut indexed: Vec<(usize, PruneEvent)> = Vec::new();

    if let (Some(indices), Some(values)) = (
        matches.indices_of("prune"),
        matches.get_many::<String>("prune"),
    ) {
        indexed.extend(
            indices
                .zip(values)
                .map(|(index, name)| (index, PruneEvent::Add(name.clone()))),
        );
    }

    if matches.get_flag("no_prune")
        && let Some(index) = matches.index_of("no_prune")
    {
        indexed.push((index, PruneEvent::Clear));
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, event)| event).collect()
}

/// Runs keepdir for a parsed invocation against stdin/stdout.
///
/// # Errors
///
/// Returns configuration, validation, start-directory and terminal errors.
pub fn run_cli(invocation: Invocation) -> Result<RunReport> {
    let cwd = std::env::current_dir()?;
    let file = FileConfig::load(invocation.args.config.as_deref(), &cwd)?;
    let start = invocation.args.directory.clone();

    let runner = ShellRunner;
    let config = invocation.into_run_config(file, &runner, &cwd)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    reconcile(&config, &start, &cwd, &runner, stdin.lock(), stdout.lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeepdirError;
    use crate::shell::CommandOutput;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<String>>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command_line: &str) -> io::Result<CommandOutput> {
            self.calls.borrow_mut().push(command_line.to_string());
            Ok(CommandOutput {
                stdout: b"a/b\n".to_vec(),
                code: Some(0),
            })
        }
    }

    fn parse(args: &[&str]) -> Invocation {
        Invocation::try_parse_from(std::iter::once("keepdir").chain(args.iter().copied()))
            .unwrap()
    }

    fn build(args: &[&str]) -> Result<RunConfig> {
        parse(args).into_run_config(
            FileConfig::default(),
            &RecordingRunner::default(),
            Path::new("/w"),
        )
    }

    #[test]
    fn test_defaults() {
        let config = build(&[]).unwrap();
        assert_eq!(config.mode, Mode::Update);
        assert_eq!(config.keepfile, ".keep");
        assert_eq!(config.filter.prune_names(), [".git".to_string()]);
        assert!(config.replace.is_none());
        assert!(!config.dry_run && !config.quiet && !config.interactive);
    }

    #[test]
    fn test_no_prune_before_prune() {
        let config = build(&["--no-prune", "--prune=b"]).unwrap();
        assert_eq!(config.filter.prune_names(), ["b".to_string()]);
    }

    #[test]
    fn test_prune_before_no_prune() {
        let config = build(&["--prune=b", "--no-prune"]).unwrap();
        assert!(config.filter.prune_names().is_empty());
    }

    #[test]
    fn test_prune_with_separate_value() {
        let config = build(&["--prune", "node_modules"]).unwrap();
        assert_eq!(
            config.filter.prune_names(),
            [".git".to_string(), "node_modules".to_string()]
        );
    }

    #[test]
    fn test_last_mode_flag_wins() {
        assert_eq!(build(&["--purge"]).unwrap().mode, Mode::Purge);
        assert_eq!(build(&["--purge", "--update"]).unwrap().mode, Mode::Update);
        assert_eq!(build(&["--update", "--purge"]).unwrap().mode, Mode::Purge);
    }

    #[test]
    fn test_replace_validation() {
        assert_eq!(
            build(&["--replace=%", "--replace=%"]).unwrap().replace,
            Some("%".to_string())
        );
        assert!(matches!(
            build(&["--replace=%", "--replace=+"]),
            Err(KeepdirError::ConflictingReplaceToken { .. })
        ));
        assert!(matches!(
            build(&["--replace="]),
            Err(KeepdirError::EmptyReplaceToken)
        ));
    }

    #[test]
    fn test_bad_replace_fails_before_exclude_runs() {
        let runner = RecordingRunner::default();
        let result = parse(&["--exclude=echo a", "--replace="]).into_run_config(
            FileConfig::default(),
            &runner,
            Path::new("/w"),
        );
        assert!(result.is_err());
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_exclude_command_runs_once_per_flag() {
        let runner = RecordingRunner::default();
        let config = parse(&["--exclude=list"])
            .into_run_config(FileConfig::default(), &runner, Path::new("/w"))
            .unwrap();

        assert_eq!(runner.calls.borrow().as_slice(), ["list"]);
        assert!(config.filter.exclude_set().contains(Path::new("/w/a/b")));
    }

    #[test]
    fn test_hooks_keep_order_after_config_hooks() {
        let file = FileConfig {
            create_hooks: vec!["cfg".to_string()],
            ..Default::default()
        };
        let config = parse(&["--create-hook=echo 1.", "--create-hook=echo 2.", "--delete-hook=rm"])
            .into_run_config(file, &RecordingRunner::default(), Path::new("/w"))
            .unwrap();

        assert_eq!(config.hooks.create, ["cfg", "echo 1.", "echo 2."]);
        assert_eq!(config.hooks.delete, ["rm"]);
    }

    #[test]
    fn test_keepfile_flag_overrides_config() {
        let config = build(&["--keepfile=.gitkeep"]).unwrap();
        assert_eq!(config.keepfile, ".gitkeep");
    }

    #[test]
    fn test_invalid_keepfile_rejected_before_exclude_runs() {
        for flag in ["--keepfile=", "--keepfile=x/y", "--keepfile=.."] {
            let runner = RecordingRunner::default();
            let result = parse(&["--exclude=list", flag]).into_run_config(
                FileConfig::default(),
                &runner,
                Path::new("/w"),
            );
            assert!(
                matches!(result, Err(KeepdirError::InvalidKeepfile(_))),
                "{flag}"
            );
            assert!(runner.calls.borrow().is_empty());
        }
    }

    #[test]
    fn test_invalid_keepfile_from_config_rejected() {
        let file = FileConfig {
            keepfile: "sub/.keep".to_string(),
            ..Default::default()
        };
        let result = parse(&[]).into_run_config(file, &RecordingRunner::default(), Path::new("/w"));
        assert!(matches!(result, Err(KeepdirError::InvalidKeepfile(_))));
    }

    #[test]
    fn test_help_is_reported_as_clap_error() {
        let err = Invocation::try_parse_from(["keepdir", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_directory_positional() {
        let invocation = parse(&["-q", "sub/dir"]);
        assert_eq!(invocation.args.directory, PathBuf::from("sub/dir"));
        assert!(invocation.args.quiet);
    }

    #[test]
    fn test_clap_definition_is_valid() {
        Args::command().debug_assert();
    }
}
