//! Configuration: the optional TOML file and the immutable run configuration.
//!
//! A run is configured in two layers. The config file supplies defaults for
//! the keepfile name, the initial prune list, the replace token and hooks.
//! Command-line flags are then folded over those defaults, in argument order,
//! into a [`RunConfig`] that stays fixed for the whole walk.
//!
//! # Configuration File Format
//!
//! ```toml
//! keepfile = ".keep"
//! prune = [".git"]
//! replace = "%"
//! create_hooks = ["git add %"]
//! delete_hooks = ["git rm --cached --ignore-unmatch %"]
//! ```

use crate::error::{KeepdirError, Result};
use crate::executor::ExecOptions;
use crate::filter::PathFilter;
use crate::plan::{ActionKind, Mode};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keepfile name used when nothing else is configured.
pub const DEFAULT_KEEPFILE: &str = ".keep";

/// Prune list used when nothing else is configured.
pub const DEFAULT_PRUNE: &[&str] = &[".git"];

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_NAME: &str = ".keepdirrc.toml";

/// Errors that can occur while loading the configuration file.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(String),
}

/// Settings read from a TOML configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Name of the marker file.
    #[serde(default = "default_keepfile")]
    pub keepfile: String,

    /// Basenames pruned before any `--prune`/`--no-prune` flag is applied.
    #[serde(default = "default_prune")]
    pub prune: Vec<String>,

    /// Replace token used when no `--replace` flag is given.
    #[serde(default)]
    pub replace: Option<String>,

    /// Hooks run after each create, before hooks given on the command line.
    #[serde(default)]
    pub create_hooks: Vec<String>,

    /// Hooks run after each delete, before hooks given on the command line.
    #[serde(default)]
    pub delete_hooks: Vec<String>,
}

fn default_keepfile() -> String {
    DEFAULT_KEEPFILE.to_string()
}

fn default_prune() -> Vec<String> {
    DEFAULT_PRUNE.iter().map(|s| s.to_string()).collect()
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            keepfile: default_keepfile(),
            prune: default_prune(),
            replace: None,
            create_hooks: Vec::new(),
            delete_hooks: Vec::new(),
        }
    }
}

impl FileConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.keepdirrc.toml` in `cwd`
    /// 3. Look for `~/.config/keepdir/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any discovered file fails to parse.
    pub fn load(config_path: Option<&Path>, cwd: &Path) -> std::result::Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(&cwd.join(path));
        }

        let local_config = cwd.join(LOCAL_CONFIG_NAME);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("keepdir")
                .join("config.toml");
            if home_config.is_file() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if file does not exist.
    /// Returns `ConfigError::Invalid` if TOML parsing fails.
    /// Returns `ConfigError::Io` if file cannot be read.
    pub fn load_from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        tracing::debug!("loaded configuration from {}", path.display());

        toml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// One prune-affecting flag, in the position it appeared on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PruneEvent {
    /// `--prune=NAME`
    Add(String),
    /// `--no-prune`
    Clear,
}

/// Folds prune flags left to right over the initial prune list.
///
/// `Clear` only drops what came before it, so later `Add`s survive. An `Add`
/// appends its name unless it is already listed, so the result never holds
/// duplicates.
pub fn fold_prune_set<I>(initial: Vec<String>, events: I) -> Vec<String>
where
    I: IntoIterator<Item = PruneEvent>,
{
    events
        .into_iter()
        .fold(initial, |mut prune, event| {
            match event {
                PruneEvent::Add(name) => {
                    if !prune.contains(&name) {
                        prune.push(name);
                    }
                }
                PruneEvent::Clear => prune.clear(),
            }
            prune
        })
}

/// Validates every `--replace` value given and returns the token.
///
/// Repeating the same token is fine; an empty token or two different ones
/// are rejected. With no flags at all, `fallback` (from the config file) is
/// used as-is after the same emptiness check.
///
/// # Errors
///
/// Returns [`KeepdirError::EmptyReplaceToken`] or
/// [`KeepdirError::ConflictingReplaceToken`].
pub fn resolve_replace_token(values: &[String], fallback: Option<&str>) -> Result<Option<String>> {
    let mut token: Option<&str> = None;
    for value in values {
        if value.is_empty() {
            return Err(KeepdirError::EmptyReplaceToken);
        }
        match token {
            Some(first) if first != value.as_str() => {
                return Err(KeepdirError::ConflictingReplaceToken {
                    first: first.to_string(),
                    second: value.clone(),
                });
            }
            _ => token = Some(value.as_str()),
        }
    }

    match token.or(fallback) {
        Some("") => Err(KeepdirError::EmptyReplaceToken),
        other => Ok(other.map(str::to_string)),
    }
}

/// Checks that a keepfile name names a file directly inside each directory.
///
/// # Errors
///
/// Returns [`KeepdirError::InvalidKeepfile`] for an empty name, `.`, `..` or
/// a name containing a path separator.
pub fn validate_keepfile(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(std::path::is_separator) {
        return Err(KeepdirError::InvalidKeepfile(name.to_string()));
    }
    Ok(())
}

/// Hook command templates per action kind, in first-specified-first-run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookList {
    pub create: Vec<String>,
    pub delete: Vec<String>,
}

impl HookList {
    pub fn for_kind(&self, kind: ActionKind) -> &[String] {
        match kind {
            ActionKind::Create => &self.create,
            ActionKind::Delete => &self.delete,
        }
    }
}

/// Everything a run needs, fixed before the walk starts.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub dry_run: bool,
    pub quiet: bool,
    pub interactive: bool,
    pub keepfile: String,
    pub filter: PathFilter,
    pub replace: Option<String>,
    pub hooks: HookList,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Update,
            dry_run: false,
            quiet: false,
            interactive: false,
            keepfile: DEFAULT_KEEPFILE.to_string(),
            filter: PathFilter::new(default_prune(), Default::default()),
            replace: None,
            hooks: HookList::default(),
        }
    }
}

impl RunConfig {
    /// The subset of settings the executor needs.
    pub fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            dry_run: self.dry_run,
            quiet: self.quiet,
            interactive: self.interactive,
            replace: self.replace.clone(),
            hooks: self.hooks.clone(),
        }
    }
}
