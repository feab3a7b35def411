//! Error types shared across the reconciliation pipeline.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a keepdir run.
///
/// Everything here is fatal. Per-directory problems met during the walk are
/// reported through [`crate::walker::WalkError`] instead and never abort the run.
#[derive(Error, Debug)]
pub enum KeepdirError {
    #[error("--replace requires a non-empty token")]
    EmptyReplaceToken,

    #[error("--replace given conflicting tokens '{first}' and '{second}'")]
    ConflictingReplaceToken { first: String, second: String },

    #[error("Invalid keepfile name '{0}': must be a single file name")]
    InvalidKeepfile(String),

    #[error("Cannot use {path} as start directory: {source}")]
    StartDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to run exclude command '{command}': {source}")]
    ExcludeCommand {
        command: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error on terminal streams: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KeepdirError>;
