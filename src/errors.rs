// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! A command that exits zero without printing a JSON object is *not* an
//! error: the runner reports it as `Ok(None)` (absent state).

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to launch `{command}` with interpreter '{shell}': {source}")]
    LaunchError {
        command: String,
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set up stdio for `{command}`: {message}")]
    PipeError { command: String, message: String },

    #[error("command `{command}` failed with {status}\nstderr:\n{stderr}\nstdout:\n{stdout}")]
    ExecutionError {
        command: String,
        status: String,
        code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("command `{command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShellError {
    /// True for failures that happened before the command could run
    /// (interpreter missing, bad working directory, stdio plumbing).
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            ShellError::LaunchError { .. } | ShellError::PipeError { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ShellError>;
