// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::Phase;

/// Command-line arguments for `shellstate`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shellstate",
    version,
    about = "Manage resources whose lifecycle is implemented by shell commands.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Shell.toml")]
    pub config: String,

    /// Path to the JSON state file. Created on first run.
    #[arg(long, value_name = "PATH", default_value = ".shellstate.json")]
    pub state: String,

    /// Lifecycle phase to run.
    #[arg(long, value_enum, default_value = "read")]
    pub phase: Phase,

    /// Only run this resource or data source.
    #[arg(long, value_name = "NAME")]
    pub resource: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHELLSTATE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved config, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
