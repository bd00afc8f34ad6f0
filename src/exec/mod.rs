// src/exec/mod.rs

//! Command execution engine.
//!
//! - [`env`] merges the ambient environment with user overrides.
//! - [`extract`] finds the trailing JSON object in captured stdout.
//! - [`streams`] drains stdout/stderr concurrently and logs every line.
//! - [`runner`] launches one command, feeds it the previous state and
//!   turns its output into a new [`crate::state::ProcessState`].
//! - [`lock`] provides the named locks that keep executions of the same
//!   key from overlapping.
//! - [`backend`] provides the `CommandExecutor` trait and the production
//!   `ScriptExecutor`, which tests can replace with a fake.

pub mod backend;
pub mod env;
pub mod extract;
pub mod lock;
pub mod runner;
pub mod streams;

pub use backend::{CommandExecutor, ExecuteFuture, ScriptExecutor};
pub use env::{build_environment, merge_overrides};
pub use extract::extract_output;
pub use lock::LockRegistry;
pub use runner::{RunRequest, run_command};
pub use streams::{CapturedOutput, spawn_drain};
