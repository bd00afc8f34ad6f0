// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The resource layer talks to a `CommandExecutor` instead of spawning
//! processes itself. Production code uses [`ScriptExecutor`], which holds a
//! named lock for the duration of every run; tests can swap in a fake that
//! records requests and returns canned states.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::exec::lock::LockRegistry;
use crate::exec::runner::{RunRequest, run_command};
use crate::state::ProcessState;

/// Boxed future returned by [`CommandExecutor::execute`].
pub type ExecuteFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<ProcessState>>> + Send + 'a>>;

/// Trait abstracting how a lifecycle command is executed.
pub trait CommandExecutor: Send + Sync {
    /// Run one command. `Ok(None)` means the command produced no state.
    fn execute(&self, request: RunRequest) -> ExecuteFuture<'_>;
}

/// Real executor: serializes on `lock_key`, then runs the command.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    locks: Arc<LockRegistry>,
    lock_key: String,
}

impl ScriptExecutor {
    pub fn new(locks: Arc<LockRegistry>, lock_key: impl Into<String>) -> Self {
        Self {
            locks,
            lock_key: lock_key.into(),
        }
    }

    pub fn lock_key(&self) -> &str {
        &self.lock_key
    }
}

impl CommandExecutor for ScriptExecutor {
    fn execute(&self, request: RunRequest) -> ExecuteFuture<'_> {
        Box::pin(async move {
            let guard = self.locks.lock(&self.lock_key).await;
            debug!(lock_key = %guard.key(), phase = %request.phase, "holding execution lock");
            run_command(&request).await
        })
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for Arc<E> {
    fn execute(&self, request: RunRequest) -> ExecuteFuture<'_> {
        (**self).execute(request)
    }
}
