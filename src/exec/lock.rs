// src/exec/lock.rs

//! Named locks serializing command executions.
//!
//! A `LockRegistry` maps a logical key (usually a resource type) to an
//! async mutex. Holders of the same key run strictly one after another;
//! different keys do not contend. The registry is an ordinary value that
//! callers create and share (via `Arc`), not a process-wide static.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Exclusive hold on one key; released on drop.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    _guard: OwnedMutexGuard<()>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        trace!(lock_key = %self.key, "released lock");
    }
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// Wait until `key` is free and take it.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        trace!(lock_key = %key, "waiting for lock");
        let guard = self.entry(key).lock_owned().await;
        trace!(lock_key = %key, "acquired lock");
        KeyGuard {
            key: key.to_string(),
            _guard: guard,
        }
    }

    /// Run `body` while holding `key`.
    ///
    /// The lock is released however `body` ends: normal completion, an
    /// `Err` result, a panic, or the returned future being dropped.
    pub async fn with_lock<F, T>(&self, key: &str, body: F) -> T
    where
        F: Future<Output = T>,
    {
        let _guard = self.lock(key).await;
        body.await
    }

    /// Number of keys ever locked through this registry.
    pub fn key_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
