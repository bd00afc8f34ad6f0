// src/resource/mod.rs

//! Resource and data-source layer on top of the execution engine.
//!
//! This is the thin adapter a host (here: the CLI) calls per lifecycle
//! phase. It maps configuration onto [`crate::exec::RunRequest`]s and maps
//! the returned state back onto the persisted [`crate::state::ResourceData`],
//! assigning or clearing identifiers.

pub mod data_source;
pub mod lifecycle;

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::{CommandExecutor, LockRegistry, ScriptExecutor};

pub use data_source::ShellDataSource;
pub use lifecycle::ShellResource;

/// Lock key shared by every shell script execution unless parallelism is enabled.
pub const SHELL_SCRIPT_LOCK_KEY: &str = "shell_script";

/// Fresh opaque identifier for a created or read resource.
pub fn new_resource_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Makes the executor for one lock key.
pub type ExecutorFactory = Arc<dyn Fn(&str) -> Arc<dyn CommandExecutor> + Send + Sync>;

/// Builds resources and data sources that share one lock registry.
#[derive(Clone)]
pub struct Provider {
    config: ConfigFile,
    executors: ExecutorFactory,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Provider {
    /// Provider whose executors run real commands, serialized through `locks`.
    pub fn new(config: ConfigFile, locks: Arc<LockRegistry>) -> Self {
        let executors: ExecutorFactory = Arc::new(move |key: &str| {
            Arc::new(ScriptExecutor::new(Arc::clone(&locks), key)) as Arc<dyn CommandExecutor>
        });
        Self::with_executors(config, executors)
    }

    /// Provider with a custom executor per lock key.
    pub fn with_executors(config: ConfigFile, executors: ExecutorFactory) -> Self {
        Self { config, executors }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Lock key for `[resource.<name>]`.
    pub fn resource_lock_key(&self, name: &str) -> String {
        self.lock_key("resource", name)
    }

    /// Lock key for `[data.<name>]`.
    pub fn data_lock_key(&self, name: &str) -> String {
        self.lock_key("data", name)
    }

    fn lock_key(&self, kind: &str, name: &str) -> String {
        if self.config.provider.enable_parallelism {
            format!("{SHELL_SCRIPT_LOCK_KEY}.{kind}.{name}")
        } else {
            SHELL_SCRIPT_LOCK_KEY.to_string()
        }
    }

    pub fn resource(&self, name: &str) -> Option<ShellResource<Arc<dyn CommandExecutor>>> {
        let config = self.config.resource.get(name)?;
        let executor = (self.executors)(&self.resource_lock_key(name));
        Some(ShellResource::new(
            name,
            config,
            &self.config.provider,
            executor,
        ))
    }

    pub fn data_source(
        &self,
        name: &str,
    ) -> Option<Result<ShellDataSource<Arc<dyn CommandExecutor>>>> {
        let config = self.config.data.get(name)?;
        let executor = (self.executors)(&self.data_lock_key(name));
        Some(ShellDataSource::new(
            name,
            config,
            &self.config.provider,
            executor,
        ))
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.config.resource.keys().map(String::as_str)
    }

    pub fn data_source_names(&self) -> impl Iterator<Item = &str> {
        self.config.data.keys().map(String::as_str)
    }
}
