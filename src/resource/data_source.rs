// src/resource/data_source.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::config::{DataSourceConfig, ProviderSection};
use crate::errors::{Result, ShellError};
use crate::exec::{CommandExecutor, RunRequest};
use crate::resource::new_resource_id;
use crate::state::{ProcessState, ResourceData};
use crate::types::{Interpreter, Phase};

/// Read-only counterpart of [`crate::resource::ShellResource`].
///
/// Every read starts from an empty previous state and yields a fresh id.
#[derive(Debug, Clone)]
pub struct ShellDataSource<E> {
    name: String,
    command: String,
    environment: BTreeMap<String, String>,
    working_directory: PathBuf,
    interpreter: Option<Interpreter>,
    timeout: Duration,
    executor: E,
}

impl<E: CommandExecutor> ShellDataSource<E> {
    pub fn new(
        name: impl Into<String>,
        config: &DataSourceConfig,
        provider: &ProviderSection,
        executor: E,
    ) -> Result<Self> {
        let name = name.into();
        let timeout = config
            .settings
            .timeouts
            .for_phase(Phase::Read)
            .map_err(|e| ShellError::ConfigError(format!("data source '{name}' read timeout: {e}")))?;

        Ok(Self {
            command: config.lifecycle_commands.read.clone(),
            environment: config.settings.effective_environment(provider),
            working_directory: config.settings.working_directory.clone(),
            interpreter: config.settings.effective_interpreter(provider),
            timeout,
            executor,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let request = RunRequest::new(Phase::Read, self.command.clone())
            .with_previous(ProcessState::default())
            .with_environment(self.environment.clone())
            .with_working_directory(self.working_directory.clone())
            .with_interpreter(self.interpreter.clone())
            .with_timeout(Some(self.timeout));

        match self.executor.execute(request).await? {
            Some(state) => {
                data.output = state.into_output();
                data.id = Some(new_resource_id());
            }
            None => {
                info!(data_source = %self.name, "read produced no state; clearing id");
                data.clear();
            }
        }
        Ok(())
    }
}
