// src/resource/lifecycle.rs

//! Create/read/update/delete handlers for a managed shell resource.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::{LifecycleCommands, ProviderSection, ResourceConfig, TimeoutsSection};
use crate::errors::{Result, ShellError};
use crate::exec::{CommandExecutor, RunRequest};
use crate::resource::new_resource_id;
use crate::state::{ProcessState, ResourceData};
use crate::types::{Interpreter, Phase};

/// One `[resource.<name>]` bound to an executor.
///
/// Handlers only touch `ResourceData` after the command succeeded, so a
/// failed command leaves the stored state as it was.
#[derive(Debug, Clone)]
pub struct ShellResource<E> {
    name: String,
    commands: LifecycleCommands,
    environment: BTreeMap<String, String>,
    working_directory: PathBuf,
    interpreter: Option<Interpreter>,
    timeouts: TimeoutsSection,
    executor: E,
}

impl<E: CommandExecutor> ShellResource<E> {
    pub fn new(
        name: impl Into<String>,
        config: &ResourceConfig,
        provider: &ProviderSection,
        executor: E,
    ) -> Self {
        Self {
            name: name.into(),
            commands: config.lifecycle_commands.clone(),
            environment: config.settings.effective_environment(provider),
            working_directory: config.settings.working_directory.clone(),
            interpreter: config.settings.effective_interpreter(provider),
            timeouts: config.settings.timeouts.clone(),
            executor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dispatch to the handler for `phase`.
    pub async fn apply(&self, phase: Phase, data: &mut ResourceData) -> Result<()> {
        match phase {
            Phase::Create => self.create(data).await,
            Phase::Read => self.read(data).await,
            Phase::Update => self.update(data).await,
            Phase::Delete => self.delete(data).await,
        }
    }

    pub async fn create(&self, data: &mut ResourceData) -> Result<()> {
        let command = self.command(Phase::Create)?;
        match self.run(Phase::Create, command, ProcessState::default()).await? {
            Some(state) => {
                data.output = state.into_output();
                data.id = Some(new_resource_id());
                info!(resource = %self.name, id = ?data.id, "created resource");
            }
            None => {
                debug!(resource = %self.name, "create produced no state; resource has no id");
                data.clear();
            }
        }
        Ok(())
    }

    pub async fn read(&self, data: &mut ResourceData) -> Result<()> {
        let command = self.command(Phase::Read)?;
        match self.run(Phase::Read, command, data.previous_state()).await? {
            Some(state) => {
                data.output = state.into_output();
                if data.id.is_none() {
                    data.id = Some(new_resource_id());
                }
            }
            None => {
                info!(resource = %self.name, "read produced no state; marking resource as deleted");
                data.clear();
            }
        }
        Ok(())
    }

    /// Run `update`, or replace the resource when no update command exists.
    pub async fn update(&self, data: &mut ResourceData) -> Result<()> {
        let Some(command) = self.commands.for_phase(Phase::Update) else {
            info!(resource = %self.name, "no update command; replacing resource");
            self.delete(data).await?;
            return self.create(data).await;
        };

        match self.run(Phase::Update, command, data.previous_state()).await? {
            Some(state) => data.output = state.into_output(),
            None => {
                debug!(resource = %self.name, "update produced no state; clearing output");
                data.output.clear();
            }
        }
        Ok(())
    }

    pub async fn delete(&self, data: &mut ResourceData) -> Result<()> {
        if let Some(command) = self.commands.for_phase(Phase::Delete) {
            let state = self
                .run(Phase::Delete, command, data.previous_state())
                .await?;
            if state.is_some() {
                debug!(resource = %self.name, "ignoring output of delete command");
            }
        } else {
            debug!(resource = %self.name, "no delete command; forgetting state only");
        }

        data.clear();
        info!(resource = %self.name, "deleted resource");
        Ok(())
    }

    fn command(&self, phase: Phase) -> Result<&str> {
        match self.commands.for_phase(phase) {
            Some(c) if !c.trim().is_empty() => Ok(c),
            _ => Err(ShellError::ConfigError(format!(
                "resource '{}' has no {} command",
                self.name, phase
            ))),
        }
    }

    async fn run(
        &self,
        phase: Phase,
        command: &str,
        previous: ProcessState,
    ) -> Result<Option<ProcessState>> {
        let timeout = self.timeouts.for_phase(phase).map_err(|e| {
            ShellError::ConfigError(format!("resource '{}' {phase} timeout: {e}", self.name))
        })?;

        let request = RunRequest::new(phase, command)
            .with_previous(previous)
            .with_environment(self.environment.clone())
            .with_working_directory(self.working_directory.clone())
            .with_interpreter(self.interpreter.clone())
            .with_timeout(Some(timeout));

        self.executor.execute(request).await
    }
}
