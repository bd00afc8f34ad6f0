#![allow(dead_code)]

use std::path::PathBuf;

use shellstate::config::{
    CommandSettings, ConfigFile, DataSourceCommands, DataSourceConfig, LifecycleCommands,
    ProviderSection, RawConfigFile, ResourceConfig,
};
use shellstate::types::{Interpreter, Phase};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_resource(mut self, name: &str, resource: ResourceConfig) -> Self {
        self.config.resource.insert(name.to_string(), resource);
        self
    }

    pub fn with_data(mut self, name: &str, data: DataSourceConfig) -> Self {
        self.config.data.insert(name.to_string(), data);
        self
    }

    pub fn with_provider_env(mut self, key: &str, value: &str) -> Self {
        self.config
            .provider
            .environment
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_provider_interpreter(mut self, shell: &str, flag: &str) -> Self {
        self.config.provider.interpreter = Some(Interpreter::new(shell, flag));
        self
    }

    pub fn enable_parallelism(mut self, val: bool) -> Self {
        self.config.provider.enable_parallelism = val;
        self
    }

    pub fn provider(&self) -> &ProviderSection {
        &self.config.provider
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ResourceConfig`.
pub struct ResourceConfigBuilder {
    resource: ResourceConfig,
}

impl ResourceConfigBuilder {
    pub fn new(create: &str, read: &str) -> Self {
        Self {
            resource: ResourceConfig {
                lifecycle_commands: LifecycleCommands {
                    create: create.to_string(),
                    read: read.to_string(),
                    update: None,
                    delete: None,
                },
                settings: CommandSettings::default(),
            },
        }
    }

    pub fn update(mut self, cmd: &str) -> Self {
        self.resource.lifecycle_commands.update = Some(cmd.to_string());
        self
    }

    pub fn delete(mut self, cmd: &str) -> Self {
        self.resource.lifecycle_commands.delete = Some(cmd.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.resource
            .settings
            .environment
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn sensitive_env(mut self, key: &str, value: &str) -> Self {
        self.resource
            .settings
            .sensitive_environment
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource.settings.working_directory = dir.into();
        self
    }

    pub fn interpreter(mut self, shell: &str, flag: &str) -> Self {
        self.resource.settings.interpreter = Some(Interpreter::new(shell, flag));
        self
    }

    pub fn timeout(mut self, phase: Phase, duration: &str) -> Self {
        let timeouts = &mut self.resource.settings.timeouts;
        let slot = match phase {
            Phase::Create => &mut timeouts.create,
            Phase::Read => &mut timeouts.read,
            Phase::Update => &mut timeouts.update,
            Phase::Delete => &mut timeouts.delete,
        };
        *slot = Some(duration.to_string());
        self
    }

    pub fn build(self) -> ResourceConfig {
        self.resource
    }
}

/// Builder for `DataSourceConfig`.
pub struct DataSourceConfigBuilder {
    data: DataSourceConfig,
}

impl DataSourceConfigBuilder {
    pub fn new(read: &str) -> Self {
        Self {
            data: DataSourceConfig {
                lifecycle_commands: DataSourceCommands {
                    read: read.to_string(),
                },
                settings: CommandSettings::default(),
            },
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.data
            .settings
            .environment
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data.settings.working_directory = dir.into();
        self
    }

    pub fn build(self) -> DataSourceConfig {
        self.data
    }
}
