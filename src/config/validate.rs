// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::model::{CommandSettings, ConfigFile, ProviderSection, RawConfigFile};
use crate::errors::{Result, ShellError};
use crate::types::{Interpreter, Phase};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ShellError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.provider, raw.resource, raw.data))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_entries(cfg)?;
    validate_provider(&cfg.provider)?;
    validate_resources(cfg)?;
    validate_data_sources(cfg)?;
    Ok(())
}

fn config_error(msg: String) -> ShellError {
    ShellError::ConfigError(msg)
}

fn ensure_has_entries(cfg: &RawConfigFile) -> Result<()> {
    if cfg.resource.is_empty() && cfg.data.is_empty() {
        return Err(config_error(
            "config must contain at least one [resource.<name>] or [data.<name>] section"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_provider(provider: &ProviderSection) -> Result<()> {
    validate_environment("[provider].environment", &provider.environment)?;
    validate_environment(
        "[provider].sensitive_environment",
        &provider.sensitive_environment,
    )?;
    if let Some(interpreter) = &provider.interpreter {
        validate_interpreter("[provider]", interpreter)?;
    }
    Ok(())
}

fn validate_resources(cfg: &RawConfigFile) -> Result<()> {
    for (name, resource) in cfg.resource.iter() {
        let section = format!("[resource.{name}]");
        let commands = &resource.lifecycle_commands;

        require_command(&section, "create", Some(&commands.create))?;
        require_command(&section, "read", Some(&commands.read))?;
        if commands.update.is_some() {
            require_command(&section, "update", commands.update.as_ref())?;
        }
        if commands.delete.is_some() {
            require_command(&section, "delete", commands.delete.as_ref())?;
        }

        validate_settings(&section, &resource.settings)?;
    }
    Ok(())
}

fn validate_data_sources(cfg: &RawConfigFile) -> Result<()> {
    for (name, data) in cfg.data.iter() {
        let section = format!("[data.{name}]");
        require_command(&section, "read", Some(&data.lifecycle_commands.read))?;
        validate_settings(&section, &data.settings)?;
    }
    Ok(())
}

fn require_command(section: &str, phase: &str, command: Option<&String>) -> Result<()> {
    match command {
        Some(c) if !c.trim().is_empty() => Ok(()),
        _ => Err(config_error(format!(
            "{section} lifecycle_commands.{phase} must be a non-empty command"
        ))),
    }
}

fn validate_settings(section: &str, settings: &CommandSettings) -> Result<()> {
    validate_environment(&format!("{section}.environment"), &settings.environment)?;
    validate_environment(
        &format!("{section}.sensitive_environment"),
        &settings.sensitive_environment,
    )?;

    if let Some(interpreter) = &settings.interpreter {
        validate_interpreter(section, interpreter)?;
    }

    if settings.working_directory.as_os_str().is_empty() {
        return Err(config_error(format!(
            "{section}.working_directory must not be empty"
        )));
    }

    for phase in [Phase::Create, Phase::Read, Phase::Update, Phase::Delete] {
        let timeout = settings
            .timeouts
            .for_phase(phase)
            .map_err(|e| config_error(format!("{section}.timeouts.{phase}: {e}")))?;
        if timeout.is_zero() {
            return Err(config_error(format!(
                "{section}.timeouts.{phase} must be greater than zero"
            )));
        }
    }

    Ok(())
}

fn validate_environment(section: &str, env: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in env.iter() {
        if key.is_empty() {
            return Err(config_error(format!("{section} contains an empty key")));
        }
        if key.contains('=') || key.contains('\0') {
            return Err(config_error(format!(
                "{section} key '{key}' must not contain '=' or NUL"
            )));
        }
        if value.contains('\0') {
            return Err(config_error(format!(
                "{section} value for '{key}' must not contain NUL"
            )));
        }
    }
    Ok(())
}

fn validate_interpreter(section: &str, interpreter: &Interpreter) -> Result<()> {
    if interpreter.shell.trim().is_empty() {
        return Err(config_error(format!(
            "{section}.interpreter.shell must not be empty"
        )));
    }
    Ok(())
}
