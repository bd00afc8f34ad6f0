// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::env::merge_overrides;
use crate::types::{Interpreter, Phase};

/// Timeout applied to a phase when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [provider]
/// environment = { REGION = "eu-west-1" }
///
/// [resource.web]
/// working_directory = "scripts"
/// [resource.web.lifecycle_commands]
/// create = "./create.sh"
/// read = "./read.sh"
/// delete = "./delete.sh"
///
/// [data.whoami]
/// lifecycle_commands = { read = "echo '{\"user\": \"'$USER'\"}'" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub provider: ProviderSection,

    /// Managed resources from `[resource.<name>]`.
    #[serde(default)]
    pub resource: BTreeMap<String, ResourceConfig>,

    /// Read-only data sources from `[data.<name>]`.
    #[serde(default)]
    pub data: BTreeMap<String, DataSourceConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub provider: ProviderSection,
    pub resource: BTreeMap<String, ResourceConfig>,
    pub data: BTreeMap<String, DataSourceConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        provider: ProviderSection,
        resource: BTreeMap<String, ResourceConfig>,
        data: BTreeMap<String, DataSourceConfig>,
    ) -> Self {
        Self {
            provider,
            resource,
            data,
        }
    }
}

/// `[provider]` section: defaults shared by every resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSection {
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    /// Same as `environment`, but never printed by `--dry-run`.
    #[serde(default)]
    pub sensitive_environment: BTreeMap<String, String>,

    #[serde(default)]
    pub interpreter: Option<Interpreter>,

    /// When true, each resource gets its own lock key, so different
    /// resources may run at the same time.
    #[serde(default)]
    pub enable_parallelism: bool,
}

/// Settings common to resources and data sources.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSettings {
    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    #[serde(default)]
    pub sensitive_environment: BTreeMap<String, String>,

    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,

    #[serde(default)]
    pub interpreter: Option<Interpreter>,

    #[serde(default)]
    pub timeouts: TimeoutsSection,
}

fn default_working_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            environment: BTreeMap::new(),
            sensitive_environment: BTreeMap::new(),
            working_directory: default_working_directory(),
            interpreter: None,
            timeouts: TimeoutsSection::default(),
        }
    }
}

impl CommandSettings {
    /// Override set handed to the environment builder.
    ///
    /// Right-biased: provider `environment`, provider
    /// `sensitive_environment`, then the same two maps of this entry; a key
    /// set in a later map wins.
    pub fn effective_environment(&self, provider: &ProviderSection) -> BTreeMap<String, String> {
        merge_overrides([
            &provider.environment,
            &provider.sensitive_environment,
            &self.environment,
            &self.sensitive_environment,
        ])
    }

    /// Entry interpreter, else provider interpreter, else `None` (platform default).
    pub fn effective_interpreter(&self, provider: &ProviderSection) -> Option<Interpreter> {
        self.interpreter
            .clone()
            .or_else(|| provider.interpreter.clone())
    }
}

/// `lifecycle_commands` of a resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LifecycleCommands {
    #[serde(default)]
    pub create: String,

    #[serde(default)]
    pub read: String,

    /// Without it an update replaces the resource (delete, then create).
    #[serde(default)]
    pub update: Option<String>,

    /// Without it a delete only forgets the stored state.
    #[serde(default)]
    pub delete: Option<String>,
}

impl LifecycleCommands {
    pub fn for_phase(&self, phase: Phase) -> Option<&str> {
        match phase {
            Phase::Create => Some(self.create.as_str()),
            Phase::Read => Some(self.read.as_str()),
            Phase::Update => self.update.as_deref(),
            Phase::Delete => self.delete.as_deref(),
        }
    }
}

/// `[resource.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    pub lifecycle_commands: LifecycleCommands,

    #[serde(flatten)]
    pub settings: CommandSettings,
}

/// `lifecycle_commands` of a data source: only `read` is meaningful.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataSourceCommands {
    #[serde(default)]
    pub read: String,
}

/// `[data.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    pub lifecycle_commands: DataSourceCommands,

    #[serde(flatten)]
    pub settings: CommandSettings,
}

/// `timeouts` table: one duration string per phase (`"30s"`, `"2m"`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeoutsSection {
    #[serde(default)]
    pub create: Option<String>,
    #[serde(default)]
    pub read: Option<String>,
    #[serde(default)]
    pub update: Option<String>,
    #[serde(default)]
    pub delete: Option<String>,
}

impl TimeoutsSection {
    fn raw(&self, phase: Phase) -> Option<&str> {
        match phase {
            Phase::Create => self.create.as_deref(),
            Phase::Read => self.read.as_deref(),
            Phase::Update => self.update.as_deref(),
            Phase::Delete => self.delete.as_deref(),
        }
    }

    /// Configured timeout for `phase`, or [`DEFAULT_TIMEOUT`].
    pub fn for_phase(&self, phase: Phase) -> Result<Duration, String> {
        match self.raw(phase) {
            Some(s) => parse_duration(s),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }
}

/// Parse `"<n>ms"`, `"<n>s"`, `"<n>m"` or `"<n>h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

    let secs_per_unit = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
