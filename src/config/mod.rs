// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Reject unusable configuration before any command runs (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_and_validate};
pub use model::{
    CommandSettings, ConfigFile, DEFAULT_TIMEOUT, DataSourceCommands, DataSourceConfig,
    LifecycleCommands, ProviderSection, RawConfigFile, ResourceConfig, TimeoutsSection,
    parse_duration,
};
