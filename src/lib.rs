// src/lib.rs

pub mod apply;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod resource;
pub mod state;
pub mod store;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::apply::apply_phase;
use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::exec::LockRegistry;
use crate::resource::Provider;
use crate::store::StateFile;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the persisted state file
/// - the provider with its shared lock registry
/// - one lifecycle phase over the selected resources
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let state_path = PathBuf::from(&args.state);
    let mut store = StateFile::load(&state_path)
        .with_context(|| format!("loading state {}", state_path.display()))?;

    let provider = Provider::new(cfg, Arc::new(LockRegistry::new()));

    info!(phase = %args.phase, resource = ?args.resource, "applying lifecycle phase");
    let report = apply_phase(&provider, &mut store, args.phase, args.resource.as_deref()).await?;

    // Persist whatever completed, even if something failed.
    store
        .save(&state_path)
        .with_context(|| format!("writing state {}", state_path.display()))?;
    println!("{}", serde_json::to_string_pretty(&store)?);

    info!(
        succeeded = report.succeeded.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "phase complete"
    );
    report.into_result()
}

/// Print resolved resources without running anything. Sensitive
/// environment values are never printed.
fn print_dry_run(cfg: &ConfigFile) {
    println!("shellstate dry-run");
    println!(
        "  provider.enable_parallelism = {}",
        cfg.provider.enable_parallelism
    );
    println!();

    println!("resources ({}):", cfg.resource.len());
    for (name, resource) in cfg.resource.iter() {
        let commands = &resource.lifecycle_commands;
        println!("  - {name}");
        println!("      create: {}", commands.create);
        println!("      read: {}", commands.read);
        if let Some(ref update) = commands.update {
            println!("      update: {update}");
        }
        if let Some(ref delete) = commands.delete {
            println!("      delete: {delete}");
        }
        print_settings(&resource.settings, cfg);
    }

    if !cfg.data.is_empty() {
        println!("data sources ({}):", cfg.data.len());
        for (name, data) in cfg.data.iter() {
            println!("  - {name}");
            println!("      read: {}", data.lifecycle_commands.read);
            print_settings(&data.settings, cfg);
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_settings(settings: &config::CommandSettings, cfg: &ConfigFile) {
    println!(
        "      working_directory: {}",
        settings.working_directory.display()
    );
    if let Some(interpreter) = settings.effective_interpreter(&cfg.provider) {
        println!("      interpreter: {interpreter}");
    }
    let plain = exec::merge_overrides([&cfg.provider.environment, &settings.environment]);
    if !plain.is_empty() {
        println!("      environment: {:?}", plain.keys().collect::<Vec<_>>());
    }
}
