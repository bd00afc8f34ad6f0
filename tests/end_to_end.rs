// tests/end_to_end.rs

#![cfg(unix)]

mod common;
use crate::common::builders::{ConfigFileBuilder, DataSourceConfigBuilder, ResourceConfigBuilder};
use crate::common::{TestResult, init_tracing, with_timeout};

use std::sync::Arc;

use shellstate::apply::apply_phase;
use shellstate::config::ConfigFile;
use shellstate::errors::ShellError;
use shellstate::exec::LockRegistry;
use shellstate::resource::{Provider, SHELL_SCRIPT_LOCK_KEY};
use shellstate::store::StateFile;
use shellstate::types::Phase;

fn provider(cfg: ConfigFile) -> Provider {
    Provider::new(cfg, Arc::new(LockRegistry::new()))
}

#[tokio::test]
async fn test_create_then_delete_scenario() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_resource(
            "x",
            ResourceConfigBuilder::new(r#"echo '{"x":"1"}'"#, "cat")
                .delete("exit 0")
                .build(),
        )
        .build();
    let provider = provider(cfg);
    let mut store = StateFile::default();

    let report = with_timeout(apply_phase(&provider, &mut store, Phase::Create, None)).await?;
    assert_eq!(report.succeeded, vec!["x".to_string()]);
    let created = store.resource("x");
    assert!(created.id.is_some());
    assert_eq!(created.output.get("x").map(String::as_str), Some("1"));

    // read echoes the stored state back through stdin
    let report = with_timeout(apply_phase(&provider, &mut store, Phase::Read, None)).await?;
    assert!(report.failed.is_empty());
    assert_eq!(store.resource("x"), created);

    let report = with_timeout(apply_phase(&provider, &mut store, Phase::Delete, None)).await?;
    assert!(report.failed.is_empty());
    assert!(!store.resource("x").exists());
    assert!(store.resources.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_skips_existing_and_read_drops_vanished() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("exists");
    let cfg = ConfigFileBuilder::new()
        .with_resource(
            "file",
            ResourceConfigBuilder::new(
                r#"touch exists && echo '{"path":"exists"}'"#,
                r#"test -f exists && echo '{"path":"exists"}' || true"#,
            )
            .working_directory(dir.path())
            .build(),
        )
        .build();
    let provider = provider(cfg);
    let mut store = StateFile::default();

    with_timeout(apply_phase(&provider, &mut store, Phase::Create, None)).await?;
    assert!(marker.exists());
    let id = store.resource("file").id;

    let report = with_timeout(apply_phase(&provider, &mut store, Phase::Create, None)).await?;
    assert_eq!(report.skipped, vec!["file".to_string()]);
    assert_eq!(store.resource("file").id, id);

    std::fs::remove_file(&marker)?;
    with_timeout(apply_phase(&provider, &mut store, Phase::Read, None)).await?;
    assert!(!store.resource("file").exists());
    Ok(())
}

#[tokio::test]
async fn test_failure_is_reported_and_other_resources_still_persist() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_resource(
            "good",
            ResourceConfigBuilder::new(r#"echo '{"ok":"true"}'"#, "cat").build(),
        )
        .with_resource(
            "bad",
            ResourceConfigBuilder::new("echo nope >&2; exit 2", "cat").build(),
        )
        .build();
    let provider = provider(cfg);
    let mut store = StateFile::default();

    let report = with_timeout(apply_phase(&provider, &mut store, Phase::Create, None)).await?;
    assert_eq!(report.succeeded, vec!["good".to_string()]);
    assert_eq!(report.failed.len(), 1);
    let (name, err) = &report.failed[0];
    assert_eq!(name, "bad");
    assert!(matches!(err, ShellError::ExecutionError { code: Some(2), .. }));

    assert!(store.resource("good").exists());
    assert!(!store.resource("bad").exists());

    let err = report.into_result().expect_err("failure must surface");
    assert!(format!("{err:#}").contains("nope"));
    Ok(())
}

#[tokio::test]
async fn test_read_phase_reads_data_sources() -> TestResult {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .with_data(
            "who",
            DataSourceConfigBuilder::new(r#"printf '{"name":"%s"}' "$WHO""#)
                .env("WHO", "operator")
                .build(),
        )
        .build();
    let provider = provider(cfg);
    let mut store = StateFile::default();

    with_timeout(apply_phase(&provider, &mut store, Phase::Read, None)).await?;
    let who = &store.data["who"];
    assert!(who.id.is_some());
    assert_eq!(who.output["name"], "operator");
    Ok(())
}

#[tokio::test]
async fn test_unknown_resource_filter_is_rejected() -> TestResult {
    let cfg = ConfigFileBuilder::new()
        .with_resource("x", ResourceConfigBuilder::new("true", "true").build())
        .build();
    let provider = provider(cfg);
    let mut store = StateFile::default();

    let res = apply_phase(&provider, &mut store, Phase::Create, Some("y")).await;
    assert!(res.is_err());
    Ok(())
}

#[test]
fn test_lock_keys_follow_parallelism_setting() {
    let shared = provider(
        ConfigFileBuilder::new()
            .with_resource("a", ResourceConfigBuilder::new("true", "true").build())
            .build(),
    );
    assert_eq!(shared.resource_lock_key("a"), SHELL_SCRIPT_LOCK_KEY);
    assert_eq!(shared.data_lock_key("b"), SHELL_SCRIPT_LOCK_KEY);

    let parallel = provider(
        ConfigFileBuilder::new()
            .enable_parallelism(true)
            .with_resource("a", ResourceConfigBuilder::new("true", "true").build())
            .build(),
    );
    assert_eq!(parallel.resource_lock_key("a"), "shell_script.resource.a");
    assert_eq!(parallel.data_lock_key("a"), "shell_script.data.a");
}

#[test]
fn test_state_file_round_trip_and_missing_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.json");

    let empty = StateFile::load(&path)?;
    assert_eq!(empty, StateFile::default());

    let mut store = StateFile::default();
    let mut data = store.resource("web");
    data.id = Some("abc".to_string());
    data.output.insert("k".to_string(), "v".to_string());
    store.put_resource("web", data);
    store.save(&path)?;

    assert_eq!(StateFile::load(&path)?, store);
    Ok(())
}

#[test]
fn test_newer_state_file_version_is_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.json");
    std::fs::write(&path, r#"{"version": 99, "resources": {}}"#)?;

    match StateFile::load(&path) {
        Err(ShellError::ConfigError(msg)) => assert!(msg.contains("version 99")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
    Ok(())
}
