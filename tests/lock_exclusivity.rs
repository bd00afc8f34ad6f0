// tests/lock_exclusivity.rs

mod common;
use crate::common::{TestResult, init_tracing, with_timeout};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Barrier;

use shellstate::exec::LockRegistry;

#[tokio::test]
async fn test_same_key_never_overlaps() -> TestResult {
    init_tracing();

    let locks = Arc::new(LockRegistry::new());
    let active = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let locks = Arc::clone(&locks);
        let active = Arc::clone(&active);
        let max_seen = Arc::clone(&max_seen);
        handles.push(tokio::spawn(async move {
            locks
                .with_lock("shell_script", async {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .await;
        }));
    }

    for h in handles {
        with_timeout(h).await?;
    }

    assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    assert_eq!(locks.key_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_different_keys_do_not_contend() -> TestResult {
    init_tracing();

    let locks = Arc::new(LockRegistry::new());
    // Both bodies must be inside their lock at the same time to pass the barrier.
    let barrier = Arc::new(Barrier::new(2));

    let mut handles = Vec::new();
    for key in ["shell_script.resource.a", "shell_script.resource.b"] {
        let locks = Arc::clone(&locks);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            locks
                .with_lock(key, async {
                    barrier.wait().await;
                })
                .await;
        }));
    }

    for h in handles {
        with_timeout(h).await?;
    }
    assert_eq!(locks.key_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_lock_released_when_body_fails() -> TestResult {
    init_tracing();

    let locks = LockRegistry::new();
    let res: Result<(), &str> = locks.with_lock("k", async { Err("command failed") }).await;
    assert!(res.is_err());

    let guard = with_timeout(locks.lock("k")).await;
    assert_eq!(guard.key(), "k");
    Ok(())
}

#[tokio::test]
async fn test_lock_released_when_holder_is_cancelled() -> TestResult {
    init_tracing();

    let locks = Arc::new(LockRegistry::new());
    let held = Arc::new(Barrier::new(2));

    let holder = {
        let locks = Arc::clone(&locks);
        let held = Arc::clone(&held);
        tokio::spawn(async move {
            locks
                .with_lock("k", async {
                    held.wait().await;
                    std::future::pending::<()>().await;
                })
                .await;
        })
    };

    held.wait().await;
    holder.abort();
    let _ = holder.await;

    let _guard = with_timeout(locks.lock("k")).await;
    Ok(())
}

#[tokio::test]
async fn test_lock_released_when_body_panics() -> TestResult {
    init_tracing();

    let locks = Arc::new(LockRegistry::new());

    let panicking = {
        let locks = Arc::clone(&locks);
        tokio::spawn(async move {
            locks
                .with_lock("k", async {
                    if locks.key_count() > 0 {
                        panic!("body panicked");
                    }
                })
                .await;
        })
    };
    assert!(panicking.await.is_err());

    let _guard = with_timeout(locks.lock("k")).await;
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_script_executions_with_same_key_do_not_overlap() -> TestResult {
    use shellstate::exec::{CommandExecutor, RunRequest, ScriptExecutor};
    use shellstate::types::Phase;

    init_tracing();

    let dir = tempfile::tempdir()?;
    let log = dir.path().join("markers.log");
    let locks = Arc::new(LockRegistry::new());

    let mut handles = Vec::new();
    for id in ["a", "b", "c"] {
        let executor = ScriptExecutor::new(Arc::clone(&locks), "shell_script");
        let command = format!(
            "echo start-{id} >> '{log}'; sleep 0.2; echo end-{id} >> '{log}'",
            log = log.display()
        );
        handles.push(tokio::spawn(async move {
            executor.execute(RunRequest::new(Phase::Create, command)).await
        }));
    }

    for h in handles {
        assert!(with_timeout(h).await??.is_none());
    }

    let contents = std::fs::read_to_string(&log)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 6);
    for pair in lines.chunks(2) {
        let started = pair[0].strip_prefix("start-").expect("start marker");
        let ended = pair[1].strip_prefix("end-").expect("end marker");
        assert_eq!(started, ended, "executions overlapped: {lines:?}");
    }
    Ok(())
}
