// tests/stream_logging.rs
//
// Installs its own thread-local subscriber, so it lives apart from the tests
// that share the global `init_tracing` subscriber.

mod common;
use crate::common::{TestResult, with_timeout};

use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt;

use shellstate::exec::spawn_drain;

/// Shared buffer the fmt subscriber writes into.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| l.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// True if `line` carries the `stream` field set to `stream`.
fn logged_from(line: &str, stream: &str) -> bool {
    line.contains(&format!("stream=\"{stream}\"")) || line.contains(&format!("stream={stream}"))
}

/// `#[tokio::test]` runs on a current-thread runtime, so spawned tasks
/// see this thread-local subscriber too.
fn capture_debug_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[tokio::test]
async fn test_stderr_lines_are_logged_but_not_returned_as_stdout() -> TestResult {
    let (logs, _guard) = capture_debug_logs();

    let stdout = Cursor::new(b"progress 1\n{\"ok\":\"yes\"}\n".to_vec());
    let stderr = Cursor::new(b"warning: disk almost full\n".to_vec());

    let captured = with_timeout(spawn_drain(stdout, stderr, "drain-logging").join()).await?;

    assert!(!captured.stdout.contains("disk almost full"));
    assert!(captured.stderr.contains("disk almost full"));

    let logged = logs.lines_containing("warning: disk almost full");
    assert_eq!(logged.len(), 1, "logs were: {}", logs.contents());
    assert!(logged_from(&logged[0], "stderr"), "{}", logged[0]);
    assert!(logged[0].contains("drain-logging"));

    let logged = logs.lines_containing("progress 1");
    assert_eq!(logged.len(), 1, "logs were: {}", logs.contents());
    assert!(logged_from(&logged[0], "stdout"), "{}", logged[0]);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_child_stderr_reaches_the_log_only() -> TestResult {
    use shellstate::exec::{RunRequest, run_command};
    use shellstate::types::Phase;

    let (logs, _guard) = capture_debug_logs();

    let request = RunRequest::new(Phase::Read, r#"echo '{"only":"stderr"}' >&2"#);
    let state = with_timeout(run_command(&request)).await?;
    assert!(state.is_none());

    let logged = logs.lines_containing(r#"{"only":"stderr"}"#);
    assert!(
        logged.iter().any(|l| logged_from(l, "stderr")),
        "logs were: {}",
        logs.contents()
    );
    Ok(())
}
