// src/exec/streams.rs

//! Concurrent draining of a child's stdout and stderr.
//!
//! Each stream is read line by line by its own Tokio task, and every line
//! is forwarded to a third task that writes it to the log as it arrives.
//! Reading starts as soon as [`spawn_drain`] is called, i.e. before the
//! caller waits on the child, so a chatty child can never block on a full
//! pipe.
//!
//! Only stdout is returned for extraction. Stderr is logged and a short
//! tail is kept for error messages.

use std::collections::VecDeque;
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::debug;

/// Stdout kept for extraction. The oldest lines go first; the trailing
/// JSON object always survives.
pub const MAX_STDOUT_BYTES: usize = 16 * 1024 * 1024;

/// Stderr kept for diagnostics.
pub const MAX_STDERR_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl StreamSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamSource::Stdout => "stdout",
            StreamSource::Stderr => "stderr",
        }
    }
}

/// Text collected from both streams once they reached EOF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    /// All stdout lines in the order the child wrote them, joined by `\n`.
    pub stdout: String,
    /// Tail of stderr, joined by `\n`.
    pub stderr: String,
}

#[derive(Debug)]
struct LogLine {
    source: StreamSource,
    line: String,
}

/// Handles to the running reader and logger tasks.
#[derive(Debug)]
pub struct StreamDrain {
    stdout: JoinHandle<io::Result<String>>,
    stderr: JoinHandle<io::Result<String>>,
    logger: JoinHandle<()>,
}

/// Start draining `stdout` and `stderr` in the background.
///
/// `label` identifies the command in log lines.
pub fn spawn_drain<O, E>(stdout: O, stderr: E, label: impl Into<String>) -> StreamDrain
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<LogLine>();

    let logger = tokio::spawn(log_lines(label.into(), rx));
    let stdout = tokio::spawn(read_lines(
        stdout,
        StreamSource::Stdout,
        MAX_STDOUT_BYTES,
        tx.clone(),
    ));
    let stderr = tokio::spawn(read_lines(
        stderr,
        StreamSource::Stderr,
        MAX_STDERR_BYTES,
        tx,
    ));

    StreamDrain {
        stdout,
        stderr,
        logger,
    }
}

impl StreamDrain {
    /// Handles that stop all three tasks, dropping our ends of the pipes.
    ///
    /// Used on timeout: a grandchild may still hold the write ends open, so
    /// waiting for EOF is not an option.
    pub fn abort_handles(&self) -> Vec<AbortHandle> {
        vec![
            self.stdout.abort_handle(),
            self.stderr.abort_handle(),
            self.logger.abort_handle(),
        ]
    }

    /// Wait until both streams hit EOF and every line has been logged.
    pub async fn join(self) -> io::Result<CapturedOutput> {
        let stdout = task_result(self.stdout.await)?;
        let stderr = task_result(self.stderr.await)?;

        // Both senders are gone now, so the logger drains and exits.
        if let Err(e) = self.logger.await {
            debug!(error = %e, "stream logger task ended abnormally");
        }

        Ok(CapturedOutput { stdout, stderr })
    }
}

fn task_result(res: Result<io::Result<String>, JoinError>) -> io::Result<String> {
    match res {
        Ok(inner) => inner,
        Err(e) => Err(io::Error::other(e)),
    }
}

async fn read_lines<R>(
    reader: R,
    source: StreamSource,
    limit: usize,
    tx: mpsc::UnboundedSender<LogLine>,
) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut tail = TailBuffer::new(limit);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        // Lossy: binary noise must not abort the read.
        let line = String::from_utf8_lossy(&buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();

        // The logger only stops early when aborted; losing a log line then is fine.
        let _ = tx.send(LogLine {
            source,
            line: line.clone(),
        });
        tail.push(line);
    }

    if tail.dropped > 0 {
        debug!(
            stream = source.as_str(),
            dropped_lines = tail.dropped,
            limit,
            "output exceeded retention limit; oldest lines dropped"
        );
    }

    Ok(tail.into_string())
}

async fn log_lines(label: String, mut rx: mpsc::UnboundedReceiver<LogLine>) {
    while let Some(LogLine { source, line }) = rx.recv().await {
        debug!(command = %label, stream = source.as_str(), "{}", line);
    }
}

/// Line buffer that keeps the most recent lines within a byte budget.
#[derive(Debug)]
struct TailBuffer {
    lines: VecDeque<String>,
    bytes: usize,
    limit: usize,
    dropped: usize,
}

impl TailBuffer {
    fn new(limit: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            bytes: 0,
            limit,
            dropped: 0,
        }
    }

    fn push(&mut self, line: String) {
        self.bytes += line.len() + 1;
        self.lines.push_back(line);

        // The newest line is always kept, even if it alone exceeds the limit.
        while self.bytes > self.limit && self.lines.len() > 1 {
            if let Some(old) = self.lines.pop_front() {
                self.bytes -= old.len() + 1;
                self.dropped += 1;
            }
        }
    }

    fn into_string(self) -> String {
        Vec::from(self.lines).join("\n")
    }
}
