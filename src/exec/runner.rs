// src/exec/runner.rs

//! Run a single lifecycle command and build the resulting state.

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tracing::{debug, info, warn};

use crate::errors::{Result, ShellError};
use crate::exec::env::{build_environment, split_entry};
use crate::exec::extract::extract_output;
use crate::exec::streams::{MAX_STDERR_BYTES, spawn_drain};
use crate::state::ProcessState;
use crate::types::{Interpreter, Phase};

/// Everything needed to execute one command.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub phase: Phase,
    pub command: String,
    /// State whose `output` is written to the child's stdin as JSON.
    pub previous: ProcessState,
    /// Overrides layered on top of the ambient environment.
    pub environment: BTreeMap<String, String>,
    pub working_directory: PathBuf,
    /// `None` means the platform default (`/bin/sh -c` or `cmd /C`).
    pub interpreter: Option<Interpreter>,
    /// Upper bound for the whole execution; on expiry the child is killed.
    pub timeout: Option<Duration>,
}

impl RunRequest {
    pub fn new(phase: Phase, command: impl Into<String>) -> Self {
        Self {
            phase,
            command: command.into(),
            previous: ProcessState::default(),
            environment: BTreeMap::new(),
            working_directory: PathBuf::from("."),
            interpreter: None,
            timeout: None,
        }
    }

    pub fn with_previous(mut self, previous: ProcessState) -> Self {
        self.previous = previous;
        self
    }

    pub fn with_environment(mut self, environment: BTreeMap<String, String>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    pub fn with_interpreter(mut self, interpreter: Option<Interpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Execute `request.command` and extract the new state from its stdout.
///
/// - `Ok(Some(state))`: exit code zero and a JSON object was printed.
/// - `Ok(None)`: exit code zero but no JSON object (absent state).
/// - `Err(..)`: launch failure, non-zero exit, or timeout.
pub async fn run_command(request: &RunRequest) -> Result<Option<ProcessState>> {
    if request.command.trim().is_empty() {
        return Err(ShellError::ConfigError(format!(
            "{} command is empty",
            request.phase
        )));
    }

    let interpreter = request.interpreter.clone().unwrap_or_default();
    let environment = build_environment(&request.environment);
    let input = serde_json::to_vec(request.previous.output())?;

    info!(
        phase = %request.phase,
        command = %request.command,
        working_directory = %request.working_directory.display(),
        interpreter = %interpreter,
        "executing lifecycle command"
    );
    debug!(phase = %request.phase, previous = ?request.previous.output(), "previous state");

    let mut cmd = Command::new(&interpreter.shell);
    cmd.arg(&interpreter.flag)
        .arg(&request.command)
        .env_clear()
        .envs(environment.iter().filter_map(|entry| split_entry(entry)))
        .current_dir(&request.working_directory)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| ShellError::LaunchError {
        command: request.command.clone(),
        shell: interpreter.shell.clone(),
        source,
    })?;

    let (Some(stdin), Some(stdout), Some(stderr)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        terminate(&mut child, &request.command).await;
        return Err(ShellError::PipeError {
            command: request.command.clone(),
            message: "child stdio handles were not captured".to_string(),
        });
    };

    // Both streams are being drained before we start waiting on the child.
    let writer = tokio::spawn(write_input(stdin, input));
    let drain = spawn_drain(stdout, stderr, request.command.clone());
    let mut aborts = drain.abort_handles();
    aborts.push(writer.abort_handle());

    let completion = async {
        let status = child.wait().await?;
        let captured = drain
            .join()
            .await
            .map_err(|e| ShellError::PipeError {
                command: request.command.clone(),
                message: format!("reading child output: {e}"),
            })?;
        Ok::<_, ShellError>((status, captured))
    };

    let finished = match request.timeout {
        Some(limit) => tokio::time::timeout(limit, completion).await.ok(),
        None => Some(completion.await),
    };

    let Some(finished) = finished else {
        warn!(
            phase = %request.phase,
            command = %request.command,
            timeout = ?request.timeout,
            "command timed out; killing child process"
        );
        terminate(&mut child, &request.command).await;
        for handle in aborts {
            handle.abort();
        }
        return Err(ShellError::Timeout {
            command: request.command.clone(),
            timeout: request.timeout.unwrap_or_default(),
        });
    };
    let (status, captured) = finished?;

    match writer.await {
        Ok(Err(e)) => debug!(error = %e, "failed to write previous state to stdin"),
        Err(e) => debug!(error = %e, "stdin writer task ended abnormally"),
        Ok(Ok(())) => {}
    }

    info!(
        phase = %request.phase,
        command = %request.command,
        exit_code = ?status.code(),
        success = status.success(),
        "command exited"
    );
    debug!(phase = %request.phase, stdout = %captured.stdout, "command stdout");
    debug!(phase = %request.phase, stderr = %captured.stderr, "command stderr");

    if !status.success() {
        return Err(ShellError::ExecutionError {
            command: request.command.clone(),
            status: status.to_string(),
            code: status.code(),
            stderr: captured.stderr,
            stdout: tail(&captured.stdout, MAX_STDERR_BYTES).to_string(),
        });
    }

    match extract_output(&captured.stdout) {
        Some(output) => {
            let state = ProcessState::new(environment, output);
            debug!(phase = %request.phase, output = ?state.output(), "new state");
            Ok(Some(state))
        }
        None => {
            debug!(
                phase = %request.phase,
                command = %request.command,
                "no JSON object in command output; state is absent"
            );
            Ok(None)
        }
    }
}

/// Write the previous state and close stdin. A child that exits without
/// reading its input is not an error.
async fn write_input(mut stdin: ChildStdin, input: Vec<u8>) -> io::Result<()> {
    let written = async {
        stdin.write_all(&input).await?;
        stdin.shutdown().await
    }
    .await;

    match written {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}

async fn terminate(child: &mut Child, command: &str) {
    if let Err(e) = child.start_kill() {
        warn!(command = %command, error = %e, "failed to kill child process");
    }
    match child.wait().await {
        Ok(status) => debug!(command = %command, %status, "child process reaped"),
        Err(e) => warn!(command = %command, error = %e, "failed to reap child process"),
    }
}

/// Last `max` bytes of `s`, cut on a char boundary.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
