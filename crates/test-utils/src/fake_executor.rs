use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shellstate::errors::ShellError;
use shellstate::exec::{CommandExecutor, ExecuteFuture, RunRequest};
use shellstate::state::ProcessState;
use shellstate::types::Phase;

/// What the fake returns for the next execution.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    State(BTreeMap<String, String>),
    Absent,
    Fail(String),
    /// Panic inside the execution future with this message.
    Panic(String),
}

/// A request as seen by the fake.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    pub phase: Phase,
    pub command: String,
    pub previous: BTreeMap<String, String>,
    pub environment: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

/// A fake executor that:
/// - records every request it receives
/// - answers with queued responses, or an absent state once the queue is empty.
///
/// Clones share the same record and queue.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    runs: Arc<Mutex<Vec<RecordedRun>>>,
    responses: Arc<Mutex<VecDeque<FakeResponse>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: FakeResponse) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn respond_with_state(&self, pairs: &[(&str, &str)]) -> &Self {
        let output = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.respond(FakeResponse::State(output))
    }

    pub fn respond_absent(&self) -> &Self {
        self.respond(FakeResponse::Absent)
    }

    pub fn respond_failure(&self, stderr: &str) -> &Self {
        self.respond(FakeResponse::Fail(stderr.to_string()))
    }

    pub fn respond_panic(&self, msg: &str) -> &Self {
        self.respond(FakeResponse::Panic(msg.to_string()))
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.runs().into_iter().map(|r| r.phase).collect()
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute(&self, request: RunRequest) -> ExecuteFuture<'_> {
        let runs = Arc::clone(&self.runs);
        let responses = Arc::clone(&self.responses);

        Box::pin(async move {
            runs.lock().unwrap().push(RecordedRun {
                phase: request.phase,
                command: request.command.clone(),
                previous: request.previous.output().clone(),
                environment: request.environment.clone(),
                timeout: request.timeout,
            });

            let response = responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(FakeResponse::Absent);

            match response {
                FakeResponse::State(output) => Ok(Some(ProcessState::new(Vec::new(), output))),
                FakeResponse::Absent => Ok(None),
                FakeResponse::Fail(stderr) => Err(ShellError::ExecutionError {
                    command: request.command,
                    status: "exit status: 1".to_string(),
                    code: Some(1),
                    stderr,
                    stdout: String::new(),
                }),
                FakeResponse::Panic(msg) => panic!("{msg}"),
            }
        })
    }
}
