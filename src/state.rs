// src/state.rs

//! State passed between lifecycle invocations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Result of one successful command execution.
///
/// Never mutated after construction: every invocation builds a fresh
/// `ProcessState`, the previous one is only read to feed the child's stdin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessState {
    environment: Vec<String>,
    output: BTreeMap<String, String>,
}

impl ProcessState {
    pub fn new(environment: Vec<String>, output: BTreeMap<String, String>) -> Self {
        Self {
            environment,
            output,
        }
    }

    /// Rebuild the input side of a state from persisted output only.
    pub fn from_output(output: BTreeMap<String, String>) -> Self {
        Self::new(Vec::new(), output)
    }

    /// `KEY=VALUE` entries the child ran with.
    pub fn environment(&self) -> &[String] {
        &self.environment
    }

    pub fn output(&self) -> &BTreeMap<String, String> {
        &self.output
    }

    pub fn into_output(self) -> BTreeMap<String, String> {
        self.output
    }
}

/// What the host persists for one resource or data source.
///
/// `id == None` means the resource does not exist (never created, or a
/// command reported no state).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub output: BTreeMap<String, String>,
}

impl ResourceData {
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Previous state fed to the next command.
    pub fn previous_state(&self) -> ProcessState {
        ProcessState::from_output(self.output.clone())
    }

    /// Forget the resource: the host treats a cleared id as deleted.
    pub fn clear(&mut self) {
        self.id = None;
        self.output.clear();
    }
}
