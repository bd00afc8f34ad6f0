use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lifecycle phase a command is executed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Create,
    Read,
    Update,
    Delete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Create => "create",
            Phase::Read => "read",
            Phase::Update => "update",
            Phase::Delete => "delete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Phase::Create),
            "read" => Ok(Phase::Read),
            "update" => Ok(Phase::Update),
            "delete" => Ok(Phase::Delete),
            other => Err(format!(
                "invalid phase: {other} (expected create, read, update or delete)"
            )),
        }
    }
}

/// Program + flag used to run a command string, e.g. `/bin/sh -c <command>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Interpreter {
    pub shell: String,
    pub flag: String,
}

impl Interpreter {
    pub fn new(shell: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            flag: flag.into(),
        }
    }
}

impl Default for Interpreter {
    /// `cmd /C` on Windows, `/bin/sh -c` everywhere else.
    fn default() -> Self {
        if cfg!(windows) {
            Interpreter::new("cmd", "/C")
        } else {
            Interpreter::new("/bin/sh", "-c")
        }
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.shell, self.flag)
    }
}
