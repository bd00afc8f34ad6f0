// src/store.rs

//! JSON state file persisted by the CLI between runs.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Result, ShellError};
use crate::state::ResourceData;

pub const STATE_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,

    #[serde(default)]
    pub resources: BTreeMap<String, ResourceData>,

    #[serde(default)]
    pub data: BTreeMap<String, ResourceData>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_FILE_VERSION,
            resources: BTreeMap::new(),
            data: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Load state from `path`. A missing file is an empty state.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no state file yet; starting empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let state: StateFile = serde_json::from_str(&contents)?;
        if state.version > STATE_FILE_VERSION {
            return Err(ShellError::ConfigError(format!(
                "state file {} has version {}, newest supported is {}",
                path.display(),
                state.version,
                STATE_FILE_VERSION
            )));
        }
        Ok(state)
    }

    /// Write state to `path` via a temporary file and a rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = temp_path(path);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "state file written");
        Ok(())
    }

    /// Store `data`, dropping entries that no longer exist.
    pub fn put_resource(&mut self, name: &str, data: ResourceData) {
        put(&mut self.resources, name, data);
    }

    pub fn put_data(&mut self, name: &str, data: ResourceData) {
        put(&mut self.data, name, data);
    }

    pub fn resource(&self, name: &str) -> ResourceData {
        self.resources.get(name).cloned().unwrap_or_default()
    }
}

fn put(map: &mut BTreeMap<String, ResourceData>, name: &str, data: ResourceData) {
    if data.exists() {
        map.insert(name.to_string(), data);
    } else {
        map.remove(name);
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| ".shellstate.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
