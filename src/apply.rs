// src/apply.rs

//! Run one lifecycle phase over the configured resources.
//!
//! Selected resources are spawned as concurrent tasks; the lock registry inside
//! the provider decides how much actually overlaps.

use anyhow::{Result, anyhow, bail};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::ShellError;
use crate::resource::Provider;
use crate::state::ResourceData;
use crate::store::StateFile;
use crate::types::Phase;

/// Outcome of [`apply_phase`].
#[derive(Debug, Default)]
pub struct PhaseReport {
    pub succeeded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, ShellError)>,
}

impl PhaseReport {
    /// `Err` describing the first failure, if any.
    pub fn into_result(self) -> Result<()> {
        let total = self.succeeded.len() + self.failed.len();
        match self.failed.into_iter().next() {
            None => Ok(()),
            Some((name, err)) => Err(anyhow!(err).context(format!(
                "'{name}' failed ({} of {total} failed)",
                total - self.succeeded.len()
            ))),
        }
    }
}

enum Entry {
    Resource(String),
    Data(String),
}

/// Apply `phase` to resources (all, or only `only`) and update `store`.
///
/// - `create` runs on resources without an id,
/// - `read`, `update`, `delete` on resources with an id,
/// - `read` also reads every data source.
pub async fn apply_phase(
    provider: &Provider,
    store: &mut StateFile,
    phase: Phase,
    only: Option<&str>,
) -> Result<PhaseReport> {
    if let Some(name) = only {
        if provider.config().resource.get(name).is_none()
            && provider.config().data.get(name).is_none()
        {
            bail!("unknown resource or data source '{name}'");
        }
    }

    let mut report = PhaseReport::default();
    let mut tasks: Vec<(Entry, JoinHandle<(ResourceData, crate::errors::Result<()>)>)> = Vec::new();

    let resource_names: Vec<String> = provider
        .resource_names()
        .filter(|n| only.is_none_or(|o| o == *n))
        .map(str::to_string)
        .collect();

    for name in resource_names {
        let mut data = store.resource(&name);
        let wanted = match phase {
            Phase::Create => !data.exists(),
            Phase::Read | Phase::Update | Phase::Delete => data.exists(),
        };
        if !wanted {
            info!(resource = %name, %phase, "skipping resource");
            report.skipped.push(name);
            continue;
        }

        let Some(resource) = provider.resource(&name) else {
            continue;
        };
        let handle = tokio::spawn(async move {
            let res = resource.apply(phase, &mut data).await;
            (data, res)
        });
        tasks.push((Entry::Resource(name), handle));
    }

    if phase == Phase::Read {
        let data_names: Vec<String> = provider
            .data_source_names()
            .filter(|n| only.is_none_or(|o| o == *n))
            .map(str::to_string)
            .collect();

        for name in data_names {
            let source = match provider.data_source(&name) {
                Some(Ok(source)) => source,
                Some(Err(e)) => {
                    report.failed.push((name, e));
                    continue;
                }
                None => continue,
            };
            let handle = tokio::spawn(async move {
                let mut data = ResourceData::default();
                let res = source.read(&mut data).await;
                (data, res)
            });
            tasks.push((Entry::Data(name), handle));
        }
    }

    // Every task is already running; awaiting them in order only fixes
    // the order results are recorded in.
    for (entry, handle) in tasks {
        let name = match &entry {
            Entry::Resource(n) | Entry::Data(n) => n.clone(),
        };
        let (data, res) = match handle.await {
            Ok(done) => done,
            Err(e) => {
                // Stored state for this entry stays as it was.
                error!(name = %name, %phase, error = %e, "lifecycle task panicked");
                let err = ShellError::Other(anyhow!("task for '{name}' panicked: {e}"));
                report.failed.push((name, err));
                continue;
            }
        };

        match res {
            Ok(()) => {
                match entry {
                    Entry::Resource(_) => store.put_resource(&name, data),
                    Entry::Data(_) => store.put_data(&name, data),
                }
                report.succeeded.push(name);
            }
            Err(err) => {
                // Handlers only write completed steps, so this keeps e.g. the
                // delete half of a failed replacement.
                if let Entry::Resource(_) = entry {
                    store.put_resource(&name, data);
                }
                error!(name = %name, %phase, error = %err, "lifecycle command failed");
                report.failed.push((name, err));
            }
        }
    }

    report.succeeded.sort();
    Ok(report)
}
