// src/exec/env.rs

//! Environment construction for child processes.

use std::collections::{BTreeMap, HashMap};

/// Right-biased merge of override maps: for a key present in several
/// sources, the value from the *last* source wins.
pub fn merge_overrides<'a, I>(sources: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a BTreeMap<String, String>>,
{
    let mut merged = BTreeMap::new();
    for source in sources {
        for (key, value) in source {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Environment of the running process as `(key, value)` pairs.
///
/// Non-UTF-8 entries are decoded lossily rather than dropped.
pub fn ambient_environment() -> Vec<(String, String)> {
    std::env::vars_os()
        .map(|(k, v)| {
            (
                k.to_string_lossy().into_owned(),
                v.to_string_lossy().into_owned(),
            )
        })
        .collect()
}

/// Ambient environment plus `overrides`, as ordered `KEY=VALUE` strings.
pub fn build_environment(overrides: &BTreeMap<String, String>) -> Vec<String> {
    build_environment_from(ambient_environment(), overrides)
}

/// Same as [`build_environment`] with an explicit base.
///
/// Order is first-insertion order: base entries keep their position, an
/// override of an existing key replaces the value in place, new keys are
/// appended.
pub fn build_environment_from<I>(base: I, overrides: &BTreeMap<String, String>) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let all = base
        .into_iter()
        .chain(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

    for (key, value) in all {
        match index.get(&key) {
            Some(&pos) => entries[pos].1 = value,
            None => {
                index.insert(key.clone(), entries.len());
                entries.push((key, value));
            }
        }
    }

    entries
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect()
}

/// Split a `KEY=VALUE` entry at the first `=`.
pub fn split_entry(entry: &str) -> Option<(&str, &str)> {
    entry.split_once('=')
}
