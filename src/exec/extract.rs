// src/exec/extract.rs

//! Locate the trailing JSON object in a command's stdout.
//!
//! Commands print whatever they like (progress lines, banners, stray
//! braces) and finish with one JSON object. Every `{` is a candidate start;
//! candidates are tried from the rightmost one backwards and the first that
//! parses as an object wins. Bytes after the object are ignored, so a
//! trailing newline or footer never causes a rejection.
//!
//! Once a hit is found, earlier candidates are still examined while they
//! *enclose* it, so a nested payload yields its outermost object rather
//! than the innermost one. The scan stops at the first earlier object that
//! ends before the hit.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

/// Extract the last top-level JSON object from `text`, flattened to
/// string values. `None` when no candidate parses.
pub fn extract_output(text: &str) -> Option<BTreeMap<String, String>> {
    let clean = strip_noise(text);
    let starts = candidate_starts(&clean);

    let mut best: Option<Candidate> = None;
    for &start in starts.iter().rev() {
        let Some((object, end)) = parse_object_at(&clean, start) else {
            continue;
        };

        let replace = match &best {
            None => true,
            // encloses the current hit
            Some(hit) if end >= hit.end => true,
            Some(hit) if end <= hit.start => break,
            Some(_) => false,
        };
        if replace {
            best = Some(Candidate { start, end, object });
        }
    }

    best.map(|hit| flatten(hit.object))
}

struct Candidate {
    start: usize,
    end: usize,
    object: Map<String, Value>,
}

/// Drop NUL bytes. Anything else is left to the parser, so string values
/// come through unchanged.
fn strip_noise(text: &str) -> String {
    text.replace('\0', "")
}

fn candidate_starts(text: &str) -> Vec<usize> {
    text.match_indices('{').map(|(i, _)| i).collect()
}

/// Parse one object starting at byte `start`; returns it with its end offset.
fn parse_object_at(text: &str, start: usize) -> Option<(Map<String, Value>, usize)> {
    let mut stream =
        serde_json::Deserializer::from_str(&text[start..]).into_iter::<Map<String, Value>>();
    match stream.next() {
        Some(Ok(object)) => Some((object, start + stream.byte_offset())),
        _ => None,
    }
}

fn flatten(object: Map<String, Value>) -> BTreeMap<String, String> {
    object
        .into_iter()
        .map(|(k, v)| (k, stringify_value(&v)))
        .collect()
}

/// String form of a JSON value as stored in state.
///
/// Strings verbatim, booleans as `true`/`false`, `null` as the empty
/// string, arrays and objects as compact JSON. Numbers are printed in plain
/// decimal with the fewest digits that round-trip: `1.0` and `1e3` become
/// `1` and `1000`.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => stringify_number(n),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn stringify_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // `Display` for f64 never uses exponent notation.
        Some(f) => format!("{f}"),
        None => n.to_string(),
    }
}
