// tests/extract_output.rs

use std::collections::BTreeMap;

use proptest::prelude::*;
use shellstate::exec::extract::{extract_output, stringify_value};

fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_plain_object() {
    let out = extract_output(r#"{"a":"1","b":"two"}"#);
    assert_eq!(out, Some(map(&[("a", "1"), ("b", "two")])));
}

#[test]
fn test_object_after_noise_lines() {
    let text = "Starting deployment...\nuploading 3 files\ndone.\n{\"id\":\"i-123\"}\n";
    assert_eq!(extract_output(text), Some(map(&[("id", "i-123")])));
}

#[test]
fn test_backward_scan_skips_malformed_brace_region() {
    let text = r#"noise {bad json} more noise {"a":"1"}"#;
    assert_eq!(extract_output(text), Some(map(&[("a", "1")])));
}

#[test]
fn test_no_brace_is_absent() {
    assert_eq!(extract_output("deleted everything\n"), None);
    assert_eq!(extract_output(""), None);
}

#[test]
fn test_only_malformed_braces_is_absent() {
    assert_eq!(extract_output("{ not json } and {also: not}"), None);
    assert_eq!(extract_output("{\"unterminated\": \"value\""), None);
}

#[test]
fn test_top_level_array_is_not_state() {
    assert_eq!(extract_output("[1, 2, 3]"), None);
}

#[test]
fn test_trailing_text_after_object_is_ignored() {
    let text = "{\"a\":\"1\"}\nbye\n";
    assert_eq!(extract_output(text), Some(map(&[("a", "1")])));
}

#[test]
fn test_last_of_several_objects_wins() {
    let text = "{\"a\":\"1\"}\nprogress\n{\"a\":\"2\",\"b\":\"3\"}";
    assert_eq!(extract_output(text), Some(map(&[("a", "2"), ("b", "3")])));
}

#[test]
fn test_nested_payload_yields_outer_object() {
    let text = "log line\n{\"name\":\"web\",\"tags\":{\"env\":\"prod\"}}\n";
    let out = extract_output(text).expect("object expected");
    assert_eq!(out.get("name").map(String::as_str), Some("web"));
    assert_eq!(out.get("tags").map(String::as_str), Some(r#"{"env":"prod"}"#));
    assert!(!out.contains_key("env"));
}

#[test]
fn test_pretty_printed_payload() {
    let text = "creating\n{\n  \"a\": \"1\",\n  \"b\": \"2\"\n}\n";
    assert_eq!(extract_output(text), Some(map(&[("a", "1"), ("b", "2")])));
}

#[test]
fn test_nul_bytes_are_stripped() {
    let text = "\0\0noise\0\n{\"a\":\0\"1\"}\0\0";
    assert_eq!(extract_output(text), Some(map(&[("a", "1")])));
}

#[test]
fn test_non_string_values_are_coerced() {
    let text = r#"{"f":1.5,"i":10,"neg":-3,"t":true,"n":null,"arr":[1,"x"],"obj":{"k":"v"}}"#;
    let out = extract_output(text).expect("object expected");
    assert_eq!(out["f"], "1.5");
    assert_eq!(out["i"], "10");
    assert_eq!(out["neg"], "-3");
    assert_eq!(out["t"], "true");
    assert_eq!(out["n"], "");
    assert_eq!(out["arr"], r#"[1,"x"]"#);
    assert_eq!(out["obj"], r#"{"k":"v"}"#);
}

#[test]
fn test_whole_floats_print_without_fraction_or_exponent() {
    let text = r#"{"a":1.0,"b":1e3,"c":2.50,"d":-0.25,"e":1e21,"big":18446744073709551615}"#;
    let out = extract_output(text).expect("object expected");
    assert_eq!(out["a"], "1");
    assert_eq!(out["b"], "1000");
    assert_eq!(out["c"], "2.5");
    assert_eq!(out["d"], "-0.25");
    assert_eq!(out["e"], "1000000000000000000000");
    assert_eq!(out["big"], "18446744073709551615");
}

#[test]
fn test_string_values_are_not_altered() {
    let text = "log line\n{\"a\":\"x\u{FFFD}y\",\"b\":\"tab\\there\"}";
    let out = extract_output(text).expect("object expected");
    assert_eq!(out["a"], "x\u{FFFD}y");
    assert_eq!(out["b"], "tab\there");
}

#[test]
fn test_stringify_value_keeps_strings_verbatim() {
    let v = serde_json::json!("with \"quotes\"");
    assert_eq!(stringify_value(&v), "with \"quotes\"");
}

#[test]
fn test_many_open_braces_do_not_hide_payload() {
    let mut text = "{".repeat(5_000);
    text.push_str("\n{\"ok\":\"yes\"}");
    assert_eq!(extract_output(&text), Some(map(&[("ok", "yes")])));
}

fn noise_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 .,:;!#=-]{0,40}",
        "[a-z{} ]{0,30}",
    ]
}

proptest! {
    #[test]
    fn prop_payload_survives_any_preceding_noise(
        noise in proptest::collection::vec(noise_line(), 0..20),
        payload in proptest::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,12}", 0..6),
    ) {
        let json = serde_json::to_string(&payload).unwrap();
        let mut text = noise.join("\n");
        text.push('\n');
        text.push_str(&json);
        text.push('\n');

        prop_assert_eq!(extract_output(&text), Some(payload));
    }

    #[test]
    fn prop_text_without_braces_is_absent(text in "[^{]{0,200}") {
        prop_assert_eq!(extract_output(&text), None);
    }
}
