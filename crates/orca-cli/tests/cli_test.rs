use assert_cmd::prelude::*;
use serde_json::Value;
use std::process::Command;

fn run(args: &[&str]) -> (bool, Value) {
    let exe = assert_cmd::cargo_bin!("orca-cli");
    let output = Command::new(exe).args(args).output().expect("run orca-cli");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let json: Value = serde_json::from_str(stdout.trim()).expect("JSON output");
    (output.status.success(), json)
}

fn node<'a>(json: &'a Value, name: &str) -> &'a Value {
    json["nodes"]
        .as_array()
        .expect("nodes array")
        .iter()
        .find(|n| n["name"] == name)
        .unwrap_or_else(|| panic!("missing node {name}"))
}

#[test]
fn default_run_lays_out_the_nested_chain() {
    let (ok, json) = run(&[]);
    assert!(ok);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(3));

    let b = node(&json, "B");
    assert_eq!(b["parent"], "A");
    assert_eq!((b["x"].as_f64(), b["y"].as_f64()), (Some(12.0), Some(12.0)));
    let a = node(&json, "A");
    assert_eq!((a["width"].as_f64(), a["height"].as_f64()), (Some(24.0), Some(24.0)));
    let root = node(&json, "root");
    assert_eq!(root["parent"], Value::Null);
    assert_eq!(root["width"].as_f64(), Some(48.0));
}

#[test]
fn deeper_chains_grow_by_two_paddings_per_level() {
    let (ok, json) = run(&["--depth", "4", "--pretty"]);
    assert!(ok);
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(5));
    assert_eq!(node(&json, "root")["height"].as_f64(), Some(96.0));
    assert_eq!(node(&json, "D")["parent"], "C");
}

#[test]
fn strategies_are_accepted_in_any_case() {
    let (ok, json) = run(&[
        "--cycle-breaking",
        "GREEDY",
        "--model-order",
        "nodes_and_edges",
        "--hierarchy",
        "separate-children",
        "--direction",
        "down",
    ]);
    assert!(ok);
    assert_eq!(json["status"], "ok");
}

#[test]
fn conflicting_options_report_an_error() {
    let (ok, json) = run(&["--cycle-breaking", "interactive"]);
    assert!(!ok);
    assert_eq!(json["status"], "error");
    assert_eq!(json["kind"], "configuration_conflict");
    assert!(json["message"].as_str().is_some_and(|m| m.contains("configuration conflict")));
}

#[test]
fn unknown_strategies_are_rejected() {
    let exe = assert_cmd::cargo_bin!("orca-cli");
    Command::new(exe)
        .args(["--cycle-breaking", "sideways"])
        .assert()
        .failure();
}
