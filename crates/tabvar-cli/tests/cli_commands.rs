use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::{json, Value};

fn tabvar() -> Command {
    Command::new(Path::new(env!("CARGO_BIN_EXE_tabvar")))
}

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).expect("dir");
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).expect("write");
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).expect("read")).expect("json")
}

#[test]
fn scan_prints_marked_coordinates() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let table = dir.path().join("t.json");
    write_json(&table, &json!([{"A": "@@@_1", "B": 2}, {"A": 3, "B": "@@@_x"}]));

    let output = tabvar()
        .args(["-q", "scan", "--table"])
        .arg(&table)
        .output()
        .expect("run scan");
    assert!(output.status.success());
    let cells: Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(cells, json!(["R1C1", "R2C2"]));
}

#[test]
fn init_then_run_builds_outputs() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let corpus = dir.path().join("corpus");
    write_json(
        &corpus.join("Ground_truth/42.json"),
        &json!([{"A": 1, "B": "x"}, {"A": 2, "B": "y"}]),
    );
    write_json(
        &corpus.join("Temporal/42_updated.json"),
        &json!([{"A": 1, "B": "@@@_z"}, {"A": 2, "B": "y"}]),
    );
    let plan = dir.path().join("plan.yaml");

    let status = tabvar()
        .args(["-q", "init", "--seed", "3", "--out"])
        .arg(&plan)
        .status()
        .expect("run init");
    assert!(status.success());

    let out = dir.path().join("out");
    let status = tabvar()
        .args(["-q", "run", "--plan"])
        .arg(&plan)
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run plan");
    assert!(status.success());
    assert_eq!(
        read_json(&out.join("Merged/42.json")),
        json!([{"A": 1, "B": "@@@_z"}, {"A": 2, "B": "y"}])
    );
    assert_eq!(
        read_json(&out.join("labels/42_labels.json"))[0]["categories"],
        json!(["Temporal"])
    );
    assert!(out.join("run_report.json").is_file());
}

#[test]
fn merge_and_strip_commands_write_tables() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let left = dir.path().join("left.json");
    let right = dir.path().join("right.json");
    write_json(&left, &json!([{"A": "@@@_7", "B": "x"}]));
    write_json(&right, &json!([{"A": "@@@_7", "B": "x"}, {"A": 2, "B": "y"}]));
    let out = dir.path().join("out");

    let status = tabvar()
        .args(["-q", "merge", "--file-id", "9", "--input"])
        .arg(format!("left={}", left.display()))
        .arg("--input")
        .arg(format!("right={}", right.display()))
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run merge");
    assert!(status.success());
    assert_eq!(
        read_json(&out.join("labels/9_labels.json")),
        json!([
            {"index": 0, "categories": ["left", "right"]},
            {"index": 1, "categories": []},
        ])
    );

    let stripped = dir.path().join("stripped.json");
    let status = tabvar()
        .args(["-q", "strip", "--input"])
        .arg(out.join("Merged/9.json"))
        .arg("--out")
        .arg(&stripped)
        .status()
        .expect("run strip");
    assert!(status.success());
    assert_eq!(
        read_json(&stripped),
        json!([{"A": 7, "B": "x"}, {"A": 2, "B": "y"}])
    );
}

#[test]
fn malformed_merge_input_fails() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let status = tabvar()
        .args(["-q", "merge", "--file-id", "1", "--input", "no-separator", "--out"])
        .arg(dir.path())
        .status()
        .expect("run merge");
    assert!(!status.success());
}
