use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn run_json(args: &[&str]) -> Value {
    let exe = assert_cmd::cargo_bin!("narwhal");
    let output = Command::new(exe)
        .current_dir(repo_root())
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("stdout is JSON")
}

fn coordinates(out: &Value) -> Vec<(String, Vec<f64>)> {
    out["vertices"]
        .as_array()
        .expect("vertices array")
        .iter()
        .map(|v| {
            let id = v["id"].as_str().expect("vertex id").to_string();
            let xs = v["coordinates"]
                .as_array()
                .expect("coordinates array")
                .iter()
                .map(|x| x.as_f64().expect("number"))
                .collect();
            (id, xs)
        })
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[test]
fn cli_projects_the_square_fixture() {
    let square = fixture("square.json");
    let out = run_json(&[square.to_string_lossy().as_ref()]);

    assert_eq!(out["dimensions"], 2);
    assert_eq!(out["iterations"], 10);
    let placed = coordinates(&out);
    assert_eq!(placed.len(), 4);
    assert_eq!(placed[0], ("a".to_string(), vec![0.0, 0.0]));
    assert_eq!(placed[1], ("b".to_string(), vec![1.0, 0.0]));

    let diagonal = 2.0f64.sqrt();
    let find = |id: &str| &placed.iter().find(|(v, _)| v == id).expect("placed").1;
    assert!((distance(find("a"), find("c")) - diagonal).abs() < 1e-6);
    assert!((distance(find("b"), find("d")) - diagonal).abs() < 1e-6);
    assert!((distance(find("c"), find("d")) - 1.0).abs() < 1e-6);
    assert!(out["stress"].as_f64().expect("stress") < 1e-9);

    assert_eq!(out["tree"]["root"], "a");
    assert_eq!(out["tree"]["edges"].as_array().expect("edges").len(), 3);
    assert!(out.get("nnc").is_none());
}

#[test]
fn cli_projects_the_tetrahedron_in_three_dimensions() {
    let tetrahedron = fixture("tetrahedron.json");
    let out = run_json(&["project", "--dims", "3", tetrahedron.to_string_lossy().as_ref()]);

    assert_eq!(out["dimensions"], 3);
    let placed = coordinates(&out);
    assert_eq!(placed.len(), 4);
    for (i, (_, a)) in placed.iter().enumerate() {
        assert_eq!(a.len(), 3);
        for (_, b) in &placed[i + 1..] {
            assert!((distance(a, b) - 1.0).abs() < 1e-6);
        }
    }
}

#[test]
fn cli_reads_stdin_and_pretty_prints() {
    let text = fs::read_to_string(fixture("square.json")).expect("read fixture");
    let exe = assert_cmd::cargo_bin!("narwhal");
    let output = assert_cmd::Command::new(exe)
        .args(["--pretty", "--iterations", "0", "-"])
        .write_stdin(text)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).expect("utf8");
    assert!(stdout.contains("\n  \"dimensions\": 2"));
    let out: Value = serde_json::from_str(&stdout).expect("JSON");
    assert_eq!(out["iterations"], 0);
    assert_eq!(out["lambdas"].as_array().expect("lambdas").len(), 0);
}

#[test]
fn cli_config_file_enables_diagnostics_and_flags_override_it() {
    let square = fixture("square.json");
    let config = fixture("diagnostics.config.json");
    let out = run_json(&[
        "--config",
        config.to_string_lossy().as_ref(),
        square.to_string_lossy().as_ref(),
    ]);
    assert_eq!(out["iterations"], 3);
    assert_eq!(out["nnc"], serde_json::json!(["a", "b", "c", "d"]));
    assert_eq!(out["emanatingEdges"], serde_json::json!(["b", "d", "c"]));

    let tmp = tempfile::tempdir().expect("tempdir");
    let own = tmp.path().join("config.json");
    fs::write(&own, r#"{"numberOfIterations": 2, "minimumArea": true}"#).expect("write config");
    let out = run_json(&[
        "--config",
        own.to_string_lossy().as_ref(),
        "--iterations",
        "5",
        "--start",
        "c",
        square.to_string_lossy().as_ref(),
    ]);
    assert_eq!(out["iterations"], 5);
    assert_eq!(out["vertices"][0]["id"], "c");
    assert_eq!(out["tree"]["root"], "c");
}

#[test]
fn cli_finish_bounds_the_projection_on_a_disconnected_graph() {
    let islands = fixture("islands.json");
    let out = run_json(&["--finish", "c", islands.to_string_lossy().as_ref()]);
    let ids: Vec<String> = coordinates(&out).into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[test]
fn cli_reports_disconnected_graph_as_failure() {
    let islands = fixture("islands.json");
    let exe = assert_cmd::cargo_bin!("narwhal");
    let assert = Command::new(exe)
        .arg(islands.to_string_lossy().as_ref())
        .assert()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("not reachable"), "stderr: {stderr}");
}

#[test]
fn cli_tree_command_prints_the_spanning_tree() {
    let square = fixture("square.json");
    let out = run_json(&["tree", square.to_string_lossy().as_ref()]);

    assert_eq!(out["root"], "a");
    assert!((out["totalWeight"].as_f64().expect("weight") - 3.0).abs() < 1e-12);
    let edges = out["edges"].as_array().expect("edges");
    assert_eq!(edges.len(), 3);
    assert_eq!(edges[0]["vertex"], "b");
    assert_eq!(edges[0]["parent"], "a");
}

#[test]
fn cli_reorder_command_prints_the_coordinatizer_order() {
    let square = fixture("square.json");
    let out = run_json(&["reorder", square.to_string_lossy().as_ref()]);
    assert_eq!(out["order"], serde_json::json!(["a", "c", "b", "d"]));

    let out = run_json(&["reorder", "--nodes", "2", square.to_string_lossy().as_ref()]);
    assert_eq!(out["order"], serde_json::json!(["a", "c"]));
}

#[test]
fn cli_rejects_bad_arguments() {
    let square = fixture("square.json");
    let exe = assert_cmd::cargo_bin!("narwhal");
    Command::new(exe)
        .args(["--bogus", square.to_string_lossy().as_ref()])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("narwhal");
    Command::new(exe)
        .args(["--dims", "two", square.to_string_lossy().as_ref()])
        .assert()
        .code(2);

    let exe = assert_cmd::cargo_bin!("narwhal");
    Command::new(exe)
        .args(["--start", "zzz", square.to_string_lossy().as_ref()])
        .assert()
        .code(1);

    let exe = assert_cmd::cargo_bin!("narwhal");
    Command::new(exe)
        .args(["--dims", "1", square.to_string_lossy().as_ref()])
        .assert()
        .code(1);
}
