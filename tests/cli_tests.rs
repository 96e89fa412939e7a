use regex::Regex;
use std::fs;
use std::process::{Command, Output};

const FIXTURE: &str = "1,0,0,0.7071067811865476,0,0.7071067811865476,0,0,1,-0.7071067811865476,0,0.7071067811865476";

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_merminforge"))
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_state_verifies_its_circuit() {
    let output = run(&["state", "-q", "3", "--pattern", "1"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Verified"));

    let output = run(&["state", "-q", "4", "--pattern", "1", "--decompose"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Verified"));
}

#[test]
fn test_state_rejects_pattern_bits_of_wrong_width() {
    let output = run(&["state", "-q", "3", "--pattern-bits", "1"]);
    assert!(!output.status.success());

    let output = run(&["state", "-q", "3", "--pattern-bits", "1001"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Verified"));
}

#[test]
fn test_search_accepts_pattern_bits_wider_than_128() {
    let bits = format!("1{}", "0".repeat(246));
    let output = run(&[
        "search",
        "-q",
        "8",
        "--pattern-bits",
        &bits,
        "--objective",
        "analytic",
        "--seed",
        "3",
        "--max-iterations",
        "5",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Best mu"));
}

#[test]
fn test_evaluate_reaches_sqrt_two() {
    let output = run(&[
        "evaluate",
        "-q",
        "2",
        "--count-mode",
        "expected",
        "--shots",
        "100000",
        "-c",
        FIXTURE,
    ]);
    assert!(output.status.success());

    let re = Regex::new(r"mu \(absolute\): ([0-9.]+) \(exact ([0-9.]+)\)").unwrap();
    let text = stdout(&output);
    let caps = re.captures(&text).unwrap_or_else(|| panic!("no mu line in:\n{}", text));
    let measured: f64 = caps[1].parse().unwrap();
    let exact: f64 = caps[2].parse().unwrap();
    assert!((exact - 1.414214).abs() < 1e-6);
    assert!((measured - exact).abs() < 1e-3);
}

#[test]
fn test_evaluate_rejects_wrong_length() {
    let output = run(&["evaluate", "-q", "2", "-c", "1,0,0"]);
    assert!(!output.status.success());
}

#[test]
fn test_search_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("out.csv");

    let output = run(&[
        "search",
        "-q",
        "2",
        "--objective",
        "analytic",
        "--seed",
        "5",
        "--max-iterations",
        "200",
        "--checkpoint-every",
        "50",
        "-o",
        csv_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let re = Regex::new(r"Best mu: ([0-9.]+)").unwrap();
    let text = stdout(&output);
    let best: f64 = re.captures(&text).unwrap()[1].parse().unwrap();
    assert!(best > 0.0 && best <= 2f64.sqrt() + 1e-9);

    let written = fs::read_to_string(&csv_path).unwrap();
    assert!(written.lines().count() >= 2);
}

#[test]
fn test_search_batch_writes_one_file_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("batch.csv");

    let output = run(&[
        "search",
        "-q",
        "2",
        "--objective",
        "analytic",
        "--seed",
        "5",
        "--max-iterations",
        "30",
        "--runs",
        "2",
        "-o",
        csv_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(dir.path().join("batch_run0.csv").exists());
    assert!(dir.path().join("batch_run1.csv").exists());
}

#[test]
fn test_config_file_is_merged() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("config.json");
    fs::write(
        &cfg,
        r#"{ "experiment": { "qubits": 2, "objective": "analytic" }, "search": { "max_iterations": 20, "seed": 1 } }"#,
    )
    .unwrap();

    let output = run(&["search", "--config", cfg.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Best mu"));

    // An explicit flag still wins over the file.
    let output = run(&["search", "--config", cfg.to_str().unwrap(), "-q", "40"]);
    assert!(!output.status.success());
}
