//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub train_csv: NamedTempFile,
    pub test_csv: NamedTempFile,
    pub regression_csv: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        let mut train_csv = NamedTempFile::with_suffix(".csv")?;
        writeln!(train_csv, "feature1,feature2,label")?;
        writeln!(train_csv, "2.0,1.0,1")?;
        writeln!(train_csv, "-2.0,-1.0,-1")?;
        writeln!(train_csv, "1.5,0.8,1")?;
        writeln!(train_csv, "-1.5,-0.8,-1")?;
        writeln!(train_csv, "1.8,0.9,1")?;
        writeln!(train_csv, "-1.8,-0.9,-1")?;
        writeln!(train_csv, "2.2,1.2,1")?;
        writeln!(train_csv, "-2.2,-1.2,-1")?;
        train_csv.flush()?;

        let mut test_csv = NamedTempFile::with_suffix(".csv")?;
        writeln!(test_csv, "feature1,feature2,label")?;
        writeln!(test_csv, "1.6,0.7,1")?;
        writeln!(test_csv, "-1.6,-0.7,-1")?;
        test_csv.flush()?;

        let mut regression_csv = NamedTempFile::with_suffix(".csv")?;
        writeln!(regression_csv, "x,y")?;
        for i in 0..10 {
            let x = i as f64 * 0.5;
            writeln!(regression_csv, "{x},{}", 3.0 * x - 1.0)?;
        }
        regression_csv.flush()?;

        Ok(TestDataFiles {
            train_csv,
            test_csv,
            regression_csv,
        })
    }
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_svmkit"))
        .args(args)
        .output()
        .expect("Failed to run CLI")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are valid UTF-8")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Train a linear classifier on the shared training file
fn train_model(data: &TestDataFiles, model_path: &Path) {
    let output = run_cli(&[
        "train",
        "--data",
        path_str(data.train_csv.path()),
        "--output",
        path_str(model_path),
        "--kernel",
        "linear",
        "-C",
        "10",
    ]);
    assert_success(&output, "Train command");
}

#[test]
fn test_cli_train_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");

    let output = run_cli(&[
        "train",
        "--data",
        path_str(test_data.train_csv.path()),
        "--output",
        path_str(&model_path),
        "-C",
        "2.0",
        "--gamma",
        "0.5",
        "--epsilon",
        "0.001",
        "--max-iterations",
        "1000",
    ]);

    assert_success(&output, "Train command");
    assert!(model_path.exists(), "Model file was not created");

    let document = std::fs::read_to_string(&model_path).expect("read model");
    assert!(document.contains("\"format_version\": 1"));
    assert!(document.contains("\"kernel_type\": \"rbf\""));
}

#[test]
fn test_cli_train_regression() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("svr.json");

    let output = run_cli(&[
        "train",
        "--data",
        path_str(test_data.regression_csv.path()),
        "--output",
        path_str(&model_path),
        "--problem",
        "eps-svr",
        "--kernel",
        "linear",
        "-C",
        "100",
        "--p",
        "0.01",
    ]);
    assert_success(&output, "Regression train command");

    let output = run_cli(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.regression_csv.path()),
    ]);
    assert_success(&output, "Evaluate command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MSE:"), "unexpected output: {stdout}");
    assert!(stdout.contains("epsilon-SVR"));
}

#[test]
fn test_cli_auto_train_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("tuned.json");

    let output = run_cli(&[
        "auto-train",
        "--data",
        path_str(test_data.train_csv.path()),
        "--output",
        path_str(&model_path),
        "--kernel",
        "linear",
        "--folds",
        "4",
    ]);

    assert_success(&output, "Auto-train command");
    assert!(model_path.exists(), "Model file was not created");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cross-validation score"));
    assert!(stdout.contains("Selected: C="));
}

#[test]
fn test_cli_predict_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    train_model(&test_data, &model_path);

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_csv.path()),
    ]);
    assert_success(&output, "Predict command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Predictions for 2 samples"));
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines, vec!["0 1", "1 -1"]);
}

#[test]
fn test_cli_predict_with_confidence_to_file() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    let predictions_path = temp_dir.path().join("predictions.txt");
    train_model(&test_data, &model_path);

    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_csv.path()),
        "--output",
        path_str(&predictions_path),
        "--confidence",
    ]);
    assert_success(&output, "Predict command");

    let content = std::fs::read_to_string(&predictions_path).expect("read predictions");
    assert!(content.contains("decision_value"));
    let rows: Vec<Vec<&str>> = content
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split_whitespace().collect())
        .collect();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row.len(), 3);
        assert!(row[2].parse::<f64>().is_ok());
    }
}

#[test]
fn test_cli_evaluate_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    train_model(&test_data, &model_path);

    let output = run_cli(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_csv.path()),
    ]);
    assert_success(&output, "Evaluate command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Accuracy: 100.00%"), "unexpected output: {stdout}");
}

#[test]
fn test_cli_info_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    train_model(&test_data, &model_path);

    let output = run_cli(&["info", path_str(&model_path)]);
    assert_success(&output, "Info command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== SVM Model Summary ==="));
    assert!(stdout.contains("Kernel Type: linear"));
    assert!(stdout.contains("-1 vs 1"));
}

#[test]
fn test_cli_info_rejects_inconsistent_model() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    train_model(&test_data, &model_path);

    // Point the decision function at a class that does not exist
    let text = std::fs::read_to_string(&model_path).expect("read model");
    let mut document: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    document["classes"] = serde_json::json!([0.0]);
    document["decision_functions"][0]["class_pair"] = serde_json::json!([0, 5]);
    std::fs::write(&model_path, document.to_string()).expect("write model");

    let output = run_cli(&["info", path_str(&model_path)]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid model document"), "unexpected stderr: {stderr}");
    assert!(!stderr.contains("panicked"));
}

#[test]
fn test_cli_dimension_mismatch_fails() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = temp_dir.path().join("model.json");
    train_model(&test_data, &model_path);

    // One feature per row against a two-feature model
    let output = run_cli(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.regression_csv.path()),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Dimension mismatch"), "unexpected stderr: {stderr}");
}

#[test]
fn test_cli_error_handling() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    // Missing data file
    let output = run_cli(&[
        "train",
        "--data",
        path_str(&temp_dir.path().join("missing.csv")),
        "--output",
        path_str(&temp_dir.path().join("model.json")),
    ]);
    assert!(!output.status.success());

    // Missing model file
    let output = run_cli(&["info", path_str(&temp_dir.path().join("missing.json"))]);
    assert!(!output.status.success());

    // Not a model document
    let mut bogus = NamedTempFile::new().expect("temp file");
    writeln!(bogus, "not json").expect("write");
    bogus.flush().expect("flush");
    let output = run_cli(&["info", path_str(bogus.path())]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid model document"));
}

#[test]
fn test_cli_rejects_unknown_kernel() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let output = run_cli(&[
        "train",
        "--data",
        path_str(test_data.train_csv.path()),
        "--output",
        "unused.json",
        "--kernel",
        "custom",
    ]);
    assert!(!output.status.success());
}

#[test]
fn test_cli_help_and_version() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["train", "auto-train", "predict", "evaluate", "info"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }

    let output = run_cli(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
