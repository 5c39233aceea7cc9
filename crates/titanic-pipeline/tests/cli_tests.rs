//! Tests for the `titanic-train` binary.

use std::process::{Command, Output};
use tempfile::TempDir;

fn titanic_train(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_titanic-train"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("binary should start")
}

#[test]
fn test_failure_is_reported_once_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    let output = titanic_train(&dir, &["run", "--config-file", "missing.yaml"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("Failed: ").count(), 1, "{}", stderr);
    assert!(!stderr.contains("Error: "), "{}", stderr);
}

#[test]
fn test_predict_without_checkpoint_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rows.csv"), "PassengerId\n892\n").unwrap();

    let output = titanic_train(&dir, &["predict", "rows.csv"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--pipeline-ckpt"));
}
