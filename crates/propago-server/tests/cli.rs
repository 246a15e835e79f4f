use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_cli_models() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("propago")?;
    cmd.arg("models");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("simple"))
        .stdout(predicate::str::contains("temporal"));
    Ok(())
}

#[test]
fn test_cli_score() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("request.json");
    fs::write(
        &file,
        r#"{
            "nodes": ["AAPL", "MSFT", "NVDA"],
            "features": [[0.1, 1.2], [0.3, 0.9], [0.8, 1.5]],
            "adjacency": [[0, 1], [1, 2]],
            "model_type": "deep",
            "train_epochs": 3
        }"#,
    )?;

    let mut cmd = Command::cargo_bin("propago")?;
    cmd.arg("score").arg(&file).arg("--pretty");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"ranking\""))
        .stdout(predicate::str::contains("NVDA"));
    Ok(())
}

#[test]
fn test_cli_score_rejects_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let file = dir.path().join("request.json");
    fs::write(&file, r#"{"nodes": [], "features": []}"#)?;

    let mut cmd = Command::cargo_bin("propago")?;
    cmd.arg("score").arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No nodes provided"));
    Ok(())
}
