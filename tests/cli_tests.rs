use std::process::{Command, Output};

fn combined(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn test_loadtest_help_ignores_invalid_environment() {
    let exe = env!("CARGO_BIN_EXE_user-api-loadtest");
    let output = Command::new(exe)
        .env("LOADTEST_API_KEY", "")
        .env("LOADTEST_BASE_PATH", "no-slash")
        .arg("--help")
        .output()
        .expect("run load test binary");
    assert!(output.status.success(), "{}", combined(&output));
    assert!(combined(&output).contains("--host"));
}

#[test]
fn test_loadtest_rejects_invalid_environment() {
    let exe = env!("CARGO_BIN_EXE_user-api-loadtest");
    let output = Command::new(exe)
        .env("LOADTEST_API_KEY", "")
        .args(["--host", "http://127.0.0.1:9", "--users", "1", "--run-time", "1s"])
        .output()
        .expect("run load test binary");
    assert!(!output.status.success());
    assert!(combined(&output).contains("EmptyApiKey"), "{}", combined(&output));
}

#[test]
fn test_smoke_help() {
    let exe = env!("CARGO_BIN_EXE_user-api-smoke");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("run smoke binary");
    assert!(output.status.success());
    let text = combined(&output);
    assert!(text.contains("--iterations"));
    assert!(text.contains("--timeout-secs"));
}
