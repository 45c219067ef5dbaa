use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::path::Path;

/// Reference instant used by every test: Wednesday 2026-06-17, noon UTC
pub const NOW: &str = "2026-06-17T12:00:00Z";

/// A salience command bound to `store` and the fixed clock
pub fn salience(store: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("salience");
    cmd.env_remove("SALIENCE_STORE")
        .env_remove("SALIENCE_LOG")
        .arg("--store")
        .arg(store)
        .arg("--now")
        .arg(NOW);
    cmd
}

pub fn init_store(store: &Path) {
    salience(store).arg("init").assert().success();
}

/// Add a note and return its key
#[allow(dead_code)]
pub fn add_note(store: &Path, args: &[&str]) -> String {
    let output = salience(store).arg("add").args(args).output().unwrap();
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

#[allow(dead_code)]
pub fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.arg("--format").arg("json").output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}
