//! Concurrency tests for the clinic binary.
//!
//! Several processes writing the session file at once must never leave it
//! half-written.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::thread;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(
        dir.path().join("config.toml"),
        "[ui]\nsimulated_latency_ms = 0\n",
    )
    .expect("Failed to write config");
    dir
}

fn cli(root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("clinic"));
    cmd.arg("--config")
        .arg(root.join("config.toml"))
        .arg("--data-dir")
        .arg(root.join("data"));
    cmd
}

#[test]
fn test_concurrent_logins_keep_session_file_valid() {
    let temp_dir = setup_test_dir();
    let root: PathBuf = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let root = root.clone();
            thread::spawn(move || {
                let (email, password) = if i % 2 == 0 {
                    ("admin@example-domain", "admin123")
                } else {
                    ("doctor@example-domain", "doctor123")
                };
                cli(&root)
                    .args(["login", "--email", email, "--password", password])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("login thread panicked");
    }

    let contents = std::fs::read_to_string(root.join("data").join("session.json"))
        .expect("Failed to read session file");
    let entries: serde_json::Value =
        serde_json::from_str(&contents).expect("Session file is not valid JSON");
    assert!(entries["session_token"].is_string());
    assert!(entries["session_user"].is_string());

    let output = cli(&root).arg("whoami").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Administrator") || stdout.contains("Dr. João Silva"));
}

#[test]
fn test_concurrent_readers_during_login() {
    let temp_dir = setup_test_dir();
    let root: PathBuf = temp_dir.path().to_path_buf();

    cli(&root)
        .args(["login", "--email", "doctor@example-domain", "--password", "doctor123"])
        .assert()
        .success();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let root = root.clone();
            thread::spawn(move || {
                cli(&root).args(["route", "/dashboard"]).assert().success();
            })
        })
        .collect();

    cli(&root)
        .args(["login", "--email", "admin@example-domain", "--password", "admin123"])
        .assert()
        .success();

    for reader in readers {
        reader.join().expect("reader thread panicked");
    }
}
