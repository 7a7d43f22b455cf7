//! Command-line parsing and setup failures.

use super::{Installation, exited_pid};
use predicates::prelude::*;

#[test]
fn test_missing_arguments_print_usage() {
    let install = Installation::new();
    install
        .command()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--target").and(predicate::str::contains("--pid")));
}

#[test]
fn test_zero_pid_is_rejected() {
    let install = Installation::new();
    install
        .command()
        .arg(format!("--target={}", install.live.display()))
        .arg("--pid=0")
        .assert()
        .code(2);

    assert!(install.live.join("version.txt").exists());
}

#[test]
fn test_unreadable_config_is_a_setup_error() {
    let install = Installation::new();
    let config = install.temp.path().join("updater.toml");
    std::fs::write(&config, "exit_timeout_secs = \"soon\"").unwrap();

    install
        .command()
        .arg(format!("--target={}", install.live.display()))
        .arg(format!("--source={}", install.staged.display()))
        .arg(format!("--pid={}", exited_pid()))
        .arg(format!("--config={}", config.display()))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));

    assert_eq!(std::fs::read_to_string(install.staged.join("version.txt")).unwrap(), "2.0");
    assert_eq!(std::fs::read_to_string(install.live.join("version.txt")).unwrap(), "1.0");
}

#[test]
fn test_version_flag() {
    let install = Installation::new();
    install
        .command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
