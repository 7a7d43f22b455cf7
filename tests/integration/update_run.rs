//! Complete update runs against temporary installations.

use super::{Installation, exited_pid, wait_for_file};
use predicates::prelude::*;
use swap_updater::test_utils::snapshot_tree;

#[cfg(unix)]
#[test]
fn test_update_swaps_and_relaunches() {
    let install = Installation::new();
    install.install_launcher(&install.live);
    let live_before = snapshot_tree(&install.live);

    install
        .command()
        .arg(format!("--target={}/", install.live.display()))
        .arg(format!("--source={}", install.staged.display()))
        .arg(format!("--pid={}", exited_pid()))
        .assert()
        .code(0);

    assert_eq!(snapshot_tree(&install.staged), live_before);
    assert!(!install.live.exists());
    assert!(!install.temp.path().join("staged_backup").exists());

    let args = wait_for_file(&install.launch_record());
    assert!(args.contains("--patch-result=0"), "{args}");
    assert!(args.contains("--application-log="), "{args}");
}

#[cfg(unix)]
#[test]
fn test_update_kills_running_application() {
    let install = Installation::new();
    install.install_launcher(&install.live);
    let mut app = std::process::Command::new("sleep").arg("30").spawn().unwrap();

    install
        .command()
        .arg(format!("--target={}", install.live.display()))
        .arg(format!("--source={}", install.staged.display()))
        .arg(format!("--pid={}", app.id()))
        .arg("--timeout-secs=1")
        .assert()
        .code(0);

    assert!(!app.wait().unwrap().success());
    let args = wait_for_file(&install.launch_record());
    assert!(args.contains("--patch-result=0"), "{args}");
}

#[cfg(unix)]
#[test]
fn test_relative_target_reports_invalid_arguments() {
    let install = Installation::new();
    install.install_launcher(&install.staged);
    let staged_before = snapshot_tree(&install.staged);

    install
        .command()
        .arg("--target=relative/current")
        .arg(format!("--source={}", install.staged.display()))
        .arg(format!("--pid={}", exited_pid()))
        .assert()
        .code(1);

    assert_eq!(snapshot_tree(&install.staged), staged_before);
    let args = wait_for_file(&install.launch_record());
    assert!(args.contains("--patch-result=1"), "{args}");
}

#[test]
fn test_missing_launcher_exits_with_relaunch_failure() {
    let install = Installation::new();

    install
        .command()
        .arg(format!("--target={}", install.live.display()))
        .arg(format!("--source={}", install.staged.display()))
        .arg(format!("--pid={}", exited_pid()))
        .arg("--launcher=does-not-exist")
        .assert()
        .code(7);

    // The swap itself still happened
    assert_eq!(std::fs::read_to_string(install.staged.join("version.txt")).unwrap(), "1.0");
}

#[cfg(unix)]
#[test]
fn test_missing_source_reports_directory_missing() {
    let install = Installation::new();
    install.install_launcher(&install.live);
    std::fs::remove_dir_all(&install.staged).unwrap();
    let live_before = snapshot_tree(&install.live);

    install
        .command()
        .arg(format!("--target={}", install.live.display()))
        .arg(format!("--source={}", install.staged.display()))
        .arg(format!("--pid={}", exited_pid()))
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Reinstall the application"));

    assert_eq!(snapshot_tree(&install.live), live_before);
    let args = wait_for_file(&install.launch_record());
    assert!(args.contains("--patch-result=5"), "{args}");
}
