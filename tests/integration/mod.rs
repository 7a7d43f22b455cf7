//! Integration test suite for swap-updater
//!
//! These tests drive the compiled binary end to end: argument handling, the
//! directory swap on a real file system, exit codes, and the relaunch of the
//! application with `--patch-result`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **arguments**: Command-line parsing and setup failures
//! - **update_run**: Complete update runs against temporary installations

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

mod arguments;
mod update_run;

/// Temporary workspace with a staged and a live installation.
pub struct Installation {
    pub temp: TempDir,
    pub staged: PathBuf,
    pub live: PathBuf,
}

impl Installation {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let staged = temp.path().join("staged");
        let live = temp.path().join("current");
        swap_updater::test_utils::write_tree(&staged, &[("version.txt", "2.0"), ("assets/new.pak", "new")]);
        swap_updater::test_utils::write_tree(&live, &[("version.txt", "1.0"), ("saves/slot1.sav", "progress")]);
        std::fs::create_dir_all(temp.path().join("tmp")).unwrap();
        Self { temp, staged, live }
    }

    /// File the fake launcher writes its arguments to.
    pub fn launch_record(&self) -> PathBuf {
        self.temp.path().join("launched.txt")
    }

    /// Command for the updater binary, isolated from the caller's environment.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("swap-updater").unwrap();
        cmd.env("TMPDIR", self.temp.path().join("tmp"))
            .env_remove("SWAP_UPDATER_CONFIG")
            .env_remove("RUST_LOG")
            .timeout(Duration::from_secs(60));
        cmd
    }

    /// Install a launcher script in `dir` that records its arguments.
    #[cfg(unix)]
    pub fn install_launcher(&self, dir: &Path) {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("launcher");
        let record = self.launch_record();
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" > \"{}.part\"\nmv \"{0}.part\" \"{0}\"\n", record.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// Id of a process that has already exited and been reaped.
pub fn exited_pid() -> u32 {
    let mut child = std::process::Command::new(if cfg!(windows) { "cmd" } else { "true" })
        .args(if cfg!(windows) { &["/C", "exit"][..] } else { &[][..] })
        .spawn()
        .unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

/// Wait for the detached launcher to write its record.
pub fn wait_for_file(path: &Path) -> String {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Ok(content) = std::fs::read_to_string(path) {
            return content;
        }
        assert!(Instant::now() < deadline, "{} was never written", path.display());
        std::thread::sleep(Duration::from_millis(50));
    }
}
