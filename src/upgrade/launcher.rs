//! Relaunching the application once the update has finished.

use crate::core::UpdateOutcome;
use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Starts the application after an update run.
pub trait Launcher {
    /// Start the application, reporting how the update concluded.
    fn launch(&self, outcome: UpdateOutcome) -> Result<()>;
}

/// [`Launcher`] that spawns an executable found in one of several directories.
///
/// The executable is started detached, in the directory it was found in, with
/// two arguments:
///
/// - `--patch-result=<code>`: the [`UpdateOutcome`] code
/// - `--application-log=<path>`: the log file written during this run, if any
#[derive(Debug, Clone)]
pub struct Relauncher {
    executable: String,
    search_dirs: Vec<PathBuf>,
    log_path: Option<PathBuf>,
}

impl Relauncher {
    /// Create a relauncher for the executable with file name `executable`.
    pub fn new(executable: impl Into<String>, log_path: Option<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            search_dirs: Vec::new(),
            log_path,
        }
    }

    /// Add a directory to search, after the ones already added.
    pub fn search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    /// First existing executable among the search directories.
    pub fn locate(&self) -> Option<PathBuf> {
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&self.executable))
            .find(|candidate| candidate.is_file())
    }

    /// Arguments passed to the relaunched application.
    pub fn arguments(&self, outcome: UpdateOutcome) -> Vec<String> {
        let mut args = vec![format!("--patch-result={}", outcome.code())];
        if let Some(log_path) = &self.log_path {
            args.push(format!("--application-log={}", log_path.display()));
        }
        args
    }
}

impl Launcher for Relauncher {
    fn launch(&self, outcome: UpdateOutcome) -> Result<()> {
        let executable = self.locate().ok_or_else(|| {
            let searched: Vec<String> =
                self.search_dirs.iter().map(|dir| dir.display().to_string()).collect();
            anyhow!(
                "Launcher executable '{}' not found in: {}",
                self.executable,
                searched.join(", ")
            )
        })?;
        let working_dir = executable.parent().unwrap_or(Path::new("."));
        let args = self.arguments(outcome);

        debug!("Starting {} {}", executable.display(), args.join(" "));
        let child = Command::new(&executable)
            .args(&args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", executable.display()))?;

        info!("Relaunched {} (pid {})", executable.display(), child.id());
        Ok(())
    }
}
