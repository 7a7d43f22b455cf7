//! Command-line interface for swap-updater.
//!
//! The updater is normally started by the application it replaces, right before
//! that application shuts down:
//!
//! ```bash
//! swap-updater --target=/opt/app/current --pid=4242
//! ```
//!
//! # Arguments
//!
//! - `--target=<dir>` - Directory of the running installation (required)
//! - `--pid=<pid>` - Process id of the running application (required)
//! - `--source=<dir>` - Directory holding the new version. Defaults to the
//!   directory containing the updater executable
//! - `--timeout-secs=<n>` - Override the graceful-exit timeout
//! - `--launcher=<name>` - Override the executable started afterwards
//! - `--config=<file>` - TOML file with [`UpdaterConfig`] settings
//! - `--verbose` / `--quiet` - Log level
//!
//! # Exit Codes
//!
//! - `0`-`6` - The [`UpdateOutcome`](crate::core::UpdateOutcome) of the run,
//!   also passed to the relaunched application as `--patch-result`
//! - `7` - The application could not be relaunched
//! - `1` - Setup failed before the update could start (config or logging)
//! - `2` - The command line could not be parsed
//!
//! A failed update is also summarized on stderr with a suggestion.

use crate::core::user_friendly_error;
use crate::upgrade::{Relauncher, UpdateOrchestrator, UpdateRequest, UpdaterConfig};
use crate::utils::fs::strip_trailing_separators;
use crate::utils::logging::init_logging;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Swap a staged installation directory into place and relaunch the application.
#[derive(Parser, Debug)]
#[command(
    name = "swap-updater",
    about = "Swap a staged installation into place and relaunch the application",
    version
)]
pub struct Cli {
    /// Directory of the currently running installation.
    #[arg(long, value_name = "DIR", value_parser = parse_dir)]
    target: PathBuf,

    /// Process id of the running application; it is killed if it does not exit in time.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pid: u32,

    /// Directory holding the new version.
    ///
    /// Defaults to the directory containing this executable.
    #[arg(long, value_name = "DIR", value_parser = parse_dir)]
    source: Option<PathBuf>,

    /// Seconds to wait for the application to exit before killing it.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// File name of the executable to start after the update.
    #[arg(long, value_name = "NAME")]
    launcher: Option<String>,

    /// Path to a TOML configuration file.
    ///
    /// Without it, `SWAP_UPDATER_CONFIG` is consulted, then built-in defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug output.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parse a directory argument, dropping trailing path separators.
fn parse_dir(value: &str) -> std::result::Result<PathBuf, String> {
    let trimmed = strip_trailing_separators(value.trim());
    if trimmed.is_empty() {
        return Err("path must not be empty".to_string());
    }
    Ok(PathBuf::from(trimmed))
}

impl Cli {
    /// Log level selected by `--verbose` / `--quiet`.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    /// Merge the configuration file with command-line overrides.
    pub fn build_config(&self) -> Result<UpdaterConfig> {
        let mut config = UpdaterConfig::resolve(self.config.as_deref())?;
        if let Some(timeout) = self.timeout_secs {
            config.exit_timeout_secs = timeout;
        }
        if let Some(launcher) = &self.launcher {
            config.launcher_executable = launcher.clone();
        }
        Ok(config)
    }

    /// Build the update request, filling in the default source directory.
    pub fn request(&self) -> Result<UpdateRequest> {
        let new_install = match &self.source {
            Some(source) => source.clone(),
            None => executable_dir()?,
        };
        Ok(UpdateRequest {
            new_install,
            live_install: self.target.clone(),
            pid: self.pid,
        })
    }

    /// Run the update and return the process exit code.
    ///
    /// # Errors
    ///
    /// Only setup failures are returned: logging, configuration, or locating
    /// the updater executable. Failures of the update itself are reported
    /// through the exit code and `--patch-result`.
    pub fn execute(self) -> Result<i32> {
        let log_path = init_logging(self.log_level())?;
        debug!("Writing log to {}", log_path.display());

        let config = self.build_config()?;
        let request = self.request()?;

        // The working directory may be inside one of the directories being moved
        let temp_dir = std::env::temp_dir();
        if let Err(e) = std::env::set_current_dir(&temp_dir) {
            warn!("Could not change working directory to {}: {e}", temp_dir.display());
        }

        info!(
            "Updating \"{}\" from \"{}\" (pid {})",
            request.live_install.display(),
            request.new_install.display(),
            request.pid
        );

        let launcher = Relauncher::new(&config.launcher_executable, Some(log_path))
            .search_dir(&request.live_install)
            .search_dir(&request.new_install);

        let report = UpdateOrchestrator::new(&config).run(&request, &launcher);
        let exit_code = report.exit_code();
        if let Some(error) = report.error {
            user_friendly_error(error).display();
        }
        Ok(exit_code)
    }
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the updater executable")?;
    exe.parent()
        .map(PathBuf::from)
        .with_context(|| format!("Updater executable has no parent directory: {}", exe.display()))
}
