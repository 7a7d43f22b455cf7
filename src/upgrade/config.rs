use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable that points at a config file when `--config` is not given.
pub const CONFIG_ENV_VAR: &str = "SWAP_UPDATER_CONFIG";

/// Configuration settings for an update run.
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// working configuration. Command-line flags override values loaded from a file.
///
/// ## TOML Example
/// ```toml
/// exit_timeout_secs = 10
/// poll_interval_ms = 100
/// kill_settle_ms = 2000
/// launcher_executable = "launcher.exe"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Seconds the blocking process is given to exit before it is killed.
    ///
    /// # Default: `10`
    #[serde(default = "default_exit_timeout_secs")]
    pub exit_timeout_secs: u64,

    /// Milliseconds between checks whether the blocking process is still alive.
    ///
    /// # Default: `100`
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Milliseconds to wait for a killed process to disappear before moving on.
    ///
    /// Moving on never fails; a process still visible after this window is
    /// only logged.
    ///
    /// # Default: `2000`
    #[serde(default = "default_kill_settle_ms")]
    pub kill_settle_ms: u64,

    /// File name of the executable started once the update has finished.
    ///
    /// # Default: `launcher` (`launcher.exe` on Windows)
    #[serde(default = "default_launcher_executable")]
    pub launcher_executable: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            exit_timeout_secs: default_exit_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            kill_settle_ms: default_kill_settle_ms(),
            launcher_executable: default_launcher_executable(),
        }
    }
}

fn default_exit_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_kill_settle_ms() -> u64 {
    2000
}

fn default_launcher_executable() -> String {
    format!("launcher{}", std::env::consts::EXE_SUFFIX)
}

impl UpdaterConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Resolve the configuration for this run.
    ///
    /// Order: `explicit` path, then [`CONFIG_ENV_VAR`], then defaults. An explicit
    /// path that cannot be loaded is an error; a missing file named by the
    /// environment variable only produces a warning.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = explicit {
            Self::load(path)?
        } else if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            let path = Path::new(&path);
            if path.exists() {
                Self::load(path)?
            } else {
                warn!("{CONFIG_ENV_VAR} points at missing file {}; using defaults", path.display());
                Self::default()
            }
        } else {
            Self::default()
        };

        debug!("Effective config: {config:?}");
        Ok(config)
    }

    /// Graceful-exit timeout as a [`Duration`].
    pub fn exit_timeout(&self) -> Duration {
        Duration::from_secs(self.exit_timeout_secs)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Post-kill settle window as a [`Duration`].
    pub fn kill_settle(&self) -> Duration {
        Duration::from_millis(self.kill_settle_ms)
    }
}
