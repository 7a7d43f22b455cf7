//! Logging setup for an update run
//!
//! Every run writes to two sinks at once:
//!
//! - **stderr** with colors, for whoever started the updater
//! - **a per-run log file** in the temp directory, plain text, which is handed to
//!   the relaunched application via `--application-log=<path>` so it can show the
//!   user what happened during the update
//!
//! The log file is created with [`tempfile`] and kept on disk after
//! the updater exits; the relaunched application owns it from then on.
//!
//! # Filtering
//!
//! `RUST_LOG` takes precedence when set. Otherwise the level passed to
//! [`init_logging`] applies (`info` by default, `debug` with `--verbose`,
//! `error` with `--quiet`).

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Prefix of the per-run log file name.
pub const LOG_FILE_PREFIX: &str = "swap-updater-";

/// Installs the global tracing subscriber and returns the path of the log file.
///
/// # Errors
///
/// Fails if the log file cannot be created in the temp directory or a global
/// subscriber is already installed.
pub fn init_logging(level: &str) -> Result<PathBuf> {
    let (file, path) = tempfile::Builder::new()
        .prefix(LOG_FILE_PREFIX)
        .suffix(".log")
        .tempfile()
        .context("Failed to create application log file")?
        .keep()
        .context("Failed to persist application log file")?;

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .without_time()
        .with_target(false);

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(path)
}
