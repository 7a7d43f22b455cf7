//! Test utilities for swap-updater
//!
//! Helpers for building installation directory trees in temporary directories
//! and comparing them before and after an update.
//!
//! # Example
//!
//! ```rust,no_run
//! use swap_updater::test_utils::{snapshot_tree, write_tree};
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let live = temp.path().join("live");
//! write_tree(&live, &[("app.bin", "v1"), ("data/save.dat", "42")]);
//!
//! let snapshot = snapshot_tree(&live);
//! assert_eq!(snapshot.get("data/save.dat"), Some(&Some("42".to_string())));
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Create `root` and the given files below it.
///
/// Each entry is a `/`-separated path relative to `root` and the file content.
/// Parent directories are created as needed.
///
/// # Panics
///
/// Panics if any directory or file cannot be created.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    std::fs::create_dir_all(root).unwrap();
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
}

/// Snapshot of a directory tree.
///
/// Maps every entry below `root` (as a `/`-separated relative path) to its file
/// content, or `None` for directories. Two snapshots are equal when the trees
/// have the same shape and file contents.
///
/// # Panics
///
/// Panics if the tree cannot be walked or a file cannot be read as UTF-8.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, Option<String>> {
    let mut snapshot = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.unwrap();
        let relative = entry.path().strip_prefix(root).unwrap();
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");

        let value = if entry.file_type().is_dir() {
            None
        } else {
            Some(std::fs::read_to_string(entry.path()).unwrap())
        };
        snapshot.insert(key, value);
    }
    snapshot
}
