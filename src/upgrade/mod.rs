//! Directory-swap update of an installed application.
//!
//! The updater is launched by the application it replaces. It is handed the
//! directory holding the staged new version, the directory of the running
//! version, and the process id of the running application.
//!
//! # Update Process Flow
//!
//! ```text
//! 1. Validate
//!    └── Both paths absolute and distinct, pid non-zero
//!
//! 2. Wait for the application
//!    ├── Poll until the process exits (10s by default)
//!    └── Kill it when it does not
//!
//! 3. Swap directories (DirectoryTransaction)
//!    ├── Restore the backup of an interrupted earlier run
//!    ├── Delete any stale <new>_backup
//!    ├── Move <new> to <new>_backup
//!    ├── Move <live> to <new>
//!    │   └── on access denied: move <new>_backup back to <new>
//!    └── Delete <new>_backup
//!
//! 4. Relaunch
//!    └── Start the launcher with --patch-result=<code>, whatever the outcome
//! ```
//!
//! # Module Structure
//!
//! - [`process`]: waiting for and killing the blocking process
//! - [`mover`]: moving directories, with a copy fallback
//! - [`transaction`]: the backup-protected swap
//! - [`launcher`]: starting the application afterwards
//! - [`orchestrator`]: sequencing the above and mapping errors to outcomes
//! - [`config`]: tunable timings and the launcher name
//!
//! # Example
//!
//! ```rust,no_run
//! use swap_updater::upgrade::{Relauncher, UpdateOrchestrator, UpdateRequest, UpdaterConfig};
//! use std::path::PathBuf;
//!
//! let config = UpdaterConfig::default();
//! let request = UpdateRequest {
//!     new_install: PathBuf::from("/opt/app/staged"),
//!     live_install: PathBuf::from("/opt/app/current"),
//!     pid: 4242,
//! };
//! let launcher = Relauncher::new(&config.launcher_executable, None)
//!     .search_dir(&request.live_install)
//!     .search_dir(&request.new_install);
//!
//! let report = UpdateOrchestrator::new(&config).run(&request, &launcher);
//! std::process::exit(report.exit_code());
//! ```

/// Tunable settings loaded from TOML.
pub mod config;
/// Relaunching the application.
pub mod launcher;
/// Directory moves with a copy fallback.
pub mod mover;
/// Sequencing of a complete update run.
pub mod orchestrator;
/// Waiting for and terminating the blocking process.
pub mod process;
/// The backup-protected directory swap.
pub mod transaction;

#[cfg(test)]
mod tests;

pub use config::UpdaterConfig;
pub use launcher::{Launcher, Relauncher};
pub use mover::{DirectoryMover, FsMover};
pub use orchestrator::{RELAUNCH_FAILURE_EXIT_CODE, RunReport, UpdateOrchestrator, UpdateRequest};
pub use process::{ProcessControl, ProcessWaiter, SystemProcessControl, WaitOutcome};
pub use transaction::{DirectoryTransaction, TransactionState};
