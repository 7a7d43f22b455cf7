//! swap-updater - replace an installed application directory and relaunch it
//!
//! A small, synchronous updater meant to be started by the application it
//! replaces. Given the directory of a staged new version, the directory of the
//! running version, and the running process id, it:
//!
//! 1. waits for the process to exit, killing it after a timeout
//! 2. swaps the directories behind a `<new>_backup` safety copy, rolling back
//!    when the final move is denied
//! 3. relaunches the application with `--patch-result=<code>` and
//!    `--application-log=<path>`
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line parsing and the top-level run
//! - [`core`] - [`UpdateError`](core::UpdateError),
//!   [`UpdateOutcome`](core::UpdateOutcome) and error rendering
//! - [`upgrade`] - Process waiting, directory moves, the swap transaction,
//!   relaunching and configuration
//! - [`utils`] - File system helpers and logging setup
//!
//! # Outcome Codes
//!
//! | Code | Outcome                   |
//! |------|---------------------------|
//! | 0    | `Success`                 |
//! | 1    | `InvalidArguments`        |
//! | 2    | `KillFailure`             |
//! | 3    | `DeletePermissionFailure` |
//! | 4    | `MovePermissionFailure`   |
//! | 5    | `DirectoryMissingFailure` |
//! | 6    | `UnhandledFailure`        |
//!
//! # Example
//!
//! ```bash
//! swap-updater --target=/opt/app/current --pid=4242
//! ```

pub mod cli;
pub mod core;
pub mod upgrade;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
