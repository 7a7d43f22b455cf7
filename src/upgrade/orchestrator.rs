use crate::core::{UpdateError, UpdateOutcome};
use crate::upgrade::config::UpdaterConfig;
use crate::upgrade::launcher::Launcher;
use crate::upgrade::mover::{DirectoryMover, FsMover};
use crate::upgrade::process::{ProcessControl, ProcessWaiter, SystemProcessControl};
use crate::upgrade::transaction::DirectoryTransaction;
use std::path::PathBuf;
use tracing::{error, info};

/// Process exit code used when the application could not be relaunched.
pub const RELAUNCH_FAILURE_EXIT_CODE: i32 = 7;

/// Input of one update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Directory holding the staged new version.
    pub new_install: PathBuf,
    /// Directory of the currently running version.
    pub live_install: PathBuf,
    /// Process that must exit before files are touched.
    pub pid: u32,
}

impl UpdateRequest {
    /// Check the request before any side effect.
    ///
    /// Both paths must be non-empty, absolute and distinct, and the pid must be
    /// non-zero.
    pub fn validate(&self) -> Result<(), UpdateError> {
        let invalid = |reason: String| Err(UpdateError::InvalidArguments { reason });

        if self.pid == 0 {
            return invalid("pid must not be 0".to_string());
        }
        for (name, path) in [("source", &self.new_install), ("target", &self.live_install)] {
            if path.as_os_str().is_empty() {
                return invalid(format!("{name} path must not be empty"));
            }
            if !path.is_absolute() {
                return invalid(format!("{name} path must be absolute: {}", path.display()));
            }
        }
        if self.new_install == self.live_install {
            return invalid(format!(
                "source and target must be different directories: {}",
                self.live_install.display()
            ));
        }
        Ok(())
    }
}

/// Result of [`UpdateOrchestrator::run`].
#[derive(Debug)]
pub struct RunReport {
    /// How the update concluded.
    pub outcome: UpdateOutcome,
    /// The [`UpdateError`] behind a failed outcome.
    pub error: Option<anyhow::Error>,
    /// Why the relaunch failed, if it did.
    pub relaunch_error: Option<anyhow::Error>,
}

impl RunReport {
    /// Process exit code for the updater itself.
    pub fn exit_code(&self) -> i32 {
        if self.relaunch_error.is_some() {
            RELAUNCH_FAILURE_EXIT_CODE
        } else {
            self.outcome.code()
        }
    }
}

/// Sequences waiting, swapping and relaunching.
///
/// Every failure of the wait or the swap is caught here, logged, and converted
/// to an [`UpdateOutcome`]. The relaunch is attempted regardless of the outcome.
pub struct UpdateOrchestrator<C = SystemProcessControl, M = FsMover> {
    waiter: ProcessWaiter<C>,
    mover: M,
}

impl UpdateOrchestrator {
    /// Create an orchestrator for the host system.
    pub fn new(config: &UpdaterConfig) -> Self {
        let waiter = ProcessWaiter::new(config.exit_timeout())
            .poll_interval(config.poll_interval())
            .kill_settle(config.kill_settle());
        Self::with_parts(waiter, FsMover)
    }
}

impl<C: ProcessControl, M: DirectoryMover> UpdateOrchestrator<C, M> {
    /// Create an orchestrator from explicit parts.
    pub fn with_parts(waiter: ProcessWaiter<C>, mover: M) -> Self {
        Self { waiter, mover }
    }

    /// Run the update and relaunch the application.
    pub fn run(&self, request: &UpdateRequest, launcher: &dyn Launcher) -> RunReport {
        let (outcome, error) = match self.update(request) {
            Ok(()) => (UpdateOutcome::Success, None),
            Err(e) => {
                let outcome = UpdateOutcome::from(&e);
                let e = anyhow::Error::new(e);
                error!("Update failed: {e:#}");
                (outcome, Some(e))
            }
        };
        info!("Update finished with outcome {outcome} ({})", outcome.code());

        let relaunch_error = launcher.launch(outcome).err();
        if let Some(e) = &relaunch_error {
            error!("Failed to relaunch application: {e:#}");
        }

        RunReport { outcome, error, relaunch_error }
    }

    /// Wait for the blocking process, then swap the directories.
    pub fn update(&self, request: &UpdateRequest) -> Result<(), UpdateError> {
        request.validate()?;

        let waited = self.waiter.wait(request.pid)?;
        info!("Process {} closed ({waited:?}); applying update...", request.pid);

        DirectoryTransaction::with_mover(
            request.new_install.clone(),
            request.live_install.clone(),
            &self.mover,
        )
        .apply()
    }
}
