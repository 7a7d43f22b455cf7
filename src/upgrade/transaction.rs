use crate::core::UpdateError;
use crate::upgrade::mover::{DirectoryMover, FsMover};
use crate::utils::fs::with_name_suffix;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Suffix appended to the new-install directory name to form the backup path.
pub const BACKUP_SUFFIX: &str = "_backup";

/// Progress of a [`DirectoryTransaction`].
///
/// Transitions only move forward:
///
/// ```text
/// Start -> BackupCleared -> NewMovedToBackup -> LiveMoved -> Completed
///                                  |
///                                  +-- cutover denied --> Restored
///                                                   \---> Unrecoverable
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Nothing has been touched yet.
    Start,
    /// Any stale backup from an earlier run has been deleted.
    BackupCleared,
    /// The new-install payload has been parked at the backup path.
    NewMovedToBackup,
    /// The live installation now occupies the new-install slot.
    LiveMoved,
    /// The backup has been deleted; the swap is complete.
    Completed,
    /// The cutover was denied and the backup has been moved back.
    Restored,
    /// The cutover was denied and the backup could not be moved back.
    Unrecoverable,
}

/// Swaps an installation directory into place behind a safety backup.
///
/// `DirectoryTransaction` owns the backup path (`<new_install>_backup`) for the
/// duration of [`apply`](Self::apply). Before anything is mutated, the new-install
/// payload is parked at the backup path, so a denied cutover can be undone by
/// moving it back.
///
/// # Process
///
/// 1. Resume an interrupted earlier run:
///    - interrupted right after parking the payload (the new-install path is
///      missing but a backup exists): move the backup back
///    - interrupted right after the cutover (the live path is missing but both
///      the new-install path and a backup exist): only the final cleanup is left
/// 2. Delete any stale backup
/// 3. Move the new-install directory to the backup path
/// 4. Move the live directory into the new-install slot (the cutover). When this
///    is denied, move whatever the cutover already relocated back to the live
///    path, move the backup back, and report the denial
/// 5. Delete the backup
///
/// Each step is attempted exactly once; there is no retry loop.
///
/// # Examples
///
/// ```rust,no_run
/// use swap_updater::upgrade::transaction::DirectoryTransaction;
/// use std::path::PathBuf;
///
/// # fn example() -> Result<(), swap_updater::core::UpdateError> {
/// let mut transaction = DirectoryTransaction::new(
///     PathBuf::from("/opt/app/new"),
///     PathBuf::from("/opt/app/live"),
/// );
/// transaction.apply()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DirectoryTransaction<M = FsMover> {
    new_install: PathBuf,
    live_install: PathBuf,
    backup: PathBuf,
    state: TransactionState,
    mover: M,
}

impl DirectoryTransaction {
    /// Create a transaction that operates on the real file system.
    pub fn new(new_install: PathBuf, live_install: PathBuf) -> Self {
        Self::with_mover(new_install, live_install, FsMover)
    }
}

impl<M: DirectoryMover> DirectoryTransaction<M> {
    /// Create a transaction using a custom [`DirectoryMover`].
    pub fn with_mover(new_install: PathBuf, live_install: PathBuf, mover: M) -> Self {
        let backup = with_name_suffix(&new_install, BACKUP_SUFFIX);
        Self {
            new_install,
            live_install,
            backup,
            state: TransactionState::Start,
            mover,
        }
    }

    /// Path used to park the new-install payload.
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    /// Current state of the transaction.
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Run the transaction.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::InsufficientDeletePermissions`] if the stale or final
    ///   backup cannot be deleted
    /// - [`UpdateError::InsufficientMovePermissions`] if a move is denied; when it
    ///   is the cutover that was denied, the pre-transaction state has been restored
    /// - [`UpdateError::MoveDirectoryMissing`] if a move source does not exist
    /// - [`UpdateError::BackupRestoreFailed`] if a denied cutover could not be
    ///   rolled back
    pub fn apply(&mut self) -> Result<(), UpdateError> {
        info!(
            "Swapping \"{}\" into \"{}\" (backup \"{}\")",
            self.live_install.display(),
            self.new_install.display(),
            self.backup.display()
        );

        if self.recover_interrupted_run()? {
            self.advance(TransactionState::LiveMoved);
            return self.finish();
        }

        self.mover.remove(&self.backup)?;
        self.advance(TransactionState::BackupCleared);

        self.mover.move_dir(&self.new_install, &self.backup)?;
        self.advance(TransactionState::NewMovedToBackup);

        match self.mover.move_dir(&self.live_install, &self.new_install) {
            Ok(()) => self.advance(TransactionState::LiveMoved),
            Err(denied @ UpdateError::InsufficientMovePermissions { .. }) => {
                return Err(self.restore_backup(denied));
            }
            Err(e) => return Err(e),
        }

        self.finish()
    }

    fn finish(&mut self) -> Result<(), UpdateError> {
        self.mover.remove(&self.backup)?;
        self.advance(TransactionState::Completed);

        debug_assert!(!self.backup.exists(), "backup must be cleared before success");
        info!("Update applied");
        Ok(())
    }

    /// Returns `true` when an earlier run already completed the cutover.
    ///
    /// A crash between parking the payload and the cutover leaves only the
    /// backup behind; deleting it as "stale" would lose the payload. A crash
    /// after the cutover leaves the live contents in the new-install slot;
    /// parking them again would strand them at the backup path.
    fn recover_interrupted_run(&self) -> Result<bool, UpdateError> {
        if !self.backup.exists() {
            return Ok(false);
        }

        if !self.new_install.exists() {
            warn!(
                "Found \"{}\" without \"{}\"; restoring backup from an interrupted update",
                self.backup.display(),
                self.new_install.display()
            );
            self.mover.move_dir(&self.backup, &self.new_install)?;
            return Ok(false);
        }

        if !self.live_install.exists() {
            warn!(
                "\"{}\" is gone and \"{}\" is still present; finishing an interrupted update",
                self.live_install.display(),
                self.backup.display()
            );
            return Ok(true);
        }

        Ok(false)
    }

    fn restore_backup(&mut self, denied: UpdateError) -> UpdateError {
        warn!(
            "Cutover of \"{}\" was denied ({denied}); restoring \"{}\" from backup",
            self.live_install.display(),
            self.new_install.display()
        );

        match self.undo_cutover() {
            Ok(()) => {
                self.advance(TransactionState::Restored);
                debug_assert!(
                    !self.backup.exists() && self.new_install.exists(),
                    "restored transaction must leave no backup behind"
                );
                denied
            }
            Err(restore_error) => {
                self.advance(TransactionState::Unrecoverable);
                error!(
                    "Backup failed to restore; manual intervention required. \
                     new install: \"{}\", live install: \"{}\", backup: \"{}\", \
                     cutover error: {denied:?}, restore error: {restore_error:?}",
                    self.new_install.display(),
                    self.live_install.display(),
                    self.backup.display()
                );
                UpdateError::BackupRestoreFailed {
                    backup: self.backup.clone(),
                    target: self.new_install.clone(),
                    source: Box::new(restore_error),
                }
            }
        }
    }

    /// A cutover that fell back to copying may have relocated part of the live
    /// tree before it was denied.
    fn undo_cutover(&self) -> Result<(), UpdateError> {
        if self.new_install.exists() {
            info!(
                "Moving partially relocated files from \"{}\" back to \"{}\"",
                self.new_install.display(),
                self.live_install.display()
            );
            self.mover.move_dir(&self.new_install, &self.live_install)?;
        }
        self.mover.move_dir(&self.backup, &self.new_install)
    }

    fn advance(&mut self, next: TransactionState) {
        debug!("Transaction {:?} -> {next:?}", self.state);
        self.state = next;
    }
}
