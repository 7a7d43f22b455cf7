//! Outcome codes reported to the relaunched application.

use super::error::UpdateError;
use std::fmt;

/// How an update run concluded.
///
/// The discriminants are the integer codes passed to the relaunched
/// application via `--patch-result=<code>` and are part of the external
/// interface; do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum UpdateOutcome {
    /// The live installation was swapped and the backup cleaned up.
    Success = 0,
    /// The request was rejected before any side effect.
    InvalidArguments = 1,
    /// The blocking process could not be terminated.
    KillFailure = 2,
    /// A path could not be deleted.
    DeletePermissionFailure = 3,
    /// A directory could not be moved (including a rolled-back cutover).
    MovePermissionFailure = 4,
    /// The source of a move did not exist.
    DirectoryMissingFailure = 5,
    /// Anything else, including an unrecoverable failed restore.
    UnhandledFailure = 6,
}

impl UpdateOutcome {
    /// Integer code for this outcome.
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl From<&UpdateError> for UpdateOutcome {
    fn from(error: &UpdateError) -> Self {
        match error {
            UpdateError::InvalidArguments { .. } => Self::InvalidArguments,
            UpdateError::CannotKillProcess { .. } => Self::KillFailure,
            UpdateError::InsufficientDeletePermissions { .. } => Self::DeletePermissionFailure,
            UpdateError::InsufficientMovePermissions { .. } => Self::MovePermissionFailure,
            UpdateError::MoveDirectoryMissing { .. } => Self::DirectoryMissingFailure,
            UpdateError::BackupRestoreFailed { .. } | UpdateError::Io { .. } => {
                Self::UnhandledFailure
            }
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::InvalidArguments => "InvalidArguments",
            Self::KillFailure => "KillFailure",
            Self::DeletePermissionFailure => "DeletePermissionFailure",
            Self::MovePermissionFailure => "MovePermissionFailure",
            Self::DirectoryMissingFailure => "DirectoryMissingFailure",
            Self::UnhandledFailure => "UnhandledFailure",
        };
        write!(f, "{name}")
    }
}
