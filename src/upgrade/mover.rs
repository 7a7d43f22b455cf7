//! Moving installation directories.
//!
//! [`FsMover`] first asks the file system for a plain rename, which is atomic
//! when source and destination live on the same volume. When the rename is
//! impossible for any reason other than permissions or a missing source (most
//! commonly a cross-device move), it falls back to
//! [`copy_tree`](crate::utils::fs::copy_tree), which copies and deletes file by
//! file.

use crate::core::UpdateError;
use crate::utils::fs::{classify_move_error, copy_tree, remove_path};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// File system operations the directory transaction is built from.
pub trait DirectoryMover {
    /// Move the directory tree at `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::InsufficientMovePermissions`] when the move is refused
    /// - [`UpdateError::MoveDirectoryMissing`] when `from` does not exist
    fn move_dir(&self, from: &Path, to: &Path) -> Result<(), UpdateError>;

    /// Delete `path` following the shared delete policy.
    ///
    /// Deleting a path that does not exist succeeds.
    fn remove(&self, path: &Path) -> Result<(), UpdateError>;
}

impl<M: DirectoryMover + ?Sized> DirectoryMover for &M {
    fn move_dir(&self, from: &Path, to: &Path) -> Result<(), UpdateError> {
        (**self).move_dir(from, to)
    }

    fn remove(&self, path: &Path) -> Result<(), UpdateError> {
        (**self).remove(path)
    }
}

/// [`DirectoryMover`] operating on the real file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMover;

impl DirectoryMover for FsMover {
    fn move_dir(&self, from: &Path, to: &Path) -> Result<(), UpdateError> {
        match fs::rename(from, to) {
            Ok(()) => {
                debug!("Moved directory \"{}\" to \"{}\"", from.display(), to.display());
                Ok(())
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound) => {
                Err(classify_move_error(from, to, e))
            }
            Err(e) => {
                info!(
                    "Could not move directory \"{}\" to \"{}\" ({e}), attempting copy instead",
                    from.display(),
                    to.display()
                );
                copy_tree(from, to)
            }
        }
    }

    fn remove(&self, path: &Path) -> Result<(), UpdateError> {
        remove_path(path)
    }
}
