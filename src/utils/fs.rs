//! File system primitives for the update transaction
//!
//! This module provides the two low-level operations every step of the swap is
//! built from:
//!
//! - [`remove_path`]: the single delete policy used for every delete in the updater
//! - [`copy_tree`]: the copy-and-delete fallback used when a directory cannot be renamed
//!
//! # Crash Safety
//!
//! [`copy_tree`] interleaves copying with deleting. Each file is first written to a
//! `*.swap-partial` sibling at the destination and renamed into place; only then is
//! the source file removed. Interrupting the process at any point leaves every file
//! either intact at the source, complete at the destination, or both, so re-running
//! the copy converges to the same end state.
//!
//! # Examples
//!
//! ```rust,no_run
//! use swap_updater::utils::fs::{copy_tree, remove_path};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), swap_updater::core::UpdateError> {
//! // Idempotent: succeeds even if the backup was never created
//! remove_path(Path::new("/opt/app/new_backup"))?;
//!
//! // Move a tree across volumes
//! copy_tree(Path::new("/mnt/a/app"), Path::new("/mnt/b/app"))?;
//! # Ok(())
//! # }
//! ```

use crate::core::UpdateError;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Suffix used for files that are still being copied into place.
pub const PARTIAL_SUFFIX: &str = ".swap-partial";

/// Deletes a file or directory tree.
///
/// The delete policy shared by every delete in the updater:
///
/// 1. Attempt a recursive directory delete; a missing path counts as success
/// 2. On any other failure, attempt to delete the path as a single file (a
///    previous partial run may have left a stray file where a directory is expected)
/// 3. If that also fails, return [`UpdateError::InsufficientDeletePermissions`]
///    wrapping the error from the file delete
///
/// Symbolic links are removed, never followed.
pub fn remove_path(path: &Path) -> Result<(), UpdateError> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Deleted directory {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            trace!("Nothing to delete at {}", path.display());
            Ok(())
        }
        Err(dir_error) => {
            trace!(
                "Directory delete of {} failed ({dir_error}), retrying as file",
                path.display()
            );
            match fs::remove_file(path) {
                Ok(()) => {
                    debug!("Deleted file {}", path.display());
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(UpdateError::InsufficientDeletePermissions {
                    path: path.to_path_buf(),
                    source,
                }),
            }
        }
    }
}

/// Classifies an I/O error raised while moving `from` to `to`.
///
/// - `PermissionDenied` becomes [`UpdateError::InsufficientMovePermissions`]
/// - `NotFound` becomes [`UpdateError::MoveDirectoryMissing`]
/// - anything else becomes [`UpdateError::Io`]
pub fn classify_move_error(from: &Path, to: &Path, source: io::Error) -> UpdateError {
    match source.kind() {
        io::ErrorKind::PermissionDenied => UpdateError::InsufficientMovePermissions {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        },
        io::ErrorKind::NotFound => UpdateError::MoveDirectoryMissing {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        },
        _ => UpdateError::Io {
            operation: "move",
            path: from.to_path_buf(),
            source,
        },
    }
}

/// Moves a directory tree by copying it and deleting the source as it goes.
///
/// Depth-first: the destination directory is created, every file is copied
/// (overwriting an existing file of the same name) and then deleted at the
/// source, every subdirectory is recursed into and then deleted, and finally the
/// emptied source root itself is removed. Empty subdirectories are recreated at
/// the destination.
///
/// # Errors
///
/// I/O errors are classified with [`classify_move_error`]; failures to delete an
/// emptied source directory follow [`remove_path`].
pub fn copy_tree(from: &Path, to: &Path) -> Result<(), UpdateError> {
    copy_tree_contents(from, to)?;
    remove_path(from)
}

fn copy_tree_contents(from: &Path, to: &Path) -> Result<(), UpdateError> {
    // Reading first surfaces a missing source as MoveDirectoryMissing before
    // anything is created at the destination.
    let entries: Vec<fs::DirEntry> = fs::read_dir(from)
        .and_then(|dir| dir.collect::<io::Result<Vec<_>>>())
        .map_err(|e| classify_move_error(from, to, e))?;

    fs::create_dir_all(to).map_err(|e| classify_move_error(from, to, e))?;

    let mut directories = Vec::new();
    for entry in entries {
        let src_path = entry.path();
        let dst_path = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| classify_move_error(&src_path, &dst_path, e))?;

        if file_type.is_dir() {
            directories.push((src_path, dst_path));
        } else if file_type.is_symlink() {
            move_symlink(&src_path, &dst_path)?;
        } else {
            move_file(&src_path, &dst_path)?;
        }
    }

    for (src_dir, dst_dir) in directories {
        copy_tree_contents(&src_dir, &dst_dir)?;
        remove_path(&src_dir)?;
    }

    Ok(())
}

/// Copies one file into place and deletes the source.
///
/// The copy lands in a `*.swap-partial` sibling and is renamed over the final
/// name, so the destination name only ever refers to a complete file.
fn move_file(src: &Path, dst: &Path) -> Result<(), UpdateError> {
    let partial = partial_path(dst);

    fs::copy(src, &partial).map_err(|e| classify_move_error(src, dst, e))?;
    fs::rename(&partial, dst).map_err(|e| classify_move_error(src, dst, e))?;
    fs::remove_file(src).map_err(|e| classify_move_error(src, dst, e))?;

    trace!("Moved file {} -> {}", src.display(), dst.display());
    Ok(())
}

#[cfg(unix)]
fn move_symlink(src: &Path, dst: &Path) -> Result<(), UpdateError> {
    let target = fs::read_link(src).map_err(|e| classify_move_error(src, dst, e))?;
    remove_path(dst)?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| classify_move_error(src, dst, e))?;
    fs::remove_file(src).map_err(|e| classify_move_error(src, dst, e))?;

    trace!("Moved symlink {} -> {}", src.display(), dst.display());
    Ok(())
}

#[cfg(not(unix))]
fn move_symlink(src: &Path, dst: &Path) -> Result<(), UpdateError> {
    move_file(src, dst)
}

fn partial_path(dst: &Path) -> PathBuf {
    with_name_suffix(dst, PARTIAL_SUFFIX)
}

/// Appends `suffix` to the final component of `path`.
///
/// `/app/new` with `_backup` becomes `/app/new_backup`. Trailing separators are
/// ignored, so `/app/new/` produces the same result.
pub fn with_name_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Removes trailing `/` and `\` characters, keeping a lone root separator.
pub fn strip_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() && !path.is_empty() { &path[..1] } else { trimmed }
}
