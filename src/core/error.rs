//! Error handling for the updater
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`UpdateError`]) with one variant per failure kind the
//!    update transaction can report, so the orchestrator can map them 1:1 onto an
//!    [`UpdateOutcome`](crate::core::UpdateOutcome)
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for
//!    anything that escapes to the terminal
//!
//! # Error Categories
//!
//! - **Input**: [`UpdateError::InvalidArguments`]
//! - **Process**: [`UpdateError::CannotKillProcess`]
//! - **File System**: [`UpdateError::InsufficientDeletePermissions`],
//!   [`UpdateError::InsufficientMovePermissions`], [`UpdateError::MoveDirectoryMissing`]
//! - **Unrecoverable**: [`UpdateError::BackupRestoreFailed`]
//! - **Everything else**: [`UpdateError::Io`]
//!
//! Every variant that originates from the operating system keeps the underlying
//! [`std::io::Error`] as its `#[source]`, so the full chain is available to logs.
//!
//! # Examples
//!
//! ```rust,no_run
//! use swap_updater::core::{UpdateError, UpdateOutcome};
//! use std::path::PathBuf;
//!
//! let error = UpdateError::MoveDirectoryMissing {
//!     from: PathBuf::from("/app/new"),
//!     to: PathBuf::from("/app/new_backup"),
//!     source: std::io::Error::from(std::io::ErrorKind::NotFound),
//! };
//! assert_eq!(UpdateOutcome::from(&error), UpdateOutcome::DirectoryMissingFailure);
//! ```

use colored::Colorize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for every fallible step of an update run.
///
/// None of these are retried internally. The orchestrator catches them at its
/// boundary, logs them, and converts them into an outcome code.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The request failed validation before any side effect was attempted.
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Why the request was rejected
        reason: String,
    },

    /// The blocking process outlived the timeout and could not be terminated.
    ///
    /// Fatal: the live directory cannot be touched while the process may still
    /// hold file handles inside it.
    #[error("Unable to kill process {pid}")]
    CannotKillProcess {
        /// Id of the process that refused to die
        pid: u32,
        /// OS error reported by the termination attempt
        #[source]
        source: io::Error,
    },

    /// A path could be removed neither as a directory nor as a file.
    #[error("Failed to delete file/directory \"{}\"", path.display())]
    InsufficientDeletePermissions {
        /// The path that could not be deleted
        path: PathBuf,
        /// OS error from the final (file) delete attempt
        #[source]
        source: io::Error,
    },

    /// A move was refused by the operating system.
    #[error("Failed to move file/directory from \"{}\" to \"{}\"", from.display(), to.display())]
    InsufficientMovePermissions {
        /// Source of the move
        from: PathBuf,
        /// Destination of the move
        to: PathBuf,
        /// OS error reported by the move
        #[source]
        source: io::Error,
    },

    /// The source of a move does not exist, which points at a corrupted or
    /// incomplete installation.
    #[error("Failed to move file/directory from \"{}\" to \"{}\": source is missing", from.display(), to.display())]
    MoveDirectoryMissing {
        /// Source of the move
        from: PathBuf,
        /// Destination of the move
        to: PathBuf,
        /// OS error reported by the move
        #[source]
        source: io::Error,
    },

    /// The cutover failed and moving the backup back into place failed as well.
    ///
    /// The filesystem is in a mixed state that no automated step can safely fix.
    #[error(
        "Backup at \"{}\" failed to restore to \"{}\"; installation is in an undefined state",
        backup.display(),
        target.display()
    )]
    BackupRestoreFailed {
        /// Where the new version's payload was parked
        backup: PathBuf,
        /// Where it should have been restored to
        target: PathBuf,
        /// Why the restore move failed
        #[source]
        source: Box<UpdateError>,
    },

    /// Any other I/O failure.
    #[error("File system error during {operation} on \"{}\"", path.display())]
    Io {
        /// What was being attempted
        operation: &'static str,
        /// The path involved
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
}

impl UpdateError {
    /// Returns `true` if this error means the installation may be left in a
    /// state that requires an operator.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::BackupRestoreFailed { .. })
    }
}

/// Error context wrapper that pairs an error message with suggestions
///
/// Used by the binary entry point to render setup failures (bad config file,
/// unwritable temp directory, missing launcher) in a consistent format.
#[derive(Debug)]
pub struct ErrorContext {
    /// The error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Recognizes [`UpdateError`], [`std::io::Error`] and [`toml::de::Error`] anywhere
/// in the `anyhow` chain and attaches a suggestion. Unknown errors keep their full
/// context chain as the message.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format!("{error:#}");

    if let Some(update_error) = error.downcast_ref::<UpdateError>() {
        return create_error_context(message, update_error);
    }

    for cause in error.chain() {
        if let Some(toml_error) = cause.downcast_ref::<toml::de::Error>() {
            return ErrorContext::new(message)
                .with_details(toml_error.message().to_string())
                .with_suggestion("Check the TOML syntax of the updater config file");
        }

        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            match io_error.kind() {
                io::ErrorKind::PermissionDenied => {
                    return ErrorContext::new(message)
                        .with_suggestion("Run the updater as a user that owns the installation directory");
                }
                io::ErrorKind::NotFound => {
                    return ErrorContext::new(message)
                        .with_suggestion("Check that the file or directory exists and the path is correct");
                }
                _ => {}
            }
        }
    }

    ErrorContext::new(message)
}

fn create_error_context(message: String, error: &UpdateError) -> ErrorContext {
    match error {
        UpdateError::InvalidArguments { .. } => ErrorContext::new(message)
            .with_suggestion("Pass an absolute --target directory and a non-zero --pid"),
        UpdateError::CannotKillProcess { .. } => ErrorContext::new(message)
            .with_details("The application did not exit and the updater is not allowed to terminate it")
            .with_suggestion("Close the application manually and run the update again"),
        UpdateError::InsufficientDeletePermissions { .. }
        | UpdateError::InsufficientMovePermissions { .. } => ErrorContext::new(message)
            .with_suggestion("Run the updater as a user that owns the installation directory"),
        UpdateError::MoveDirectoryMissing { .. } => ErrorContext::new(message)
            .with_details("The installation appears to be incomplete or corrupted")
            .with_suggestion("Reinstall the application"),
        UpdateError::BackupRestoreFailed { backup, .. } => ErrorContext::new(message)
            .with_details(format!("The new version is still parked at {}", backup.display()))
            .with_suggestion("Restore the installation manually before starting the application"),
        UpdateError::Io { .. } => ErrorContext::new(message),
    }
}
