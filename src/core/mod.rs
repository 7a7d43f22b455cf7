//! Core types for the updater
//!
//! This module holds the vocabulary shared by every other module:
//!
//! - [`UpdateError`] - one variant per failure kind of an update run
//! - [`UpdateOutcome`] - the integer status handed to the relaunched application
//! - [`ErrorContext`] / [`user_friendly_error`] - terminal rendering for errors
//!
//! Errors flow upward as `Result<_, UpdateError>` through the process, mover and
//! transaction layers and are converted to an [`UpdateOutcome`] exactly once, at the
//! orchestrator boundary.

pub mod error;
pub mod outcome;

pub use error::{ErrorContext, UpdateError, user_friendly_error};
pub use outcome::UpdateOutcome;
