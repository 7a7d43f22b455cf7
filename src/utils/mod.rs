//! File system and logging utilities
//!
//! # Modules
//!
//! - [`fs`] - Delete policy, copy-and-delete tree moves, path helpers
//! - [`logging`] - Dual stderr + log-file tracing setup

pub mod fs;
pub mod logging;

pub use fs::{copy_tree, remove_path, with_name_suffix};
pub use logging::init_logging;
