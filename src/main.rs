//! swap-updater entry point
//!
//! Parses the command line, runs the update, and exits with the outcome code.
//! Setup errors that happen before the update can start are rendered with
//! [`user_friendly_error`] and exit with status 1.

use clap::Parser;
use swap_updater::cli;
use swap_updater::core::error::user_friendly_error;

fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
