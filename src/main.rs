//! restquery CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, prints errors to
//! stderr and exits with the error's status.

use restquery::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(e.exit_status());
    }
}
