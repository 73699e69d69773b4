//! CLI module for restquery
//!
//! Provides command-line interface for:
//! - serve: Load the configuration and serve the resources over HTTP
//! - schema: Print the synthesised filter schemas

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{build_server, init_logging, run, run_command, schema, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
