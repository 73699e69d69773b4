//! CLI argument definitions using clap
//!
//! Commands:
//! - restquery serve --config <path> [--port <port>]
//! - restquery schema --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Declarative filter and search endpoints over typed models
#[derive(Parser, Debug)]
#[command(name = "restquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the configured resources over HTTP
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./restquery.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the synthesised filter schema of every resource as JSON
    Schema {
        /// Path to configuration file
        #[arg(long, default_value = "./restquery.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::parse_from(["restquery", "serve", "--config", "svc.json", "--port", "9000"]);
        match cli.command {
            Command::Serve { config, port } => {
                assert_eq!(config, PathBuf::from("svc.json"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["restquery", "schema"]);
        match cli.command {
            Command::Schema { config } => assert_eq!(config, PathBuf::from("./restquery.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
