//! CLI command implementations

use std::path::Path;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ServiceConfig};
use crate::filters::FilterSchema;
use crate::rest_api::RestServer;
use crate::store::MemoryStore;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Serve { config, port } => serve(&config, port),
        Command::Schema { config } => schema(&config),
    }
}

/// Load the configuration, seed the store and serve until shutdown
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    let mut config = ServiceConfig::load(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }
    init_logging(&config);

    let server = build_server(&config)?;
    let addr = config.socket_addr();

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        let listener = TcpListener::bind(addr.as_str())
            .await
            .map_err(|e| CliError::boot_failed(format!("Failed to bind {}: {}", addr, e)))?;
        tracing::info!(addr = %addr, resources = config.resources.len(), "Listening");

        axum::serve(listener, server.router())
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Print every resource's synthesised schema
pub fn schema(config_path: &Path) -> CliResult<()> {
    let config = ServiceConfig::load(config_path)?;
    let schemas: Vec<FilterSchema> = config.resources.iter().map(|r| r.schema()).collect();
    write_json(&schemas)
}

/// Seed an in-memory store and register every configured resource
pub fn build_server(config: &ServiceConfig) -> CliResult<RestServer<MemoryStore>> {
    let store = MemoryStore::new();
    for resource in &config.resources {
        store
            .seed(&resource.model, resource.seed.clone())
            .map_err(|e| CliError::boot_failed(format!("Failed to seed {}: {}", resource.model.name, e)))?;
    }

    let mut server = RestServer::new(store).with_cors_origins(config.cors_origins.clone());
    for resource in &config.resources {
        server
            .register(resource.schema())
            .map_err(|e| CliError::boot_failed(e.to_string()))?;
    }
    Ok(server)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the config.
pub fn init_logging(config: &ServiceConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter);

    // A subscriber may already be installed, e.g. under a test harness
    let result = match config.log_format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
