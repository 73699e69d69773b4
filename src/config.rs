//! Service Configuration
//!
//! JSON configuration for the HTTP service: listen address, logging and
//! the resources to expose, each with its model, filterable fields,
//! custom fields and optional seed rows.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filters::key::camel;
use crate::filters::schema::is_base_param;
use crate::filters::{CustomField, FilterSchema};
use crate::model::{ModelDescriptor, ModelError};
use crate::query::Row;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing filter directive, overridden by `RUST_LOG` (default: "info")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// CORS allowed origins; empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
}

/// One exposed resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub model: ModelDescriptor,

    /// Fields offered as filters
    #[serde(default)]
    pub filterable: Vec<String>,

    #[serde(default)]
    pub custom_fields: Vec<CustomField>,

    /// Search handler for custom fields without a predicate
    #[serde(default)]
    pub search_method: Option<String>,

    /// Rows loaded at startup
    #[serde(default)]
    pub seed: Vec<Row>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            cors_origins: Vec::new(),
            resources: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration JSON
    pub fn parse(content: &str) -> ConfigResult<Self> {
        let config: ServiceConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".to_string()));
        }

        let mut names = HashSet::new();
        for resource in &self.resources {
            resource.validate()?;
            if !names.insert(resource.model.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate resource: {}",
                    resource.model.name
                )));
            }
        }

        Ok(())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ResourceConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let model = &self.model;
        model.validate()?;

        for field in &self.filterable {
            if !model.has_field(field) {
                return Err(ConfigError::Invalid(format!(
                    "{}: filterable field {} is not a model field",
                    model.name, field
                )));
            }
            if is_base_param(field) || is_base_param(&camel(field)) {
                return Err(ConfigError::Invalid(format!(
                    "{}: filterable field {} is shadowed by a base parameter",
                    model.name, field
                )));
            }
        }

        let mut custom_names = HashSet::new();
        for custom in &self.custom_fields {
            if is_base_param(&custom.name)
                || is_base_param(&camel(&custom.name))
                || model.has_field(&custom.name)
                || !custom_names.insert(custom.name.as_str())
            {
                return Err(ConfigError::Invalid(format!(
                    "{}: custom field {} clashes with another parameter",
                    model.name, custom.name
                )));
            }
            if let Some(missing) = custom
                .referenced_fields()
                .into_iter()
                .find(|f| !model.has_field(f))
            {
                return Err(ConfigError::Invalid(format!(
                    "{}: custom field {} references unknown field {}",
                    model.name, custom.name, missing
                )));
            }
        }

        Ok(())
    }

    /// Synthesise the resource's filter schema
    pub fn schema(&self) -> FilterSchema {
        FilterSchema::build(
            &self.model,
            &self.filterable,
            self.custom_fields.clone(),
            self.search_method.as_deref(),
        )
    }
}
