//! CLI-specific error types
//!
//! Each error carries a stable code string and the process exit status
//! `main` terminates with.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// What stopped the command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration missing, malformed or inconsistent
    ConfigError,
    /// Writing to stdout failed
    IoError,
    /// Seeding, wiring or binding the server failed
    BootFailed,
}

impl CliErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "RESTQUERY_CONFIG_ERROR",
            Self::IoError => "RESTQUERY_IO_ERROR",
            Self::BootFailed => "RESTQUERY_BOOT_FAILED",
        }
    }

    /// Process exit status, `EX_CONFIG` and `EX_IOERR` from sysexits
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::ConfigError => 78,
            Self::IoError => 74,
            Self::BootFailed => 1,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    fn with_code(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::with_code(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::with_code(CliErrorCode::IoError, msg)
    }

    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::with_code(CliErrorCode::BootFailed, msg)
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn exit_status(&self) -> i32 {
        self.code.exit_status()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
