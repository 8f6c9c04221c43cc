//! Error types for the script runner
//!
//! Two families matter to callers: `InvalidScript` is a problem with a test
//! file and is reported as a failed test, everything else is a fault in the
//! runner or the driver and aborts the run.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the script runner
#[derive(Error, Debug)]
pub enum Error {
    // === Script Errors ===
    #[error("Invalid script '{path}': {reason}")]
    InvalidScript { path: String, reason: String },

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Driver Errors ===
    #[error("Command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Driver '{0}' cannot take screenshots")]
    ScreenshotUnsupported(String),

    // === Report Errors ===
    #[error("Cannot create report file '{path}': {source}")]
    ReportCreate {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("No test suite is active on this worker")]
    NoActiveSuite,

    // === Command Outcome Errors ===
    #[error("{0}")]
    Command(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Runtime Errors ===
    #[error("A worker thread panicked")]
    WorkerPanicked,

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid script error for a file
    pub fn invalid_script(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidScript {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Create a command failed error, used by drivers for per-command faults
    pub fn command_failed(command: &str, message: &str) -> Self {
        Self::CommandFailed {
            command: command.to_string(),
            message: message.to_string(),
        }
    }

    /// Whether the error came from a malformed test script
    pub fn is_invalid_script(&self) -> bool {
        matches!(self, Self::InvalidScript { .. })
    }

    /// Short kind name used as the `type` attribute in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidScript { .. } => "InvalidScript",
            Error::FileRead { .. } => "FileRead",
            Error::CommandFailed { .. } => "CommandFailed",
            Error::Driver(_) => "DriverError",
            Error::ScreenshotUnsupported(_) => "ScreenshotUnsupported",
            Error::ReportCreate { .. } => "ReportCreate",
            Error::NoActiveSuite => "NoActiveSuite",
            Error::Command(_) => "CommandError",
            Error::Config(_) | Error::ConfigParse(_) => "ConfigError",
            Error::WorkerPanicked => "WorkerPanicked",
            Error::Io(_) => "IoError",
        }
    }
}
