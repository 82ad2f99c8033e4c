//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use mapstitch::config::{ConfigFileError, CREDENTIAL_ENV_VARS};
use mapstitch::job::JobError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(ConfigFileError),
    /// Invalid combination of arguments
    Usage(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// A job failed
    Job(JobError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigFileError::MissingCredential { .. })
            | CliError::Job(JobError::Config(ConfigFileError::MissingCredential { .. })) => {
                eprintln!();
                eprintln!("Provide a Static Maps API key by either:");
                eprintln!("  1. Exporting {}", CREDENTIAL_ENV_VARS.join(" or "));
                eprintln!("  2. Setting api_key under [provider] in config.ini");
                eprintln!("Or pass --dry-run to build a mosaic from synthetic tiles.");
            }
            CliError::Job(JobError::TileData { .. }) => {
                eprintln!();
                eprintln!("Merge expects files written by 'mapstitch run --download-only'.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Job(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Job(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<JobError> for CliError {
    fn from(e: JobError) -> Self {
        CliError::Job(e)
    }
}
