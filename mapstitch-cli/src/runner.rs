//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and runtime creation
//! so each command handler starts from the same state.

use std::path::Path;

use tracing::info;

use mapstitch::config::ConfigFile;
use mapstitch::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file; the default location otherwise
    /// * `debug_mode` - When true, defaults to debug-level logging
    pub fn new(config_path: Option<&Path>, debug_mode: bool) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(&config.logging.file, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Mutable access for command-line overrides.
    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("mapstitch v{}", mapstitch::VERSION);
        info!(log_file = %self.config.logging.file.display(), "mapstitch CLI: {} command", command);
    }

    /// Build the multi-threaded runtime that drives the fetch phase.
    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}
