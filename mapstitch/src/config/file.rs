//! Configuration file handling for ~/.mapstitch/config.ini.
//!
//! A missing file yields defaults; present keys overlay them (see
//! [`super::parser`]).

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::defaults::{DEFAULT_LOG_FILE_NAME, DEFAULT_PROVIDER_BASE_URL};
use super::{CompressionConfig, DistributeConfig, FetchConfig, GridConfig, MosaicConfig};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// No provider credential in the environment or config file
    #[error("No provider API key found (checked {checked} and [provider] api_key)")]
    MissingCredential { checked: String },
}

/// `[provider]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Fallback credential when no environment variable is set
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
        }
    }
}

/// `[logging]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: config_directory().join(DEFAULT_LOG_FILE_NAME),
        }
    }
}

/// Everything read from `config.ini`, already converted to typed configs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub grid: GridConfig,
    pub fetch: FetchConfig,
    pub distribute: DistributeConfig,
    pub mosaic: MosaicConfig,
    pub compression: CompressionConfig,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.mapstitch/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }
}

/// Get the path to the config directory (~/.mapstitch).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mapstitch")
}

/// Get the path to the config file (~/.mapstitch/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert!(config.provider.api_key.is_none());
        assert_eq!(config.provider.base_url, DEFAULT_PROVIDER_BASE_URL);
        assert_eq!(config.grid.zoom(), 19);
        assert_eq!(config.fetch.max_attempts(), 3);
        assert_eq!(config.distribute.local_batch_size(), 50);
        assert_eq!(config.compression.target_bytes(), 100 * 1024 * 1024);
        assert!(config.logging.file.ends_with("mapstitch.log"));
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[provider]\napi_key = abc123\n\n[fetch]\nzoom = 17\nrequest_delay_ms = 0\n",
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.grid.zoom(), 17);
        assert_eq!(config.fetch.request_delay(), Duration::ZERO);
    }
}
