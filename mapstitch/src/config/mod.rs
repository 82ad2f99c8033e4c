//! Configuration for the mapstitch pipeline.
//!
//! Each stage takes a small typed config with `with_*` setters and defaults
//! from [`defaults`]. [`ConfigFile`] fills all of them from
//! `~/.mapstitch/config.ini`.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use mapstitch::config::{FetchConfig, GridConfig};
//!
//! let grid = GridConfig::new().with_zoom(18);
//! let fetch = FetchConfig::new().with_request_delay(Duration::ZERO);
//! assert_eq!(grid.zoom(), 18);
//! assert_eq!(fetch.max_attempts(), 3);
//! ```

mod credential;
pub mod defaults;
mod distribute;
mod fetch;
mod file;
mod grid;
mod mosaic;
mod parser;
mod size;

pub use credential::{resolve_credential, resolve_credential_with};
pub use defaults::*;
pub use distribute::DistributeConfig;
pub use fetch::FetchConfig;
pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, LoggingSettings,
    ProviderSettings,
};
pub use grid::GridConfig;
pub use mosaic::{CompressionConfig, MosaicConfig};
pub use size::{format_mib, format_size, parse_size, SizeParseError};
