//! mapstitch - Satellite mosaic builder
//!
//! Turns a geographic region into one stitched satellite image. A region is
//! planned as a grid of tiles in Web Mercator space, the tiles are fetched
//! from a static-map provider (optionally spread over several workers), and
//! the results are composited into a single mosaic, compressed to a size
//! budget when asked.
//!
//! # High-Level API
//!
//! For most use cases, [`job::RegionJob`] runs the whole pipeline:
//!
//! ```ignore
//! use mapstitch::config::ConfigFile;
//! use mapstitch::job::{build_provider, JobOptions, RegionJob};
//!
//! let config = ConfigFile::load()?;
//! let provider = build_provider(&config, false)?;
//! let job = RegionJob::from_config(&config, provider);
//!
//! let report = runtime.block_on(job.run(&region, &JobOptions::default()))?;
//! ```

pub mod codec;
pub mod config;
pub mod coord;
pub mod distributor;
pub mod fetch;
pub mod grid;
pub mod input;
pub mod job;
pub mod logging;
pub mod mosaic;
pub mod output;
pub mod provider;

/// Version of the mapstitch library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_coord_module_exists() {
        use crate::coord::lat_lon_to_pixel;
        let result = lat_lon_to_pixel(40.7128, -74.0060, 16);
        assert!(result.is_ok());
    }
}
