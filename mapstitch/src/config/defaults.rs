//! Default values for every configuration setting.
//!
//! The fetch and assembly constants are tuning values rather than contracts;
//! each one can be overridden through `config.ini` or the typed builders.

use std::time::Duration;

// =============================================================================
// Provider
// =============================================================================

/// Static map endpoint used when `[provider] base_url` is not set.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Environment variables consulted for the provider credential, in order.
pub const CREDENTIAL_ENV_VARS: [&str; 2] = ["GMAPS_KEY", "GOOGLE_MAPS_API_KEY"];

// =============================================================================
// Grid
// =============================================================================

/// Zoom level requested from the provider.
pub const DEFAULT_ZOOM: u8 = 19;

/// Nominal tile edge in pixels, before the provider's scale factor.
pub const DEFAULT_TILE_SIZE_PX: u32 = 640;

/// Provider-side upscaling factor.
pub const DEFAULT_SCALE: u32 = 2;

/// Rows removed from the bottom of each tile to drop the watermark band.
pub const DEFAULT_CROP_BOTTOM_PX: u32 = 40;

/// Approximate ground coverage of one tile, in metres.
pub const DEFAULT_RESOLUTION_M: f64 = 100.0;

/// Largest grid a single region may plan to.
pub const DEFAULT_MAX_TILES: usize = 1_000_000;

// =============================================================================
// Fetch
// =============================================================================

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// JPEG quality used when re-encoding a cropped tile.
pub const DEFAULT_TILE_QUALITY: u8 = 95;

/// Lower tile quality for large regions, to keep worker payloads small.
pub const DEFAULT_BULK_TILE_QUALITY: u8 = 60;

/// Tile count from which [`DEFAULT_BULK_TILE_QUALITY`] applies.
pub const DEFAULT_BULK_TILE_THRESHOLD: usize = 50;

/// Progress is logged every this many tiles.
pub const PROGRESS_LOG_INTERVAL: usize = 10;

/// Tiles in flight at once within one partition.
pub const DEFAULT_CONCURRENCY: usize = 1;

// =============================================================================
// Distribution
// =============================================================================

/// Tiles fetched per sequential batch when no workers are configured.
pub const DEFAULT_LOCAL_BATCH_SIZE: usize = 50;

/// Number of in-process workers; zero means sequential local batches.
pub const DEFAULT_WORKERS: usize = 0;

// =============================================================================
// Mosaic
// =============================================================================

const MIB: u64 = 1024 * 1024;

/// Estimated canvas size above which progressive assembly is used.
pub const DEFAULT_DIRECT_THRESHOLD_BYTES: u64 = 500 * MIB;

/// Grid rows placed per progressive chunk.
pub const DEFAULT_CHUNK_ROWS: u32 = 10;

/// JPEG quality for uncompressed progressive output.
pub const DEFAULT_PROGRESSIVE_QUALITY: u8 = 92;

/// Canvas budget for pre-scaled progressive assembly.
pub const DEFAULT_PRESCALE_BUDGET_BYTES: u64 = 800 * MIB;

/// Upper bound on the per-tile pre-scale factor.
pub const DEFAULT_MAX_PRESCALE: f64 = 0.4;

// =============================================================================
// Compression
// =============================================================================

pub const DEFAULT_TARGET_BYTES: u64 = 100 * MIB;
pub const DEFAULT_START_QUALITY: u8 = 75;

/// Lower rungs of the quality ladder, tried after the start quality.
pub const DEFAULT_FALLBACK_QUALITIES: [u8; 2] = [60, 45];

/// Estimate/target ratio from which the ladder is skipped entirely.
pub const DEFAULT_OVERSIZE_FACTOR: f64 = 20.0;

/// Pixels a MiB of JPEG output is expected to hold.
pub const DEFAULT_PIXELS_PER_MIB: f64 = 500_000.0;

pub const DEFAULT_MAX_DOWNSCALE: f64 = 0.45;
pub const DEFAULT_DOWNSCALE_QUALITY: u8 = 80;

/// Last-resort linear downscale when no ladder rung fits.
pub const DEFAULT_FALLBACK_SCALE: f64 = 0.7;
pub const DEFAULT_FALLBACK_QUALITY: u8 = 75;

// =============================================================================
// Logging
// =============================================================================

/// Log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "mapstitch.log";

// =============================================================================
// Merge
// =============================================================================

/// JPEG quality of a mosaic merged from tile-data dumps.
pub const DEFAULT_MERGE_QUALITY: u8 = 90;
