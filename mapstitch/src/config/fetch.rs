//! Tile fetch configuration.

use std::time::Duration;

use super::defaults::{
    DEFAULT_BULK_TILE_QUALITY, DEFAULT_BULK_TILE_THRESHOLD, DEFAULT_CONCURRENCY,
    DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS, DEFAULT_REQUEST_DELAY, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_TILE_QUALITY,
};

/// Retry, pacing and re-encode settings for [`crate::fetch::FetchExecutor`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use mapstitch::config::FetchConfig;
///
/// let config = FetchConfig::default();
/// assert_eq!(config.max_attempts(), 3);
/// assert_eq!(config.initial_backoff(), Duration::from_secs(1));
///
/// let fast = FetchConfig::new()
///     .with_initial_backoff(Duration::ZERO)
///     .with_request_delay(Duration::ZERO);
/// assert_eq!(fast.backoff_for_attempt(2), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchConfig {
    max_attempts: u32,
    initial_backoff: Duration,
    request_delay: Duration,
    request_timeout: Duration,
    tile_quality: u8,
    bulk_tile_quality: u8,
    bulk_tile_threshold: usize,
    concurrency: usize,
}

impl FetchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total attempts per tile, including the first. Clamped to at least 1.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Wait before the first retry; doubled for each later retry.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Fixed pause before every attempt, retry or not.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_tile_quality(mut self, quality: u8) -> Self {
        self.tile_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_bulk_tile_quality(mut self, quality: u8) -> Self {
        self.bulk_tile_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_bulk_tile_threshold(mut self, threshold: usize) -> Self {
        self.bulk_tile_threshold = threshold;
        self
    }

    /// Tiles fetched in parallel by one executor call. Clamped to at least 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    pub fn request_delay(&self) -> Duration {
        self.request_delay
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn tile_quality(&self) -> u8 {
        self.tile_quality
    }

    pub fn bulk_tile_quality(&self) -> u8 {
        self.bulk_tile_quality
    }

    pub fn bulk_tile_threshold(&self) -> usize {
        self.bulk_tile_threshold
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Backoff before retry number `retry` (1-based): `initial * 2^(retry-1)`.
    pub fn backoff_for_attempt(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.initial_backoff.saturating_mul(1 << exponent)
    }

    /// Re-encode quality for a run that fetches `tile_count` tiles.
    pub fn tile_quality_for(&self, tile_count: usize) -> u8 {
        if tile_count >= self.bulk_tile_threshold {
            self.bulk_tile_quality
        } else {
            self.tile_quality
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            request_delay: DEFAULT_REQUEST_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tile_quality: DEFAULT_TILE_QUALITY,
            bulk_tile_quality: DEFAULT_BULK_TILE_QUALITY,
            bulk_tile_threshold: DEFAULT_BULK_TILE_THRESHOLD,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}
