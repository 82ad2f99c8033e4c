//! Mosaic assembly and compression configuration.

use super::defaults::{
    DEFAULT_CHUNK_ROWS, DEFAULT_DIRECT_THRESHOLD_BYTES, DEFAULT_DOWNSCALE_QUALITY,
    DEFAULT_FALLBACK_QUALITIES, DEFAULT_FALLBACK_QUALITY, DEFAULT_FALLBACK_SCALE,
    DEFAULT_MAX_DOWNSCALE, DEFAULT_MAX_PRESCALE, DEFAULT_OVERSIZE_FACTOR, DEFAULT_PIXELS_PER_MIB,
    DEFAULT_PRESCALE_BUDGET_BYTES, DEFAULT_PROGRESSIVE_QUALITY, DEFAULT_START_QUALITY,
    DEFAULT_TARGET_BYTES,
};

/// Strategy thresholds for [`crate::mosaic::MosaicAssembler`].
///
/// # Example
///
/// ```
/// use mapstitch::config::MosaicConfig;
///
/// let config = MosaicConfig::new().with_direct_threshold_bytes(1024);
/// assert_eq!(config.direct_threshold_bytes(), 1024);
/// assert_eq!(config.chunk_rows(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicConfig {
    direct_threshold_bytes: u64,
    chunk_rows: u32,
    progressive_quality: u8,
    prescale_budget_bytes: u64,
    max_prescale: f64,
}

impl MosaicConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimated canvas size above which assembly goes progressive.
    pub fn with_direct_threshold_bytes(mut self, bytes: u64) -> Self {
        self.direct_threshold_bytes = bytes;
        self
    }

    /// Grid rows per progressive chunk. Clamped to at least 1.
    pub fn with_chunk_rows(mut self, rows: u32) -> Self {
        self.chunk_rows = rows.max(1);
        self
    }

    pub fn with_progressive_quality(mut self, quality: u8) -> Self {
        self.progressive_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_prescale_budget_bytes(mut self, bytes: u64) -> Self {
        self.prescale_budget_bytes = bytes;
        self
    }

    pub fn with_max_prescale(mut self, scale: f64) -> Self {
        self.max_prescale = scale;
        self
    }

    pub fn direct_threshold_bytes(&self) -> u64 {
        self.direct_threshold_bytes
    }

    pub fn chunk_rows(&self) -> u32 {
        self.chunk_rows
    }

    pub fn progressive_quality(&self) -> u8 {
        self.progressive_quality
    }

    pub fn prescale_budget_bytes(&self) -> u64 {
        self.prescale_budget_bytes
    }

    pub fn max_prescale(&self) -> f64 {
        self.max_prescale
    }

    /// Per-tile scale factor for a canvas estimated at `estimated_bytes`.
    pub fn prescale_factor(&self, estimated_bytes: u64) -> f64 {
        if estimated_bytes == 0 {
            return self.max_prescale;
        }
        let ratio = self.prescale_budget_bytes as f64 / estimated_bytes as f64;
        self.max_prescale.min(ratio.sqrt())
    }
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            direct_threshold_bytes: DEFAULT_DIRECT_THRESHOLD_BYTES,
            chunk_rows: DEFAULT_CHUNK_ROWS,
            progressive_quality: DEFAULT_PROGRESSIVE_QUALITY,
            prescale_budget_bytes: DEFAULT_PRESCALE_BUDGET_BYTES,
            max_prescale: DEFAULT_MAX_PRESCALE,
        }
    }
}

/// Budget and search ladder for [`crate::mosaic::AdaptiveCompressor`].
///
/// # Example
///
/// ```
/// use mapstitch::config::CompressionConfig;
///
/// let config = CompressionConfig::default();
/// assert_eq!(config.ladder(75), vec![75, 60, 45]);
/// assert_eq!(config.ladder(50), vec![50, 45]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionConfig {
    target_bytes: u64,
    start_quality: u8,
    fallback_qualities: Vec<u8>,
    oversize_factor: f64,
    pixels_per_mib: f64,
    max_downscale: f64,
    downscale_quality: u8,
    fallback_scale: f64,
    fallback_quality: u8,
}

impl CompressionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_bytes(mut self, bytes: u64) -> Self {
        self.target_bytes = bytes;
        self
    }

    pub fn with_start_quality(mut self, quality: u8) -> Self {
        self.start_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_fallback_qualities(mut self, qualities: Vec<u8>) -> Self {
        self.fallback_qualities = qualities;
        self
    }

    pub fn with_oversize_factor(mut self, factor: f64) -> Self {
        self.oversize_factor = factor;
        self
    }

    pub fn with_pixels_per_mib(mut self, pixels: f64) -> Self {
        self.pixels_per_mib = pixels;
        self
    }

    pub fn with_max_downscale(mut self, scale: f64) -> Self {
        self.max_downscale = scale;
        self
    }

    pub fn with_downscale_quality(mut self, quality: u8) -> Self {
        self.downscale_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_fallback_scale(mut self, scale: f64) -> Self {
        self.fallback_scale = scale;
        self
    }

    pub fn with_fallback_quality(mut self, quality: u8) -> Self {
        self.fallback_quality = quality.clamp(1, 100);
        self
    }

    pub fn target_bytes(&self) -> u64 {
        self.target_bytes
    }

    pub fn start_quality(&self) -> u8 {
        self.start_quality
    }

    pub fn oversize_factor(&self) -> f64 {
        self.oversize_factor
    }

    pub fn pixels_per_mib(&self) -> f64 {
        self.pixels_per_mib
    }

    pub fn max_downscale(&self) -> f64 {
        self.max_downscale
    }

    pub fn downscale_quality(&self) -> u8 {
        self.downscale_quality
    }

    pub fn fallback_scale(&self) -> f64 {
        self.fallback_scale
    }

    pub fn fallback_quality(&self) -> u8 {
        self.fallback_quality
    }

    /// Qualities to try for a search starting at `start`.
    ///
    /// Fallback rungs at or above `start` are skipped so the ladder strictly
    /// descends.
    pub fn ladder(&self, start: u8) -> Vec<u8> {
        let mut ladder = vec![start];
        let mut last = start;
        for &quality in &self.fallback_qualities {
            if quality < last {
                ladder.push(quality);
                last = quality;
            }
        }
        ladder
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            target_bytes: DEFAULT_TARGET_BYTES,
            start_quality: DEFAULT_START_QUALITY,
            fallback_qualities: DEFAULT_FALLBACK_QUALITIES.to_vec(),
            oversize_factor: DEFAULT_OVERSIZE_FACTOR,
            pixels_per_mib: DEFAULT_PIXELS_PER_MIB,
            max_downscale: DEFAULT_MAX_DOWNSCALE,
            downscale_quality: DEFAULT_DOWNSCALE_QUALITY,
            fallback_scale: DEFAULT_FALLBACK_SCALE,
            fallback_quality: DEFAULT_FALLBACK_QUALITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prescale_factor_capped() {
        let config = MosaicConfig::default();
        // Budget exceeds the estimate: the cap wins.
        assert_eq!(config.prescale_factor(1024), 0.4);

        let estimated = config.prescale_budget_bytes() * 100;
        let factor = config.prescale_factor(estimated);
        assert!((factor - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_ladder_skips_rungs_above_start() {
        let config = CompressionConfig::default();
        assert_eq!(config.ladder(92), vec![92, 60, 45]);
        assert_eq!(config.ladder(60), vec![60, 45]);
        assert_eq!(config.ladder(40), vec![40]);
    }
}
