//! Size-bounded JPEG encoding.
//!
//! The search is deterministic and has three stages:
//!
//! 1. Canvases whose raw size exceeds the target by `oversize_factor` are
//!    downscaled straight to a pixel budget and encoded once. A quality
//!    search could never converge for them.
//! 2. Otherwise a descending quality ladder is tried, first fit wins.
//! 3. If no rung fits, a fixed linear downscale is encoded as a last
//!    resort. This stage does not check the budget.

use image::imageops::FilterType;
use image::RgbImage;
use tracing::{debug, info};

use super::error::MosaicError;
use crate::codec::{self, scale_by, EncodedImage, ImageFormat};
use crate::config::{format_mib, CompressionConfig};

const MIB: f64 = 1024.0 * 1024.0;

/// Encodes a canvas as JPEG under a byte budget.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveCompressor {
    config: CompressionConfig,
}

impl AdaptiveCompressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Encodes `canvas` as close to `target_bytes` as the search allows.
    ///
    /// Fails only if the JPEG encoder itself fails.
    pub fn compress(
        &self,
        canvas: &RgbImage,
        target_bytes: u64,
        start_quality: u8,
    ) -> Result<EncodedImage, MosaicError> {
        let (width, height) = canvas.dimensions();
        let pixels = width as u64 * height as u64;
        let raw_bytes = pixels * 3;

        info!(
            width,
            height,
            raw = %format_mib(raw_bytes),
            target = %format_mib(target_bytes),
            "Compressing mosaic"
        );

        if raw_bytes as f64 > self.config.oversize_factor() * target_bytes as f64 {
            let scale = self.oversize_scale(pixels, target_bytes);
            let quality = self.config.downscale_quality();
            info!(scale, quality, "Mosaic far above target, downscaling directly");
            let scaled = scale_by(canvas, scale, FilterType::Triangle);
            return Ok(codec::encode(&scaled, ImageFormat::Jpeg, quality)?);
        }

        for quality in self.config.ladder(start_quality) {
            let encoded = codec::encode(canvas, ImageFormat::Jpeg, quality)?;
            debug!(quality, size = %format_mib(encoded.len() as u64), "Ladder rung encoded");
            if encoded.len() as u64 <= target_bytes {
                info!(quality, size = %format_mib(encoded.len() as u64), "Target met");
                return Ok(encoded);
            }
        }

        let scale = self.config.fallback_scale();
        let quality = self.config.fallback_quality();
        info!(scale, quality, "No quality met the target, applying fallback downscale");
        let scaled = scale_by(canvas, scale, FilterType::Triangle);
        Ok(codec::encode(&scaled, ImageFormat::Jpeg, quality)?)
    }

    /// `min(max_downscale, sqrt(pixel_budget / pixels))`
    fn oversize_scale(&self, pixels: u64, target_bytes: u64) -> f64 {
        let pixel_budget = target_bytes as f64 * self.config.pixels_per_mib() / MIB;
        let ratio = pixel_budget / pixels.max(1) as f64;
        self.config.max_downscale().min(ratio.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// Deterministic noise; compresses poorly so quality matters.
    fn noisy(width: u32, height: u32) -> RgbImage {
        let mut state: u32 = 0x2545_f491;
        RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgb([a, b, c])
        })
    }

    fn jpeg_len(img: &RgbImage, quality: u8) -> usize {
        codec::encode_jpeg(img, quality).unwrap().len()
    }

    #[test]
    fn test_quality_is_monotone() {
        let img = noisy(96, 96);
        let q92 = jpeg_len(&img, 92);
        let q75 = jpeg_len(&img, 75);
        let q60 = jpeg_len(&img, 60);
        let q45 = jpeg_len(&img, 45);
        assert!(q92 >= q75, "{} < {}", q92, q75);
        assert!(q75 >= q60, "{} < {}", q75, q60);
        assert!(q60 >= q45, "{} < {}", q60, q45);
    }

    #[test]
    fn test_first_fitting_rung_wins() {
        let img = noisy(96, 96);
        let q75 = jpeg_len(&img, 75) as u64;
        let q60 = jpeg_len(&img, 60) as u64;
        // Room for q60 but not q75; the factor check must not trigger.
        let target = (q60 + q75) / 2;
        let compressor = AdaptiveCompressor::new(CompressionConfig::new().with_oversize_factor(1e9));

        let encoded = compressor.compress(&img, target, 75).unwrap();

        assert!(encoded.len() as u64 <= target);
        assert_eq!(encoded.len() as u64, q60);
        assert_eq!(encoded.format, ImageFormat::Jpeg);
        assert_eq!((encoded.width, encoded.height), (96, 96));
    }

    #[test]
    fn test_generous_target_keeps_start_quality() {
        let img = noisy(64, 64);
        let compressor = AdaptiveCompressor::default();

        let encoded = compressor.compress(&img, 10 * 1024 * 1024, 75).unwrap();

        assert_eq!(encoded.len(), jpeg_len(&img, 75));
    }

    #[test]
    fn test_unreachable_target_falls_back_to_downscale() {
        let img = noisy(100, 100);
        let compressor = AdaptiveCompressor::new(CompressionConfig::new().with_oversize_factor(1e9));

        let encoded = compressor.compress(&img, 1, 75).unwrap();

        assert_eq!((encoded.width, encoded.height), (70, 70));
    }

    #[test]
    fn test_oversize_canvas_skips_ladder() {
        // 200x200x3 = 120000 bytes raw, target 1000 => 120x over.
        let img = noisy(200, 200);
        let config = CompressionConfig::new().with_pixels_per_mib(1024.0 * 1024.0 * 4.0);
        let compressor = AdaptiveCompressor::new(config);

        let encoded = compressor.compress(&img, 1000, 75).unwrap();

        // Budget is 4000 px: sqrt(4000 / 40000) = 0.316 < 0.45.
        assert_eq!((encoded.width, encoded.height), (63, 63));
    }

    #[test]
    fn test_oversize_scale_is_capped() {
        let compressor = AdaptiveCompressor::default();
        // Huge budget relative to pixel count: the cap applies.
        assert_eq!(compressor.oversize_scale(100, 100 * 1024 * 1024), 0.45);
    }
}
