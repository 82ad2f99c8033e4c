//! Offline provider that synthesises tiles instead of calling a server.

use image::{Rgb, RgbImage};

use super::types::{ProviderError, TileProvider, TileQuery};
use crate::codec::encode_jpeg;

const DRY_RUN_QUALITY: u8 = 85;

/// Produces a flat-coloured JPEG per tile, coloured by its grid position.
///
/// Images have the full post-scale size, so cropping and assembly behave as
/// they would with real imagery.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunProvider;

impl DryRunProvider {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic colour for a grid cell.
    pub fn tile_color(row: u32, col: u32) -> Rgb<u8> {
        let (r, c) = (row as u64, col as u64);
        Rgb([
            ((r * 53 + c * 97) % 256) as u8,
            ((r * 91 + c * 29) % 256) as u8,
            ((r * 17 + c * 71) % 256) as u8,
        ])
    }
}

impl TileProvider for DryRunProvider {
    fn fetch_tile(&self, query: &TileQuery) -> Result<Vec<u8>, ProviderError> {
        let edge = query.size_px.saturating_mul(query.scale).max(1);
        let img = RgbImage::from_pixel(edge, edge, Self::tile_color(query.row, query.col));
        encode_jpeg(&img, DRY_RUN_QUALITY)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    fn name(&self) -> &str {
        "Dry Run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_rgb;

    #[test]
    fn test_tile_has_post_scale_size() {
        let query = TileQuery {
            row: 3,
            col: 4,
            lat: 0.0,
            lon: 0.0,
            zoom: 19,
            size_px: 32,
            scale: 2,
        };
        let bytes = DryRunProvider::new().fetch_tile(&query).unwrap();
        let img = decode_rgb(&bytes).unwrap();
        assert_eq!(img.dimensions(), (64, 64));
    }

    #[test]
    fn test_colors_differ_between_neighbours() {
        assert_ne!(DryRunProvider::tile_color(0, 0), DryRunProvider::tile_color(0, 1));
        assert_ne!(DryRunProvider::tile_color(0, 0), DryRunProvider::tile_color(1, 0));
        assert_eq!(DryRunProvider::tile_color(2, 5), DryRunProvider::tile_color(2, 5));
    }
}
