//! Grid planning configuration.

use super::defaults::{
    DEFAULT_CROP_BOTTOM_PX, DEFAULT_MAX_TILES, DEFAULT_RESOLUTION_M, DEFAULT_SCALE,
    DEFAULT_TILE_SIZE_PX, DEFAULT_ZOOM,
};

/// Parameters that fix the tile grid for a region.
///
/// # Example
///
/// ```
/// use mapstitch::config::GridConfig;
///
/// let config = GridConfig::new().with_zoom(18).with_crop_bottom_px(0);
/// assert_eq!(config.zoom(), 18);
/// assert_eq!(config.tile_size_px(), 640);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    zoom: u8,
    tile_size_px: u32,
    scale: u32,
    crop_bottom_px: u32,
    resolution_m: f64,
    max_tiles: usize,
}

impl GridConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    /// Nominal tile edge requested from the provider.
    pub fn with_tile_size_px(mut self, size: u32) -> Self {
        self.tile_size_px = size;
        self
    }

    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = scale;
        self
    }

    /// Rows cropped off the bottom of each post-scale tile.
    pub fn with_crop_bottom_px(mut self, crop: u32) -> Self {
        self.crop_bottom_px = crop;
        self
    }

    /// Ground metres covered by one tile; fixes the row and column counts.
    pub fn with_resolution_m(mut self, resolution: f64) -> Self {
        self.resolution_m = resolution;
        self
    }

    /// Upper bound on `rows * cols`; larger regions are rejected when planned.
    pub fn with_max_tiles(mut self, max_tiles: usize) -> Self {
        self.max_tiles = max_tiles;
        self
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn tile_size_px(&self) -> u32 {
        self.tile_size_px
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn crop_bottom_px(&self) -> u32 {
        self.crop_bottom_px
    }

    pub fn resolution_m(&self) -> f64 {
        self.resolution_m
    }

    pub fn max_tiles(&self) -> usize {
        self.max_tiles
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            tile_size_px: DEFAULT_TILE_SIZE_PX,
            scale: DEFAULT_SCALE,
            crop_bottom_px: DEFAULT_CROP_BOTTOM_PX,
            resolution_m: DEFAULT_RESOLUTION_M,
            max_tiles: DEFAULT_MAX_TILES,
        }
    }
}
