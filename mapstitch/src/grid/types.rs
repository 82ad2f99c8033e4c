//! Grid plan and per-tile records.

use crate::provider::TileQuery;

/// Fixed layout of a region's tile grid.
///
/// Produced once by [`super::GridPlanner`]; every later stage reads it and
/// none may change it. Pixel sizes refer to the cropped, post-scale tiles
/// that get pasted into the mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlan {
    num_rows: u32,
    num_cols: u32,
    zoom: u8,
    tile_size_px: u32,
    scale: u32,
    crop_bottom_px: u32,
}

impl GridPlan {
    pub fn new(
        num_rows: u32,
        num_cols: u32,
        zoom: u8,
        tile_size_px: u32,
        scale: u32,
        crop_bottom_px: u32,
    ) -> Self {
        Self {
            num_rows: num_rows.max(1),
            num_cols: num_cols.max(1),
            zoom,
            tile_size_px: tile_size_px.max(1),
            scale: scale.max(1),
            crop_bottom_px,
        }
    }

    pub fn num_rows(&self) -> u32 {
        self.num_rows
    }

    pub fn num_cols(&self) -> u32 {
        self.num_cols
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

    pub fn total_tiles(&self) -> usize {
        self.num_rows as usize * self.num_cols as usize
    }

    /// Width of a tile as delivered by the provider (`tile_size_px * scale`).
    pub fn cropped_tile_width(&self) -> u32 {
        self.tile_size_px.saturating_mul(self.scale)
    }

    /// Height left after the watermark crop, never below one row.
    pub fn cropped_tile_height(&self) -> u32 {
        self.tile_size_px
            .saturating_mul(self.scale)
            .saturating_sub(self.crop_bottom_px)
            .max(1)
    }

    pub fn mosaic_width(&self) -> u64 {
        self.num_cols as u64 * self.cropped_tile_width() as u64
    }

    pub fn mosaic_height(&self) -> u64 {
        self.num_rows as u64 * self.cropped_tile_height() as u64
    }

    /// Uncompressed RGB size of the full-resolution mosaic.
    pub fn estimated_bytes(&self) -> u64 {
        self.mosaic_width()
            .saturating_mul(self.mosaic_height())
            .saturating_mul(3)
    }

    /// Whether `(row, col)` lies inside the grid.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.num_rows && col < self.num_cols
    }

    /// Slices `requests` to the index range `[start, end)` for a federated run.
    ///
    /// `end = None` means through the last request. Both bounds are clamped
    /// to the list, so an out-of-range start yields an empty slice.
    pub fn select_range(
        requests: &[TileRequest],
        start: usize,
        end: Option<usize>,
    ) -> &[TileRequest] {
        let end = end.unwrap_or(requests.len()).min(requests.len());
        let start = start.min(end);
        &requests[start..end]
    }
}

/// One tile to fetch: its grid cell and the geographic centre to request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRequest {
    pub row: u32,
    pub col: u32,
    pub lat: f64,
    pub lon: f64,
}

impl TileRequest {
    /// Provider query for this tile under `plan`.
    pub fn query(&self, plan: &GridPlan) -> TileQuery {
        TileQuery {
            row: self.row,
            col: self.col,
            lat: self.lat,
            lon: self.lon,
            zoom: plan.zoom(),
            size_px: plan.tile_size_px(),
            scale: plan.scale(),
        }
    }
}

/// Outcome of fetching one tile.
///
/// `image_bytes` is `None` when the fetch failed for good; the tile's cell
/// stays black in the mosaic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileResult {
    pub row: u32,
    pub col: u32,
    pub image_bytes: Option<Vec<u8>>,
}

impl TileResult {
    pub fn present(row: u32, col: u32, bytes: Vec<u8>) -> Self {
        Self {
            row,
            col,
            image_bytes: Some(bytes),
        }
    }

    pub fn missing(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            image_bytes: None,
        }
    }

    /// Placeholder result for a request that never produced data.
    pub fn missing_for(request: &TileRequest) -> Self {
        Self::missing(request.row, request.col)
    }

    pub fn is_present(&self) -> bool {
        self.image_bytes.is_some()
    }
}
