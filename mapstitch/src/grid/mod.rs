//! Tile grid planning.
//!
//! Lays a `num_rows × num_cols` grid of tiles over a [`Region`], centred on
//! the region's centroid. Row 0 is the northern edge and column 0 the
//! western edge. Neighbouring tile centres are one nominal tile size apart
//! in world pixel space at the configured zoom.

mod types;

pub use types::{GridPlan, TileRequest, TileResult};

use tracing::debug;

use crate::config::GridConfig;
use crate::coord::{lat_lon_to_pixel, pixel_to_lat_lon, CoordError, Region, MAX_ZOOM};

/// Turns a region into a grid plan and its tile requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridPlanner {
    config: GridConfig,
}

impl GridPlanner {
    pub fn new(config: GridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Plans the tile grid for `region`.
    ///
    /// Requests come back in row-major order, so `requests[r * num_cols + c]`
    /// is the tile at `(r, c)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured zoom is out of range, the grid
    /// would exceed the configured tile limit, or the region's centre cannot
    /// be projected.
    pub fn plan(&self, region: &Region) -> Result<(GridPlan, Vec<TileRequest>), CoordError> {
        let zoom = self.config.zoom();
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }

        let resolution = self.config.resolution_m();
        let num_cols = grid_dimension(region.width_m(), resolution);
        let num_rows = grid_dimension(region.height_m(), resolution);

        let max_tiles = self.config.max_tiles();
        if num_rows as u64 * num_cols as u64 > max_tiles as u64 {
            return Err(CoordError::GridTooLarge {
                rows: num_rows,
                cols: num_cols,
                max_tiles,
            });
        }

        let plan = GridPlan::new(
            num_rows,
            num_cols,
            zoom,
            self.config.tile_size_px(),
            self.config.scale(),
            self.config.crop_bottom_px(),
        );

        let center = lat_lon_to_pixel(region.center_lat(), region.center_lon(), zoom)?;
        let tile_px = plan.tile_size_px() as f64;
        let mid_row = (plan.num_rows() as f64 - 1.0) / 2.0;
        let mid_col = (plan.num_cols() as f64 - 1.0) / 2.0;

        let mut requests = Vec::with_capacity(plan.total_tiles());
        for row in 0..plan.num_rows() {
            let dy = (row as f64 - mid_row) * tile_px;
            for col in 0..plan.num_cols() {
                let dx = (col as f64 - mid_col) * tile_px;
                let (lat, lon) = pixel_to_lat_lon(center.offset(dx, dy), zoom);
                requests.push(TileRequest { row, col, lat, lon });
            }
        }

        debug!(
            rows = plan.num_rows(),
            cols = plan.num_cols(),
            zoom,
            mosaic_width = plan.mosaic_width(),
            mosaic_height = plan.mosaic_height(),
            "Planned tile grid"
        );

        Ok((plan, requests))
    }
}

/// `max(1, floor(extent / resolution))`
fn grid_dimension(extent_m: f64, resolution_m: f64) -> u32 {
    let cells = (extent_m / resolution_m).floor();
    if cells.is_finite() && cells >= 1.0 {
        cells.min(u32::MAX as f64) as u32
    } else {
        1
    }
}
