//! Exclusive owner of a mosaic canvas.

use image::imageops::{self, FilterType};
use image::RgbImage;

use super::compress::AdaptiveCompressor;
use super::error::MosaicError;
use crate::codec::{self, decode_rgb, EncodedImage, ImageFormat};
use crate::config::CompressionConfig;
use crate::grid::GridPlan;

/// How [`MosaicBuilder::finish`] encodes the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoding {
    /// Lossless PNG
    Png,
    /// JPEG at a fixed quality
    Jpeg(u8),
    /// JPEG searched down to the configured byte budget
    Adaptive(CompressionConfig),
}

/// A black RGB canvas divided into equal cells, filled one tile at a time.
///
/// Tiles whose decoded size differs from the cell are resized to fit.
/// Cells that never receive a tile stay black.
pub struct MosaicBuilder {
    canvas: RgbImage,
    rows: u32,
    cols: u32,
    cell_width: u32,
    cell_height: u32,
    filter: FilterType,
    placed: usize,
}

impl MosaicBuilder {
    /// Allocates a `rows × cols` canvas of `cell_width × cell_height` cells.
    pub fn new(
        rows: u32,
        cols: u32,
        cell_width: u32,
        cell_height: u32,
    ) -> Result<Self, MosaicError> {
        let width = cols as u64 * cell_width as u64;
        let height = rows as u64 * cell_height as u64;
        let too_large = || MosaicError::CanvasTooLarge { width, height };

        if width == 0 || height == 0 {
            return Err(too_large());
        }
        let w = u32::try_from(width).map_err(|_| too_large())?;
        let h = u32::try_from(height).map_err(|_| too_large())?;
        // RgbImage indexes its buffer with usize; guard 32-bit hosts.
        let bytes = width
            .checked_mul(height)
            .and_then(|px| px.checked_mul(3))
            .ok_or_else(too_large)?;
        usize::try_from(bytes).map_err(|_| too_large())?;

        Ok(Self {
            canvas: RgbImage::new(w, h),
            rows,
            cols,
            cell_width,
            cell_height,
            filter: FilterType::Nearest,
            placed: 0,
        })
    }

    /// Full-resolution canvas for `plan`.
    pub fn for_plan(plan: &GridPlan) -> Result<Self, MosaicError> {
        Self::new(
            plan.num_rows(),
            plan.num_cols(),
            plan.cropped_tile_width(),
            plan.cropped_tile_height(),
        )
    }

    /// Canvas for `plan` with every cell uniformly scaled by `factor`.
    ///
    /// Tiles are smoothed on the way down instead of nearest-sampled.
    pub fn scaled_for_plan(plan: &GridPlan, factor: f64) -> Result<Self, MosaicError> {
        let mut builder = Self::new(
            plan.num_rows(),
            plan.num_cols(),
            codec::scaled_dimension(plan.cropped_tile_width(), factor),
            codec::scaled_dimension(plan.cropped_tile_height(), factor),
        )?;
        builder.filter = FilterType::Triangle;
        Ok(builder)
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    /// Number of tiles pasted so far.
    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn canvas(&self) -> &RgbImage {
        &self.canvas
    }

    /// Decodes `bytes` and pastes the tile into cell `(row, col)`.
    pub fn place_tile(&mut self, row: u32, col: u32, bytes: &[u8]) -> Result<(), MosaicError> {
        self.check_cell(row, col)?;
        let tile = decode_rgb(bytes)?;
        self.place_image(row, col, &tile)
    }

    /// Pastes an already decoded tile into cell `(row, col)`.
    pub fn place_image(
        &mut self,
        row: u32,
        col: u32,
        tile: &RgbImage,
    ) -> Result<(), MosaicError> {
        self.check_cell(row, col)?;

        let x = col as i64 * self.cell_width as i64;
        let y = row as i64 * self.cell_height as i64;

        if tile.dimensions() == (self.cell_width, self.cell_height) {
            imageops::replace(&mut self.canvas, tile, x, y);
        } else {
            let fitted = imageops::resize(tile, self.cell_width, self.cell_height, self.filter);
            imageops::replace(&mut self.canvas, &fitted, x, y);
        }

        self.placed += 1;
        Ok(())
    }

    fn check_cell(&self, row: u32, col: u32) -> Result<(), MosaicError> {
        if row >= self.rows || col >= self.cols {
            return Err(MosaicError::TileOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Releases the canvas without encoding it.
    pub fn into_canvas(self) -> RgbImage {
        self.canvas
    }

    /// Encodes the canvas, consuming the builder.
    pub fn finish(self, encoding: &Encoding) -> Result<EncodedImage, MosaicError> {
        let encoded = match encoding {
            Encoding::Png => codec::encode(&self.canvas, ImageFormat::Png, 0)?,
            Encoding::Jpeg(quality) => codec::encode(&self.canvas, ImageFormat::Jpeg, *quality)?,
            Encoding::Adaptive(config) => {
                AdaptiveCompressor::new(config.clone()).compress(
                    &self.canvas,
                    config.target_bytes(),
                    config.start_quality(),
                )?
            }
        };
        Ok(encoded)
    }
}
