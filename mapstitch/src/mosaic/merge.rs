//! Combining tile-data dumps into one mosaic.
//!
//! Dumps are stacked vertically in the order given: each dump's rows start
//! below the previous dump's last row. Cell size comes from the first tile
//! found, so every dump must have been fetched with the same grid settings.

use tracing::{info, warn};

use super::builder::MosaicBuilder;
use super::error::MosaicError;
use crate::codec::decode_rgb;
use crate::output::TileDump;

/// Places every tile of `dumps` on a shared canvas.
pub fn merge_dumps(dumps: &[TileDump]) -> Result<MosaicBuilder, MosaicError> {
    let first = dumps
        .iter()
        .flat_map(|d| d.tiles.iter())
        .find_map(|t| t.image_bytes.as_deref())
        .ok_or(MosaicError::NothingToMerge)?;
    let (cell_width, cell_height) = decode_rgb(first)?.dimensions();

    let total_rows: u32 = dumps.iter().map(TileDump::span_rows).sum();
    let cols = dumps
        .iter()
        .map(|d| {
            let widest = d.tiles.iter().map(|t| t.col + 1).max().unwrap_or(0);
            d.cols.max(widest)
        })
        .max()
        .unwrap_or(0);

    info!(
        dumps = dumps.len(),
        rows = total_rows,
        cols,
        cell_width,
        cell_height,
        "Merging tile data"
    );

    let mut builder = MosaicBuilder::new(total_rows, cols, cell_width, cell_height)?;
    let mut row_offset = 0;

    for dump in dumps {
        for tile in &dump.tiles {
            let Some(bytes) = &tile.image_bytes else {
                continue;
            };
            let row = row_offset + tile.row;
            if let Err(e) = builder.place_tile(row, tile.col, bytes) {
                warn!(row, col = tile.col, error = %e, "Could not merge tile");
            }
        }
        row_offset += dump.span_rows();
    }

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_png;
    use crate::grid::TileResult;
    use image::{Rgb, RgbImage};

    fn tile(color: [u8; 3]) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(5, 3, Rgb(color))).unwrap()
    }

    #[test]
    fn test_dumps_stack_vertically() {
        let top = TileDump {
            rows: 1,
            cols: 2,
            tiles: vec![TileResult::present(0, 1, tile([255, 0, 0]))],
        };
        let bottom = TileDump {
            rows: 2,
            cols: 2,
            tiles: vec![TileResult::present(1, 0, tile([0, 255, 0]))],
        };

        let builder = merge_dumps(&[top, bottom]).unwrap();

        assert_eq!((builder.width(), builder.height()), (10, 9));
        assert_eq!(builder.placed(), 2);
        let canvas = builder.into_canvas();
        assert_eq!(*canvas.get_pixel(5, 0), Rgb([255, 0, 0]));
        // Bottom dump row 1 lands on global row 2.
        assert_eq!(*canvas.get_pixel(0, 6), Rgb([0, 255, 0]));
        assert_eq!(*canvas.get_pixel(0, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_header_less_dump_uses_tile_extent() {
        let dump = TileDump {
            rows: 0,
            cols: 0,
            tiles: vec![TileResult::present(2, 3, tile([1, 1, 1]))],
        };
        let builder = merge_dumps(&[dump]).unwrap();
        assert_eq!((builder.width(), builder.height()), (20, 9));
    }

    #[test]
    fn test_nothing_to_merge() {
        let empty = TileDump {
            rows: 3,
            cols: 3,
            tiles: Vec::new(),
        };
        assert!(matches!(
            merge_dumps(&[empty]),
            Err(MosaicError::NothingToMerge)
        ));
        assert!(matches!(merge_dumps(&[]), Err(MosaicError::NothingToMerge)));
    }
}
