//! Mosaic assembly errors.

use thiserror::Error;

use crate::codec::CodecError;

#[derive(Debug, Error)]
pub enum MosaicError {
    /// Canvas dimensions do not fit an image buffer.
    #[error("mosaic of {width}x{height} pixels is too large to allocate")]
    CanvasTooLarge { width: u64, height: u64 },

    /// A tile addressed a cell outside the grid.
    #[error("tile ({row}, {col}) is outside the {rows}x{cols} grid")]
    TileOutOfRange {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A merge was asked to combine dumps with no tiles at all.
    #[error("no tiles to merge")]
    NothingToMerge,
}
