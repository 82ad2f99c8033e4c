//! Strategy selection and tile placement for a region's mosaic.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::builder::{Encoding, MosaicBuilder};
use super::error::MosaicError;
use crate::codec::EncodedImage;
use crate::config::{format_mib, CompressionConfig, MosaicConfig};
use crate::grid::{GridPlan, TileResult};

/// How the canvas is allocated and filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssemblyStrategy {
    /// Results pasted in row-major order into one full canvas.
    Direct,
    /// Results pasted chunk by chunk of grid rows, each tile's bytes
    /// released once it is on the canvas.
    Progressive,
    /// Progressive, with every tile shrunk by `factor` before pasting.
    Prescaled { factor: f64 },
}

/// A finished mosaic and how it was built.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub image: EncodedImage,
    pub strategy: AssemblyStrategy,
    /// Cells that received a tile
    pub placed: usize,
    /// Cells left black
    pub blank: usize,
}

/// Builds and encodes the mosaic for one region.
#[derive(Debug, Clone, Default)]
pub struct MosaicAssembler {
    config: MosaicConfig,
    compression: CompressionConfig,
}

impl MosaicAssembler {
    pub fn new(config: MosaicConfig, compression: CompressionConfig) -> Self {
        Self {
            config,
            compression,
        }
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    /// Picks the strategy for `plan`.
    ///
    /// Small uncompressed mosaics go direct. Compression always assembles
    /// progressively, and pre-scales once the estimate passes the direct
    /// threshold.
    pub fn choose_strategy(&self, plan: &GridPlan, compress: bool) -> AssemblyStrategy {
        let estimated = plan.estimated_bytes();
        let oversized = estimated > self.config.direct_threshold_bytes();

        match (compress, oversized) {
            (false, false) => AssemblyStrategy::Direct,
            (true, true) => AssemblyStrategy::Prescaled {
                factor: self.config.prescale_factor(estimated),
            },
            _ => AssemblyStrategy::Progressive,
        }
    }

    /// Encoding used to finish a canvas built with `strategy`.
    pub fn encoding_for(&self, strategy: AssemblyStrategy, compress: bool) -> Encoding {
        if compress {
            Encoding::Adaptive(self.compression.clone())
        } else if strategy == AssemblyStrategy::Direct {
            Encoding::Png
        } else {
            Encoding::Jpeg(self.config.progressive_quality())
        }
    }

    /// Assembles `results` into an encoded mosaic.
    ///
    /// Missing or undecodable tiles leave their cell black; results outside
    /// the grid are skipped with a warning.
    pub fn assemble(
        &self,
        results: Vec<TileResult>,
        plan: &GridPlan,
        compress: bool,
    ) -> Result<Assembly, MosaicError> {
        let strategy = self.choose_strategy(plan, compress);
        info!(
            rows = plan.num_rows(),
            cols = plan.num_cols(),
            estimated = %format_mib(plan.estimated_bytes()),
            ?strategy,
            compress,
            "Assembling mosaic"
        );

        let builder = self.build(results, plan, strategy)?;
        let placed = builder.placed();
        let blank = plan.total_tiles().saturating_sub(placed);
        let (width, height) = (builder.width(), builder.height());

        let image = builder.finish(&self.encoding_for(strategy, compress))?;

        info!(
            width,
            height,
            placed,
            blank,
            format = %image.format,
            size = %format_mib(image.len() as u64),
            "Mosaic encoded"
        );

        Ok(Assembly {
            image,
            strategy,
            placed,
            blank,
        })
    }

    /// Fills a canvas with `results` using `strategy`, without encoding it.
    pub fn build(
        &self,
        results: Vec<TileResult>,
        plan: &GridPlan,
        strategy: AssemblyStrategy,
    ) -> Result<MosaicBuilder, MosaicError> {
        match strategy {
            AssemblyStrategy::Direct => {
                let mut builder = MosaicBuilder::for_plan(plan)?;
                assemble_direct(&mut builder, results, plan);
                Ok(builder)
            }
            AssemblyStrategy::Progressive => {
                let mut builder = MosaicBuilder::for_plan(plan)?;
                self.assemble_progressive(&mut builder, results, plan);
                Ok(builder)
            }
            AssemblyStrategy::Prescaled { factor } => {
                let mut builder = MosaicBuilder::scaled_for_plan(plan, factor)?;
                self.assemble_progressive(&mut builder, results, plan);
                Ok(builder)
            }
        }
    }

    fn assemble_progressive(
        &self,
        builder: &mut MosaicBuilder,
        results: Vec<TileResult>,
        plan: &GridPlan,
    ) {
        let mut by_cell: HashMap<(u32, u32), Vec<u8>> = HashMap::with_capacity(results.len());
        for result in results {
            if !plan.contains(result.row, result.col) {
                warn_out_of_range(&result, plan);
                continue;
            }
            if let Some(bytes) = result.image_bytes {
                if by_cell.insert((result.row, result.col), bytes).is_some() {
                    warn!(
                        row = result.row,
                        col = result.col,
                        "Duplicate tile, keeping the last"
                    );
                }
            }
        }

        let chunk_rows = self.config.chunk_rows();
        let mut chunk_start = 0;
        while chunk_start < plan.num_rows() {
            let chunk_end = chunk_start.saturating_add(chunk_rows).min(plan.num_rows());
            for row in chunk_start..chunk_end {
                for col in 0..plan.num_cols() {
                    // Removing drops the encoded bytes as soon as they are pasted.
                    if let Some(bytes) = by_cell.remove(&(row, col)) {
                        place_or_warn(builder, row, col, &bytes);
                    }
                }
            }
            debug!(
                rows_done = chunk_end,
                rows = plan.num_rows(),
                placed = builder.placed(),
                "Progressive chunk placed"
            );
            chunk_start = chunk_end;
        }
    }
}

fn assemble_direct(builder: &mut MosaicBuilder, mut results: Vec<TileResult>, plan: &GridPlan) {
    results.sort_by_key(|r| (r.row, r.col));
    for result in results {
        if !plan.contains(result.row, result.col) {
            warn_out_of_range(&result, plan);
            continue;
        }
        if let Some(bytes) = &result.image_bytes {
            place_or_warn(builder, result.row, result.col, bytes);
        }
    }
}

fn place_or_warn(builder: &mut MosaicBuilder, row: u32, col: u32, bytes: &[u8]) {
    if let Err(e) = builder.place_tile(row, col, bytes) {
        warn!(row, col, error = %e, "Could not place tile, leaving cell blank");
    }
}

fn warn_out_of_range(result: &TileResult, plan: &GridPlan) {
    warn!(
        row = result.row,
        col = result.col,
        rows = plan.num_rows(),
        cols = plan.num_cols(),
        "Tile outside grid, skipping"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_rgb, encode_png, ImageFormat};
    use image::{Rgb, RgbImage};

    fn tile(color: [u8; 3]) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(4, 4, Rgb(color))).unwrap()
    }

    fn all_tiles(plan: &GridPlan) -> Vec<TileResult> {
        let mut out = Vec::new();
        for row in 0..plan.num_rows() {
            for col in 0..plan.num_cols() {
                let color = [200, row as u8 * 10, col as u8 * 10];
                out.push(TileResult::present(row, col, tile(color)));
            }
        }
        out
    }

    /// 4px tiles, 1px cropped: 4x3 cells.
    fn small_plan(rows: u32, cols: u32) -> GridPlan {
        GridPlan::new(rows, cols, 19, 4, 1, 1)
    }

    #[test]
    fn test_strategy_selection() {
        let assembler = MosaicAssembler::new(
            MosaicConfig::new().with_direct_threshold_bytes(100),
            CompressionConfig::default(),
        );
        let small = small_plan(1, 1); // 36 bytes
        let large = small_plan(10, 10); // 3600 bytes

        assert_eq!(assembler.choose_strategy(&small, false), AssemblyStrategy::Direct);
        assert_eq!(assembler.choose_strategy(&small, true), AssemblyStrategy::Progressive);
        assert_eq!(assembler.choose_strategy(&large, false), AssemblyStrategy::Progressive);
        assert!(matches!(
            assembler.choose_strategy(&large, true),
            AssemblyStrategy::Prescaled { .. }
        ));
    }

    #[test]
    fn test_encoding_selection() {
        let assembler = MosaicAssembler::default();
        assert_eq!(assembler.encoding_for(AssemblyStrategy::Direct, false), Encoding::Png);
        assert_eq!(
            assembler.encoding_for(AssemblyStrategy::Progressive, false),
            Encoding::Jpeg(92)
        );
        assert!(matches!(
            assembler.encoding_for(AssemblyStrategy::Direct, true),
            Encoding::Adaptive(_)
        ));
    }

    #[test]
    fn test_direct_and_progressive_agree() {
        let plan = small_plan(5, 3);
        let assembler = MosaicAssembler::new(
            MosaicConfig::new().with_chunk_rows(2),
            CompressionConfig::default(),
        );

        let direct = assembler
            .build(all_tiles(&plan), &plan, AssemblyStrategy::Direct)
            .unwrap();
        let progressive = assembler
            .build(all_tiles(&plan), &plan, AssemblyStrategy::Progressive)
            .unwrap();

        assert_eq!(direct.placed(), 15);
        assert_eq!(progressive.placed(), 15);
        assert_eq!(direct.into_canvas(), progressive.into_canvas());
    }

    #[test]
    fn test_missing_tile_leaves_black_cell() {
        let plan = small_plan(1, 2);
        let results = vec![
            TileResult::present(0, 0, tile([255, 255, 255])),
            TileResult::missing(0, 1),
        ];

        let assembly = MosaicAssembler::default().assemble(results, &plan, false).unwrap();

        assert_eq!(assembly.strategy, AssemblyStrategy::Direct);
        assert_eq!(assembly.image.format, ImageFormat::Png);
        assert_eq!((assembly.placed, assembly.blank), (1, 1));

        let canvas = decode_rgb(&assembly.image.bytes).unwrap();
        assert_eq!(canvas.dimensions(), (8, 3));
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(7, 2), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_bad_results_are_skipped() {
        let plan = small_plan(1, 1);
        let results = vec![
            TileResult::present(0, 5, tile([1, 2, 3])),
            TileResult::present(0, 0, b"corrupt".to_vec()),
        ];

        let assembly = MosaicAssembler::default().assemble(results, &plan, false).unwrap();

        assert_eq!(assembly.placed, 0);
        assert_eq!(assembly.blank, 1);
        assert_eq!(assembly.image.width, 4);
    }

    #[test]
    fn test_canvas_size_independent_of_successes() {
        let plan = small_plan(3, 4);
        let assembler = MosaicAssembler::default();
        let empty = assembler
            .build(Vec::new(), &plan, AssemblyStrategy::Progressive)
            .unwrap();
        assert_eq!((empty.width(), empty.height()), (16, 9));
    }

    #[test]
    fn test_prescaled_canvas_is_uniformly_smaller() {
        let plan = GridPlan::new(2, 2, 19, 40, 1, 0);
        let assembler = MosaicAssembler::default();

        let builder = assembler
            .build(all_tiles(&plan), &plan, AssemblyStrategy::Prescaled { factor: 0.25 })
            .unwrap();

        assert_eq!(builder.cell_size(), (10, 10));
        assert_eq!((builder.width(), builder.height()), (20, 20));
        assert_eq!(builder.placed(), 4);
    }

    #[test]
    fn test_compressed_assembly_is_jpeg() {
        let plan = small_plan(2, 2);
        let assembly = MosaicAssembler::default()
            .assemble(all_tiles(&plan), &plan, true)
            .unwrap();
        assert_eq!(assembly.strategy, AssemblyStrategy::Progressive);
        assert_eq!(assembly.image.format, ImageFormat::Jpeg);
    }
}
