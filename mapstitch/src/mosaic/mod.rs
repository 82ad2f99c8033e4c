//! Mosaic assembly.
//!
//! [`MosaicAssembler`] chooses how to fill the canvas for a region, a
//! [`MosaicBuilder`] owns the pixels while tiles are pasted, and
//! [`AdaptiveCompressor`] squeezes the result under a byte budget when
//! compression is requested.

mod assembler;
mod builder;
mod compress;
mod error;
mod merge;

pub use assembler::{Assembly, AssemblyStrategy, MosaicAssembler};
pub use builder::{Encoding, MosaicBuilder};
pub use compress::AdaptiveCompressor;
pub use error::MosaicError;
pub use merge::merge_dumps;
