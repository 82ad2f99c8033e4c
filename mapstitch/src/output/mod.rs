//! Output artifacts: the base64 text envelope and raw tile-data dumps.

mod envelope;
mod tile_data;

pub use envelope::{
    decode_envelope, encode_envelope, Envelope, EnvelopeError, ENVELOPE_END, ENVELOPE_START,
};
pub use tile_data::{TileDataError, TileDump};
