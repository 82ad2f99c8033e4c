//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`run`] - Build mosaics for a region file
//! - [`decode`] - Turn a base64 envelope back into an image
//! - [`merge`] - Combine tile-data dumps from federated runs

pub mod decode;
pub mod merge;
pub mod run;
