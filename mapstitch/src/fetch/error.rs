//! Per-tile fetch errors.

use thiserror::Error;

use crate::codec::CodecError;
use crate::provider::ProviderError;

/// Why a single tile ended up without image data.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider gave an answer that retrying cannot change.
    #[error("tile ({row}, {col}) failed permanently after {attempts} attempt(s): {source}")]
    Permanent {
        row: u32,
        col: u32,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// Every attempt hit a retryable error.
    #[error("tile ({row}, {col}) gave up after {attempts} attempt(s): {source}")]
    Exhausted {
        row: u32,
        col: u32,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// The cropped tile could not be re-encoded.
    #[error("tile ({row}, {col}) could not be re-encoded: {source}")]
    Encode {
        row: u32,
        col: u32,
        #[source]
        source: CodecError,
    },
}

impl FetchError {
    /// Provider attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::Permanent { attempts, .. } | FetchError::Exhausted { attempts, .. } => {
                *attempts
            }
            FetchError::Encode { .. } => 1,
        }
    }
}
