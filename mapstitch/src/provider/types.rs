//! Provider types and traits

use std::fmt;

/// Errors that can occur while fetching one tile from a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Provider answered with a non-success HTTP status
    Http { status: u16, message: String },
    /// Request could not complete (connect failure, timeout, truncated body)
    Transport(String),
    /// Success status but the body is not an image
    NotAnImage { content_type: String },
    /// Image payload could not be decoded
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether another attempt at the same tile could succeed.
    ///
    /// Client errors (4xx) and non-image bodies are permanent: quota,
    /// authorization and bad-request answers do not change on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Http { status, .. } => !(400..500).contains(status),
            ProviderError::NotAnImage { .. } => false,
            ProviderError::Transport(_) | ProviderError::InvalidResponse(_) => true,
        }
    }

    /// Returns the error with the credential masked out of its message.
    pub fn redacted(self, credential: &Credential) -> Self {
        match self {
            ProviderError::Http { status, message } => ProviderError::Http {
                status,
                message: credential.redact(&message),
            },
            ProviderError::Transport(msg) => ProviderError::Transport(credential.redact(&msg)),
            ProviderError::InvalidResponse(msg) => {
                ProviderError::InvalidResponse(credential.redact(&msg))
            }
            other => other,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Http { status, message } => {
                write!(f, "HTTP {}: {}", status, message)
            }
            ProviderError::Transport(msg) => write!(f, "Request failed: {}", msg),
            ProviderError::NotAnImage { content_type } => {
                write!(f, "Expected an image, got content type '{}'", content_type)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Placeholder written in place of a credential in logs and errors.
pub const REDACTED: &str = "***REDACTED***";

/// Opaque provider API key.
///
/// Never printed: `Debug` shows a placeholder and [`Credential::redact`]
/// masks the key inside arbitrary text.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a key. Returns `None` for blank input.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(Self(key))
        }
    }

    /// The raw key, for building request URLs only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Replaces every occurrence of the key in `text`.
    pub fn redact(&self, text: &str) -> String {
        text.replace(&self.0, REDACTED)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", REDACTED)
    }
}

/// Everything a provider needs to fetch one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileQuery {
    pub row: u32,
    pub col: u32,
    /// Tile centre latitude, degrees
    pub lat: f64,
    /// Tile centre longitude, degrees
    pub lon: f64,
    pub zoom: u8,
    /// Nominal edge length requested, before scale
    pub size_px: u32,
    pub scale: u32,
}

/// Source of tile imagery.
///
/// Implementations perform a single attempt; retry and pacing belong to
/// [`crate::fetch::FetchExecutor`].
pub trait TileProvider: Send + Sync {
    /// Fetches the encoded image for one tile.
    fn fetch_tile(&self, query: &TileQuery) -> Result<Vec<u8>, ProviderError>;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;
}

impl<P: TileProvider + ?Sized> TileProvider for std::sync::Arc<P> {
    fn fetch_tile(&self, query: &TileQuery) -> Result<Vec<u8>, ProviderError> {
        (**self).fetch_tile(query)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<P: TileProvider + ?Sized> TileProvider for Box<P> {
    fn fetch_tile(&self, query: &TileQuery) -> Result<Vec<u8>, ProviderError> {
        (**self).fetch_tile(query)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
