//! Base64 text envelope for returning images through text-only channels.
//!
//! ```text
//! FORMAT=PNG
//! PNG_BASE64_START
//! iVBORw0KGgo...
//! PNG_BASE64_END
//! ```
//!
//! The marker names are fixed regardless of the payload format. Decoding
//! tolerates a missing `FORMAT=` line and line-wrapped base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::codec::ImageFormat;

pub const ENVELOPE_START: &str = "PNG_BASE64_START";
pub const ENVELOPE_END: &str = "PNG_BASE64_END";
const FORMAT_PREFIX: &str = "FORMAT=";

#[derive(Debug, Error, PartialEq)]
pub enum EnvelopeError {
    #[error("missing PNG_BASE64_START marker")]
    MissingStart,

    #[error("missing PNG_BASE64_END marker")]
    MissingEnd,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("unknown FORMAT value '{0}'")]
    UnknownFormat(String),
}

/// Payload recovered from an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Declared format, if the envelope had a `FORMAT=` line
    pub format: Option<ImageFormat>,
    pub bytes: Vec<u8>,
}

/// Wraps `bytes` in the text envelope.
pub fn encode_envelope(bytes: &[u8], format: ImageFormat) -> String {
    format!(
        "{}{}\n{}\n{}\n{}\n",
        FORMAT_PREFIX,
        format.label(),
        ENVELOPE_START,
        STANDARD.encode(bytes),
        ENVELOPE_END
    )
}

/// Extracts the exact bytes from an envelope.
///
/// Text before the start marker other than a `FORMAT=` line is ignored, as
/// is anything after the end marker.
pub fn decode_envelope(text: &str) -> Result<Envelope, EnvelopeError> {
    let start = text.find(ENVELOPE_START).ok_or(EnvelopeError::MissingStart)?;
    let (preamble, rest) = text.split_at(start);
    let body = &rest[ENVELOPE_START.len()..];
    let end = body.find(ENVELOPE_END).ok_or(EnvelopeError::MissingEnd)?;

    let format = preamble
        .lines()
        .filter_map(|line| line.trim().strip_prefix(FORMAT_PREFIX))
        .last()
        .map(|value| {
            value
                .parse::<ImageFormat>()
                .map_err(|_| EnvelopeError::UnknownFormat(value.to_string()))
        })
        .transpose()?;

    let payload: String = body[..end]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(payload)?;

    Ok(Envelope { format, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_is_byte_exact() {
        let bytes: Vec<u8> = (0..=255).cycle().take(1000).collect();
        let text = encode_envelope(&bytes, ImageFormat::Jpeg);
        let decoded = decode_envelope(&text).unwrap();
        assert_eq!(decoded.bytes, bytes);
        assert_eq!(decoded.format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_layout() {
        let text = encode_envelope(b"hi", ImageFormat::Png);
        assert_eq!(text, "FORMAT=PNG\nPNG_BASE64_START\naGk=\nPNG_BASE64_END\n");
    }

    #[test]
    fn test_empty_payload() {
        let text = encode_envelope(&[], ImageFormat::Png);
        assert!(decode_envelope(&text).unwrap().bytes.is_empty());
    }

    #[test]
    fn test_format_line_optional_and_noise_tolerated() {
        let text = "job log line\nPNG_BASE64_START\naG\nk=\r\nPNG_BASE64_END\ntrailer";
        let decoded = decode_envelope(text).unwrap();
        assert_eq!(decoded.bytes, b"hi");
        assert_eq!(decoded.format, None);
    }

    #[test]
    fn test_missing_markers() {
        assert_eq!(decode_envelope("aGk="), Err(EnvelopeError::MissingStart));
        assert_eq!(
            decode_envelope("PNG_BASE64_START\naGk=\n"),
            Err(EnvelopeError::MissingEnd)
        );
    }

    #[test]
    fn test_bad_payload() {
        assert!(matches!(
            decode_envelope("PNG_BASE64_START\n!!!\nPNG_BASE64_END"),
            Err(EnvelopeError::InvalidBase64(_))
        ));
        assert!(matches!(
            decode_envelope("FORMAT=GIF\nPNG_BASE64_START\naGk=\nPNG_BASE64_END"),
            Err(EnvelopeError::UnknownFormat(_))
        ));
    }
}
