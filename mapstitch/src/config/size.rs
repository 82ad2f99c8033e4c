//! Byte-size values in config files ("100MB", "2GB", "512").

use thiserror::Error;

/// Error parsing a size string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid size '{input}' - expected format like '100MB', '2GB', or '512KB'")]
pub struct SizeParseError {
    input: String,
}

const UNITS: [(&str, u64); 6] = [
    ("GB", 1024 * 1024 * 1024),
    ("G", 1024 * 1024 * 1024),
    ("MB", 1024 * 1024),
    ("M", 1024 * 1024),
    ("KB", 1024),
    ("K", 1024),
];

/// Parses a human-readable size into bytes.
///
/// Units are binary and case-insensitive; a bare number is taken as bytes.
///
/// ```
/// use mapstitch::config::parse_size;
///
/// assert_eq!(parse_size("512").unwrap(), 512);
/// assert_eq!(parse_size("100mb").unwrap(), 100 * 1024 * 1024);
/// assert_eq!(parse_size("2 GB").unwrap(), 2 * 1024 * 1024 * 1024);
/// ```
pub fn parse_size(s: &str) -> Result<u64, SizeParseError> {
    let err = || SizeParseError {
        input: s.to_string(),
    };

    let trimmed = s.trim();
    let upper = trimmed.to_ascii_uppercase();

    let (digits, multiplier) = UNITS
        .iter()
        .find_map(|(suffix, mult)| {
            upper
                .strip_suffix(suffix)
                .map(|rest| (rest.trim().to_string(), *mult))
        })
        .unwrap_or((upper.clone(), 1));

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }

    let value: u64 = digits.parse().map_err(|_| err())?;
    value.checked_mul(multiplier).ok_or_else(err)
}

/// Formats a byte count with the largest unit that divides it exactly.
pub fn format_size(bytes: u64) -> String {
    const GB: u64 = 1024 * 1024 * 1024;
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;

    if bytes >= GB && bytes % GB == 0 {
        format!("{}GB", bytes / GB)
    } else if bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if bytes >= KB && bytes % KB == 0 {
        format!("{}KB", bytes / KB)
    } else {
        bytes.to_string()
    }
}

/// Formats a byte count as fractional mebibytes, for log output.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_size("0").unwrap(), 0);
        assert_eq!(parse_size("1k").unwrap(), 1024);
        assert_eq!(parse_size("1KB").unwrap(), 1024);
        assert_eq!(parse_size("500M").unwrap(), 500 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(parse_size("  800 MB ").unwrap(), 800 * 1024 * 1024);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_size("").is_err());
        assert!(parse_size("MB").is_err());
        assert!(parse_size("ten").is_err());
        assert!(parse_size("-5MB").is_err());
        assert!(parse_size("1.5GB").is_err());
        assert!(parse_size("3TB").is_err());
    }

    #[test]
    fn test_parse_overflow() {
        assert!(parse_size("99999999999999999999GB").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(100 * 1024 * 1024), "100MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2GB");
        assert_eq!(format_size(1000), "1000");
        assert_eq!(parse_size(&format_size(800 * 1024 * 1024)).unwrap(), 800 * 1024 * 1024);
    }

    #[test]
    fn test_format_mib() {
        assert_eq!(format_mib(3 * 1024 * 1024 / 2), "1.5MB");
    }
}
