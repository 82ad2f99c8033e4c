//! Region input parsing.
//!
//! The input is a region count followed by five lines per region:
//! latitude, longitude, height in metres, width in metres and a compress
//! flag (`1`/`0`, `true`/`false`). Blank lines are ignored.
//!
//! ```text
//! 2
//! 48.8584
//! 2.2945
//! 500
//! 800
//! 0
//! ...
//! ```

use std::path::Path;

use thiserror::Error;

use crate::coord::{CoordError, Region};

const FIELDS_PER_REGION: usize = 5;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read region input {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("region input is empty")]
    Empty,

    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },

    #[error("expected {expected} regions but input ends after {found}")]
    Truncated { expected: usize, found: usize },

    #[error("region {index} (from line {line}): {source}")]
    InvalidRegion {
        index: usize,
        line: usize,
        #[source]
        source: CoordError,
    },
}

/// Reads and parses a region file.
pub fn read_regions(path: &Path) -> Result<Vec<Region>, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_regions(&text)
}

/// Parses region input text.
///
/// Lines after the last declared region are ignored.
pub fn parse_regions(text: &str) -> Result<Vec<Region>, InputError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (count_line, count_text) = lines.next().ok_or(InputError::Empty)?;
    let count: usize = count_text.parse().map_err(|_| InputError::Invalid {
        line: count_line,
        message: format!("region count '{}' is not a non-negative integer", count_text),
    })?;

    let mut regions = Vec::new();
    for index in 0..count {
        let mut fields = Vec::with_capacity(FIELDS_PER_REGION);
        for _ in 0..FIELDS_PER_REGION {
            match lines.next() {
                Some(field) => fields.push(field),
                None => {
                    return Err(InputError::Truncated {
                        expected: count,
                        found: index,
                    })
                }
            }
        }

        let first_line = fields[0].0;
        let lat = float(fields[0], "latitude")?;
        let lon = float(fields[1], "longitude")?;
        let height = float(fields[2], "height")?;
        let width = float(fields[3], "width")?;
        let compress = flag(fields[4])?;

        let region = Region::new(lat, lon, height, width, compress).map_err(|source| {
            InputError::InvalidRegion {
                index: index + 1,
                line: first_line,
                source,
            }
        })?;
        regions.push(region);
    }

    Ok(regions)
}

fn float((line, text): (usize, &str), what: &str) -> Result<f64, InputError> {
    text.parse().map_err(|_| InputError::Invalid {
        line,
        message: format!("{} '{}' is not a number", what, text),
    })
}

fn flag((line, text): (usize, &str)) -> Result<bool, InputError> {
    match text.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(InputError::Invalid {
            line,
            message: format!("compress flag '{}' must be 1 or 0", text),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_regions() {
        let text = "2\n48.8584\n2.2945\n500\n800\n0\n\n-33.86\n151.21\n200\n200\n1\n";
        let regions = parse_regions(text).unwrap();

        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].center_lat(), 48.8584);
        assert_eq!(regions[0].width_m(), 800.0);
        assert!(!regions[0].compress());
        assert!(regions[1].compress());
    }

    #[test]
    fn test_zero_regions() {
        assert!(parse_regions("0\n").unwrap().is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_regions("  \n\n"), Err(InputError::Empty)));
    }

    #[test]
    fn test_bad_count() {
        assert!(matches!(
            parse_regions("two\n"),
            Err(InputError::Invalid { line: 1, .. })
        ));
    }

    #[test]
    fn test_bad_field_reports_line() {
        let err = parse_regions("1\n10\n\nabc\n100\n100\n0\n").unwrap_err();
        assert!(matches!(err, InputError::Invalid { line: 4, .. }));
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn test_truncated() {
        let err = parse_regions("2\n1\n2\n100\n100\n0\n3\n4\n").unwrap_err();
        assert!(matches!(
            err,
            InputError::Truncated {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_huge_count_reports_truncation() {
        let err = parse_regions("1000000000000000000\n1\n2\n100\n100\n0\n").unwrap_err();
        assert!(matches!(
            err,
            InputError::Truncated {
                expected: 1_000_000_000_000_000_000,
                found: 1
            }
        ));
    }

    #[test]
    fn test_invalid_region_values() {
        let err = parse_regions("1\n95\n0\n100\n100\n0\n").unwrap_err();
        assert!(matches!(
            err,
            InputError::InvalidRegion {
                index: 1,
                line: 2,
                source: CoordError::InvalidLatitude(_)
            }
        ));
    }

    #[test]
    fn test_bad_flag() {
        assert!(matches!(
            parse_regions("1\n0\n0\n100\n100\nmaybe\n"),
            Err(InputError::Invalid { line: 6, .. })
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            read_regions(&dir.path().join("absent.txt")),
            Err(InputError::Read { .. })
        ));
    }
}
