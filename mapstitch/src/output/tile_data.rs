//! Raw tile-data dumps for download-only runs.
//!
//! A dump carries every fetched tile of a region (or a slice of one) so the
//! mosaic can be merged elsewhere:
//!
//! ```text
//! TILES_DATA
//! ROWS=2
//! COLS=3
//! COUNT=5
//! TILE|0|0|<base64 jpeg>
//! ...
//! END_TILES_DATA
//! ```
//!
//! Only tiles with image data are written; absent cells are implied.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

use crate::grid::{GridPlan, TileResult};

const HEADER: &str = "TILES_DATA";
const FOOTER: &str = "END_TILES_DATA";

#[derive(Debug, Error, PartialEq)]
pub enum TileDataError {
    #[error("missing TILES_DATA header")]
    MissingHeader,

    #[error("missing END_TILES_DATA footer")]
    MissingFooter,

    #[error("line {line}: {message}")]
    InvalidLine { line: usize, message: String },

    #[error("line {line}: invalid base64: {source}")]
    InvalidBase64 {
        line: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("COUNT={expected} but {found} tiles present")]
    CountMismatch { expected: usize, found: usize },
}

/// Tiles of one region in transportable form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileDump {
    pub rows: u32,
    pub cols: u32,
    /// Present tiles only
    pub tiles: Vec<TileResult>,
}

impl TileDump {
    /// Collects the present tiles of `results` under `plan`'s grid size.
    pub fn from_results(plan: &GridPlan, results: Vec<TileResult>) -> Self {
        Self {
            rows: plan.num_rows(),
            cols: plan.num_cols(),
            tiles: results.into_iter().filter(TileResult::is_present).collect(),
        }
    }

    /// Rows actually spanned by the dump: the header value, or one past the
    /// deepest tile if the header says zero.
    pub fn span_rows(&self) -> u32 {
        if self.rows > 0 {
            return self.rows;
        }
        self.tiles.iter().map(|t| t.row + 1).max().unwrap_or(0)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", HEADER);
        let _ = writeln!(out, "ROWS={}", self.rows);
        let _ = writeln!(out, "COLS={}", self.cols);
        let _ = writeln!(out, "COUNT={}", self.tiles.len());
        for tile in &self.tiles {
            if let Some(bytes) = &tile.image_bytes {
                let data = STANDARD.encode(bytes);
                let _ = writeln!(out, "TILE|{}|{}|{}", tile.row, tile.col, data);
            }
        }
        let _ = writeln!(out, "{}", FOOTER);
        out
    }

    pub fn parse(text: &str) -> Result<Self, TileDataError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        match lines.next() {
            Some((_, HEADER)) => {}
            _ => return Err(TileDataError::MissingHeader),
        }

        let mut dump = TileDump::default();
        let mut count = None;
        let mut closed = false;

        for (line, content) in lines {
            if content == FOOTER {
                closed = true;
                break;
            }
            if let Some(v) = content.strip_prefix("ROWS=") {
                dump.rows = number(line, v)?;
            } else if let Some(v) = content.strip_prefix("COLS=") {
                dump.cols = number(line, v)?;
            } else if let Some(v) = content.strip_prefix("COUNT=") {
                count = Some(number::<usize>(line, v)?);
            } else if let Some(rest) = content.strip_prefix("TILE|") {
                dump.tiles.push(parse_tile(line, rest)?);
            } else {
                return Err(TileDataError::InvalidLine {
                    line,
                    message: format!("unexpected content '{}'", truncate(content)),
                });
            }
        }

        if !closed {
            return Err(TileDataError::MissingFooter);
        }
        if let Some(expected) = count {
            if expected != dump.tiles.len() {
                return Err(TileDataError::CountMismatch {
                    expected,
                    found: dump.tiles.len(),
                });
            }
        }

        Ok(dump)
    }
}

fn parse_tile(line: usize, rest: &str) -> Result<TileResult, TileDataError> {
    let mut parts = rest.splitn(3, '|');
    let (Some(row), Some(col), Some(data)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(TileDataError::InvalidLine {
            line,
            message: "expected TILE|row|col|data".to_string(),
        });
    };

    let row = number(line, row)?;
    let col = number(line, col)?;
    let bytes = STANDARD
        .decode(data)
        .map_err(|source| TileDataError::InvalidBase64 { line, source })?;

    Ok(TileResult::present(row, col, bytes))
}

fn number<T: std::str::FromStr>(line: usize, value: &str) -> Result<T, TileDataError> {
    value.trim().parse().map_err(|_| TileDataError::InvalidLine {
        line,
        message: format!("'{}' is not a valid number", truncate(value)),
    })
}

fn truncate(s: &str) -> String {
    s.chars().take(40).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TileDump {
        TileDump {
            rows: 2,
            cols: 2,
            tiles: vec![
                TileResult::present(0, 0, vec![1, 2, 3]),
                TileResult::present(1, 1, vec![0xff; 10]),
            ],
        }
    }

    #[test]
    fn test_render_then_parse() {
        let dump = sample();
        assert_eq!(TileDump::parse(&dump.render()).unwrap(), dump);
    }

    #[test]
    fn test_render_layout() {
        let text = sample().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "TILES_DATA");
        assert_eq!(lines[1], "ROWS=2");
        assert_eq!(lines[2], "COLS=2");
        assert_eq!(lines[3], "COUNT=2");
        assert_eq!(lines[4], "TILE|0|0|AQID");
        assert_eq!(lines.last(), Some(&"END_TILES_DATA"));
    }

    #[test]
    fn test_from_results_keeps_present_only() {
        let plan = GridPlan::new(1, 3, 19, 8, 1, 0);
        let dump = TileDump::from_results(
            &plan,
            vec![
                TileResult::present(0, 0, vec![1]),
                TileResult::missing(0, 1),
                TileResult::present(0, 2, vec![2]),
            ],
        );
        assert_eq!((dump.rows, dump.cols), (1, 3));
        assert_eq!(dump.tiles.len(), 2);
    }

    #[test]
    fn test_span_rows_falls_back_to_tiles() {
        let mut dump = sample();
        dump.rows = 0;
        assert_eq!(dump.span_rows(), 2);
        assert_eq!(TileDump::default().span_rows(), 0);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(TileDump::parse("ROWS=1\n"), Err(TileDataError::MissingHeader));
        assert_eq!(
            TileDump::parse("TILES_DATA\nROWS=1\n"),
            Err(TileDataError::MissingFooter)
        );
        assert!(matches!(
            TileDump::parse("TILES_DATA\nROWS=x\nEND_TILES_DATA"),
            Err(TileDataError::InvalidLine { line: 2, .. })
        ));
        assert!(matches!(
            TileDump::parse("TILES_DATA\nTILE|0|0|***\nEND_TILES_DATA"),
            Err(TileDataError::InvalidBase64 { line: 2, .. })
        ));
        assert!(matches!(
            TileDump::parse("TILES_DATA\nTILE|0\nEND_TILES_DATA"),
            Err(TileDataError::InvalidLine { line: 2, .. })
        ));
        assert_eq!(
            TileDump::parse("TILES_DATA\nCOUNT=2\nTILE|0|0|AQID\nEND_TILES_DATA"),
            Err(TileDataError::CountMismatch {
                expected: 2,
                found: 1
            })
        );
    }
}
