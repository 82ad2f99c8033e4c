//! Coordinate type definitions

use std::fmt;

/// Latitude range accepted by the projection.
///
/// The Mercator `y` coordinate is singular at the poles, so both bounds
/// are exclusive.
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by static map providers
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Edge length of the world at zoom 0, in pixels.
pub const BASE_TILE_PX: f64 = 256.0;

/// A position in world pixel space at a fixed zoom level.
///
/// The origin is the north-west corner of the projected world; `x` grows
/// eastward and `y` grows southward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoord {
    pub x: f64,
    pub y: f64,
}

impl PixelCoord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by the given pixel offsets.
    #[inline]
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A rectangular ground region to be turned into a mosaic.
///
/// Immutable once constructed; [`Region::new`] enforces the coordinate and
/// extent preconditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    center_lat: f64,
    center_lon: f64,
    height_m: f64,
    width_m: f64,
    compress: bool,
}

impl Region {
    /// Creates a region centred on `(center_lat, center_lon)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the latitude is not strictly inside (-90, 90), the
    /// longitude is outside [-180, 180], or either extent is not a positive
    /// finite number.
    pub fn new(
        center_lat: f64,
        center_lon: f64,
        height_m: f64,
        width_m: f64,
        compress: bool,
    ) -> Result<Self, CoordError> {
        if !center_lat.is_finite() || center_lat <= MIN_LAT || center_lat >= MAX_LAT {
            return Err(CoordError::InvalidLatitude(center_lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&center_lon) {
            return Err(CoordError::InvalidLongitude(center_lon));
        }
        if !height_m.is_finite() || height_m <= 0.0 {
            return Err(CoordError::InvalidExtent(height_m));
        }
        if !width_m.is_finite() || width_m <= 0.0 {
            return Err(CoordError::InvalidExtent(width_m));
        }

        Ok(Self {
            center_lat,
            center_lon,
            height_m,
            width_m,
            compress,
        })
    }

    pub fn center_lat(&self) -> f64 {
        self.center_lat
    }

    pub fn center_lon(&self) -> f64 {
        self.center_lon
    }

    /// North-south extent in meters.
    pub fn height_m(&self) -> f64 {
        self.height_m
    }

    /// East-west extent in meters.
    pub fn width_m(&self) -> f64 {
        self.width_m
    }

    /// Whether the caller asked for a size-capped output.
    pub fn compress(&self) -> bool {
        self.compress
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside the open interval (-90, 90)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range
    InvalidZoom(u8),
    /// Region height or width is not a positive number of meters
    InvalidExtent(f64),
    /// Region needs more tiles than the planner allows
    GridTooLarge { rows: u32, cols: u32, max_tiles: usize },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be strictly between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
            CoordError::InvalidExtent(meters) => {
                write!(f, "Invalid region extent: {} (must be > 0 meters)", meters)
            }
            CoordError::GridTooLarge {
                rows,
                cols,
                max_tiles,
            } => {
                write!(
                    f,
                    "Region needs a {}x{} tile grid (limit is {} tiles)",
                    rows, cols, max_tiles
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
