//! Coordinate conversion module
//!
//! Converts between geographic coordinates (latitude/longitude) and the
//! spherical Web Mercator pixel space used by web map tile servers. At zoom
//! `z` the world is a square of `256 * 2^z` pixels.

mod types;

pub use types::{
    CoordError, PixelCoord, Region, BASE_TILE_PX, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM,
};

use std::f64::consts::PI;

/// Returns the edge length of the world in pixels at the given zoom.
#[inline]
pub fn world_size_px(zoom: u8) -> f64 {
    BASE_TILE_PX * 2.0_f64.powi(zoom as i32)
}

/// Projects geographic coordinates into world pixel space.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees, strictly between -90 and 90
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
///
/// # Errors
///
/// The Mercator `y` coordinate diverges at the poles, so `|lat| >= 90` is
/// rejected rather than producing an infinity.
#[inline]
pub fn lat_lon_to_pixel(lat: f64, lon: f64, zoom: u8) -> Result<PixelCoord, CoordError> {
    if !lat.is_finite() || lat <= MIN_LAT || lat >= MAX_LAT {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let world_px = world_size_px(zoom);
    let x = (lon + 180.0) / 360.0 * world_px;

    let sin_lat = (lat * PI / 180.0).sin();
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * world_px;

    Ok(PixelCoord { x, y })
}

/// Converts a world pixel position back to geographic coordinates.
///
/// Returns `(lat, lon)` in degrees. Positions outside the world square are
/// not clamped; longitudes past the antimeridian come back outside
/// [-180, 180].
#[inline]
pub fn pixel_to_lat_lon(pixel: PixelCoord, zoom: u8) -> (f64, f64) {
    let world_px = world_size_px(zoom);

    let lon = pixel.x / world_px * 360.0 - 180.0;

    let n = PI - 2.0 * PI * pixel.y / world_px;
    let lat = n.sinh().atan() * 180.0 / PI;

    (lat, lon)
}
