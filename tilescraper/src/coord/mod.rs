//! Coordinate conversion module
//!
//! Provides the tile grid primitives used by discovery and download, and
//! conversions from geographic coordinates (WGS84 longitude/latitude) into
//! the projected coordinate systems that tile sources are addressed in.

mod types;

pub use types::{CoordError, TilePoint, ZoomLevel, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Geographic WGS84 (plate carrée when used as a tile grid).
pub const SRID_WGS84: i32 = 4326;

/// Spherical Web Mercator.
pub const SRID_WEB_MERCATOR: i32 = 3857;

/// Legacy alias of Web Mercator still reported by some servers.
pub const SRID_GOOGLE_MERCATOR: i32 = 900913;

/// Equatorial radius used by spherical Web Mercator, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Half the Web Mercator world width, in meters.
pub const MERCATOR_HALF_WORLD: f64 = PI * EARTH_RADIUS_M;

/// Finest level a standard pyramid may have; rows and columns stay within `u32`.
pub const MAX_PYRAMID_LEVEL: u8 = 30;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Returns true if geometry can be reprojected into `srid`.
#[inline]
pub fn is_supported_srid(srid: i32) -> bool {
    matches!(
        srid,
        SRID_WGS84 | SRID_WEB_MERCATOR | SRID_GOOGLE_MERCATOR
    )
}

/// Projects a WGS84 longitude/latitude into the coordinate system `srid`.
///
/// Latitudes beyond the Web Mercator limit are clamped to it when projecting
/// into Mercator, so that regions reaching the poles still cover the grid.
///
/// # Errors
///
/// Returns `CoordError` if the position is outside the WGS84 domain or the
/// SRID is not supported.
pub fn project(srid: i32, lon: f64, lat: f64) -> Result<(f64, f64), CoordError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !lon.is_finite() || !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }

    match srid {
        SRID_WGS84 => Ok((lon, lat)),
        SRID_WEB_MERCATOR | SRID_GOOGLE_MERCATOR => {
            let lat = lat.clamp(MIN_LAT, MAX_LAT);
            let x = EARTH_RADIUS_M * lon.to_radians();
            let y = EARTH_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
            Ok((x, y))
        }
        other => Err(CoordError::UnsupportedSrid(other)),
    }
}

/// Grid origin (north-west corner) of the standard pyramid for `srid`.
pub fn standard_origin(srid: i32) -> Result<(f64, f64), CoordError> {
    match srid {
        SRID_WGS84 => Ok((MIN_LON, 90.0)),
        SRID_WEB_MERCATOR | SRID_GOOGLE_MERCATOR => {
            Ok((-MERCATOR_HALF_WORLD, MERCATOR_HALF_WORLD))
        }
        other => Err(CoordError::UnsupportedSrid(other)),
    }
}

/// Builds the standard Web Mercator (slippy map) pyramid for levels `0..=max_level`.
///
/// Level 0 is a single tile covering the world. `max_level` is capped at
/// [`MAX_PYRAMID_LEVEL`].
pub fn web_mercator_levels(max_level: u8, tile_size: u32) -> Vec<ZoomLevel> {
    let world = 2.0 * MERCATOR_HALF_WORLD;
    (0..=max_level.min(MAX_PYRAMID_LEVEL))
        .map(|level| {
            let pixel = world / (tile_size as f64 * 2.0_f64.powi(level as i32));
            ZoomLevel {
                level,
                resolution: pixel,
                pixel_size_x: pixel,
                pixel_size_y: pixel,
                tile_width: tile_size,
                tile_height: tile_size,
            }
        })
        .collect()
}

/// Builds a geographic (EPSG:4326) pyramid for levels `0..=max_level`.
///
/// Level 0 is two tiles wide and one tile high. `max_level` is capped at
/// one below [`MAX_PYRAMID_LEVEL`], since the grid is twice as wide as it is high.
pub fn wgs84_levels(max_level: u8, tile_size: u32) -> Vec<ZoomLevel> {
    (0..=max_level.min(MAX_PYRAMID_LEVEL - 1))
        .map(|level| {
            let pixel = 180.0 / (tile_size as f64 * 2.0_f64.powi(level as i32));
            ZoomLevel {
                level,
                resolution: pixel,
                pixel_size_x: pixel,
                pixel_size_y: pixel,
                tile_width: tile_size,
                tile_height: tile_size,
            }
        })
        .collect()
}
