//! Coordinate type definitions

use std::fmt;

use geo::Coord;
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Tile position within a single zoom level of a tile pyramid.
///
/// The zoom level is implied by the collection the point lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePoint {
    /// Y coordinate (north-south), 0 at the grid origin
    pub row: u32,
    /// X coordinate (east-west), 0 at the grid origin
    pub col: u32,
}

impl TilePoint {
    /// Creates a tile point from a row and column.
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Returns the four child tiles at the next finer level.
    ///
    /// Children are yielded in row-major order.
    #[inline]
    pub fn children(&self) -> [TilePoint; 4] {
        let row = self.row * 2;
        let col = self.col * 2;
        [
            TilePoint::new(row, col),
            TilePoint::new(row, col + 1),
            TilePoint::new(row + 1, col),
            TilePoint::new(row + 1, col + 1),
        ]
    }
}

impl fmt::Display for TilePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}

/// One level of a tile source's pyramid.
///
/// Pixel sizes are expressed in source projection units per pixel, so
/// a tile spans `tile_width * pixel_size_x` units horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLevel {
    /// Level index; larger is finer
    pub level: u8,
    /// Nominal ground resolution (projection units per pixel)
    pub resolution: f64,
    /// Horizontal pixel size
    pub pixel_size_x: f64,
    /// Vertical pixel size
    pub pixel_size_y: f64,
    /// Tile width in pixels
    pub tile_width: u32,
    /// Tile height in pixels
    pub tile_height: u32,
}

impl ZoomLevel {
    /// Width of one tile in projection units.
    #[inline]
    pub fn tile_span_x(&self) -> f64 {
        self.tile_width as f64 * self.pixel_size_x
    }

    /// Height of one tile in projection units.
    #[inline]
    pub fn tile_span_y(&self) -> f64 {
        self.tile_height as f64 * self.pixel_size_y
    }

    /// Column containing projected `x`, measured from the grid origin.
    ///
    /// May be negative for positions west of the origin.
    #[inline]
    pub fn column_at(&self, origin_x: f64, x: f64) -> i64 {
        ((x - origin_x) / self.tile_span_x()).floor() as i64
    }

    /// Row containing projected `y`; rows grow southwards from the origin.
    #[inline]
    pub fn row_at(&self, origin_y: f64, y: f64) -> i64 {
        ((origin_y - y) / self.tile_span_y()).floor() as i64
    }

    /// Corners of a tile in projection space: NW, NE, SE, SW.
    pub fn tile_corners(&self, origin_x: f64, origin_y: f64, tile: TilePoint) -> [Coord<f64>; 4] {
        let span_x = self.tile_span_x();
        let span_y = self.tile_span_y();
        let west = origin_x + tile.col as f64 * span_x;
        let north = origin_y - tile.row as f64 * span_y;
        let east = west + span_x;
        let south = north - span_y;
        [
            Coord { x: west, y: north },
            Coord { x: east, y: north },
            Coord { x: east, y: south },
            Coord { x: west, y: south },
        ]
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside the valid range or not finite
    #[error("invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude is outside the valid range or not finite
    #[error("invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// The target coordinate system is not supported
    #[error("unsupported SRID: {0}")]
    UnsupportedSrid(i32),
}
