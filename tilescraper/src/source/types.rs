//! Tile source trait and error types.

use thiserror::Error;

use crate::coord::ZoomLevel;

/// Errors raised while fetching a tile.
///
/// Every variant is treated as transient by the scraper: the fetch is
/// retried and, once attempts are exhausted, recorded as a failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// Transport or HTTP status failure
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The URL template could not produce a valid request
    #[error("invalid URL template: {0}")]
    InvalidTemplate(String),

    /// The requested level is not part of the pyramid
    #[error("unknown zoom level: {0}")]
    UnknownLevel(u8),

    /// Any other source-specific failure
    #[error("{0}")]
    Other(String),
}

/// A tiled imagery source.
///
/// Implementations must be safe to share across worker threads; the
/// threaded downloader calls [`TileSource::tile_data`] concurrently.
pub trait TileSource: Send + Sync {
    /// Human readable name, used in logs.
    fn name(&self) -> &str;

    /// Spatial reference of the tile grid (e.g. 3857 or 4326).
    fn srid(&self) -> i32;

    /// X coordinate of the grid origin in source projection units.
    fn origin_x(&self) -> f64;

    /// Y coordinate of the grid origin in source projection units.
    ///
    /// Rows grow southwards from the origin.
    fn origin_y(&self) -> f64;

    /// The pyramid, ordered coarsest first.
    fn zoom_levels(&self) -> &[ZoomLevel];

    /// Fetch the encoded bytes of one tile.
    ///
    /// # Arguments
    ///
    /// * `level` - Zoom level index
    /// * `x` - Column
    /// * `y` - Row
    ///
    /// # Returns
    ///
    /// `Ok(Some(bytes))` when the tile exists, `Ok(None)` when the source
    /// has no tile at that position, or an error on failure.
    fn tile_data(&self, level: u8, x: u32, y: u32) -> Result<Option<Vec<u8>>, SourceError>;

    /// Column count after which the grid wraps around the antimeridian.
    ///
    /// Columns at or beyond the returned value are remapped by subtracting
    /// it before fetching. `None` disables wrapping.
    fn wrap_columns(&self, _level: &ZoomLevel) -> Option<u32> {
        None
    }

    /// Number of rows in the grid at `level`, if bounded.
    ///
    /// Tiles at or past this row are never selected.
    fn row_count(&self, _level: &ZoomLevel) -> Option<u32> {
        None
    }

    /// Look up a level of the pyramid by index.
    fn zoom_level(&self, level: u8) -> Option<&ZoomLevel> {
        self.zoom_levels().iter().find(|zl| zl.level == level)
    }
}
