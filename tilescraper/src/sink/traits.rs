//! Core trait for tile caches.

use thiserror::Error;

/// Errors that can occur while storing or inspecting tiles.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O error during sink operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink does not accept writes.
    #[error("Sink is read-only")]
    ReadOnly,

    /// Stored metadata could not be understood.
    #[error("Corrupt tile metadata at {path}: {reason}")]
    CorruptMetadata { path: String, reason: String },
}

/// A tile cache the scraper writes into.
///
/// Expiration times are absolute, in milliseconds since the Unix epoch.
/// Implementations must tolerate concurrent calls from worker threads.
pub trait TileSink: Send + Sync {
    /// Whether the sink refuses writes. Scrapes into a read-only sink are
    /// rejected before any work starts.
    fn is_read_only(&self) -> bool;

    /// Store a tile, replacing any previous copy.
    ///
    /// # Arguments
    ///
    /// * `level` - Zoom level index
    /// * `x` - Column
    /// * `y` - Row
    /// * `data` - Encoded tile bytes
    /// * `expires_at_millis` - Absolute expiration time
    fn set_tile(
        &self,
        level: u8,
        x: u32,
        y: u32,
        data: &[u8],
        expires_at_millis: i64,
    ) -> Result<(), SinkError>;

    /// Expiration time of a stored tile, or `None` if the tile is not held.
    fn tile_expiration(&self, level: u8, x: u32, y: u32) -> Option<i64>;
}
