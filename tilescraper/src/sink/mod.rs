//! Tile sinks.
//!
//! A [`TileSink`] is the cache the scraper fills. It stores encoded tile
//! bytes together with an absolute expiration time and can report the
//! expiration of a tile it already holds, which lets a scrape skip tiles
//! that are still fresh.
//!
//! Two implementations are bundled:
//!
//! - [`MemoryTileSink`] - a map held in memory, mainly for tests and dry runs
//! - [`DiskTileSink`] - one file per tile under `<root>/<z>/<x>/<y>.tile`

mod disk;
mod memory;
mod traits;

pub use disk::DiskTileSink;
pub use memory::{MemoryTileSink, StoredTile};
pub use traits::{SinkError, TileSink};
