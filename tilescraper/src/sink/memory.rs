//! In-memory tile sink.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{SinkError, TileSink};

/// A tile held by [`MemoryTileSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTile {
    pub data: Vec<u8>,
    pub expires_at_millis: i64,
}

type TileKey = (u8, u32, u32);

/// Tile sink backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryTileSink {
    tiles: RwLock<HashMap<TileKey, StoredTile>>,
    read_only: bool,
}

impl MemoryTileSink {
    /// Create an empty, writable sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty sink that rejects writes.
    pub fn read_only() -> Self {
        Self {
            tiles: RwLock::default(),
            read_only: true,
        }
    }

    /// Fetch a stored tile.
    pub fn get(&self, level: u8, x: u32, y: u32) -> Option<StoredTile> {
        self.tiles.read().get(&(level, x, y)).cloned()
    }

    /// Number of stored tiles.
    pub fn len(&self) -> usize {
        self.tiles.read().len()
    }

    /// Whether no tile is stored.
    pub fn is_empty(&self) -> bool {
        self.tiles.read().is_empty()
    }

    /// Seed a tile with the given expiration, bypassing the read-only flag.
    ///
    /// Used to prepare a cache before a scrape.
    pub fn insert_expiration(&self, level: u8, x: u32, y: u32, expires_at_millis: i64) {
        self.tiles.write().insert(
            (level, x, y),
            StoredTile {
                data: Vec::new(),
                expires_at_millis,
            },
        );
    }
}

impl TileSink for MemoryTileSink {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn set_tile(
        &self,
        level: u8,
        x: u32,
        y: u32,
        data: &[u8],
        expires_at_millis: i64,
    ) -> Result<(), SinkError> {
        if self.read_only {
            return Err(SinkError::ReadOnly);
        }
        self.tiles.write().insert(
            (level, x, y),
            StoredTile {
                data: data.to_vec(),
                expires_at_millis,
            },
        );
        Ok(())
    }

    fn tile_expiration(&self, level: u8, x: u32, y: u32) -> Option<i64> {
        self.tiles
            .read()
            .get(&(level, x, y))
            .map(|t| t.expires_at_millis)
    }
}
