//! On-disk tile sink.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   <z>/
//!     <x>/
//!       <y>.tile      encoded tile bytes
//!       <y>.expires   expiration, decimal milliseconds since the epoch
//! ```
//!
//! Both files are written to a temporary name first and renamed into place
//! so readers never observe a partially written tile.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::traits::{SinkError, TileSink};

const TILE_EXTENSION: &str = "tile";
const EXPIRES_EXTENSION: &str = "expires";

/// Tile sink storing one file per tile below a root directory.
#[derive(Debug, Clone)]
pub struct DiskTileSink {
    root: PathBuf,
    read_only: bool,
}

impl DiskTileSink {
    /// Open a writable sink, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened disk tile sink");
        Ok(Self {
            root,
            read_only: false,
        })
    }

    /// Open an existing cache directory without write access.
    pub fn open_read_only(root: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SinkError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("cache directory not found: {}", root.display()),
            )));
        }
        Ok(Self {
            root,
            read_only: true,
        })
    }

    /// Root directory of the cache.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the tile data file.
    pub fn tile_path(&self, level: u8, x: u32, y: u32) -> PathBuf {
        self.column_dir(level, x)
            .join(format!("{}.{}", y, TILE_EXTENSION))
    }

    /// Read the bytes of a stored tile.
    pub fn read_tile(&self, level: u8, x: u32, y: u32) -> Option<Vec<u8>> {
        fs::read(self.tile_path(level, x, y)).ok()
    }

    fn column_dir(&self, level: u8, x: u32) -> PathBuf {
        self.root.join(level.to_string()).join(x.to_string())
    }

    fn expires_path(&self, level: u8, x: u32, y: u32) -> PathBuf {
        self.column_dir(level, x)
            .join(format!("{}.{}", y, EXPIRES_EXTENSION))
    }

    fn read_expiration(path: &Path) -> Result<i64, SinkError> {
        let text = fs::read_to_string(path)?;
        text.trim()
            .parse::<i64>()
            .map_err(|e| SinkError::CorruptMetadata {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

/// Write `data` to `path` through a temporary sibling file.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|e| e.to_str()).unwrap_or_default()
    ));
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)
}

impl TileSink for DiskTileSink {
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
        fs::create_dir_all(self.column_dir(level, x))?;
        write_atomic(&self.tile_path(level, x, y), data)?;
        write_atomic(
            &self.expires_path(level, x, y),
            expires_at_millis.to_string().as_bytes(),
        )?;
        Ok(())
    }

    fn tile_expiration(&self, level: u8, x: u32, y: u32) -> Option<i64> {
        if !self.tile_path(level, x, y).is_file() {
            return None;
        }
        let path = self.expires_path(level, x, y);
        match Self::read_expiration(&path) {
            Ok(millis) => Some(millis),
            Err(SinkError::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable tile expiration");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_and_round_trip() {
        let dir = TempDir::new().unwrap();
        let sink = DiskTileSink::open(dir.path()).unwrap();

        sink.set_tile(5, 16, 14, b"png", 1_700_000_000_000).unwrap();

        assert!(dir.path().join("5/16/14.tile").is_file());
        assert!(dir.path().join("5/16/14.expires").is_file());
        assert_eq!(sink.read_tile(5, 16, 14).unwrap(), b"png");
        assert_eq!(sink.tile_expiration(5, 16, 14), Some(1_700_000_000_000));
    }

    #[test]
    fn test_missing_tile_has_no_expiration() {
        let dir = TempDir::new().unwrap();
        let sink = DiskTileSink::open(dir.path()).unwrap();
        assert_eq!(sink.tile_expiration(1, 0, 0), None);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let sink = DiskTileSink::open(dir.path()).unwrap();
        sink.set_tile(2, 1, 3, b"data", 42).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path().join("2/1"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{:?}", names);
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_corrupt_expiration_is_ignored() {
        let dir = TempDir::new().unwrap();
        let sink = DiskTileSink::open(dir.path()).unwrap();
        sink.set_tile(0, 0, 0, b"x", 7).unwrap();
        fs::write(dir.path().join("0/0/0.expires"), "not a number").unwrap();
        assert_eq!(sink.tile_expiration(0, 0, 0), None);
    }

    #[test]
    fn test_read_only_sink() {
        let dir = TempDir::new().unwrap();
        let sink = DiskTileSink::open_read_only(dir.path()).unwrap();
        assert!(sink.is_read_only());
        assert!(matches!(
            sink.set_tile(0, 0, 0, b"x", 0),
            Err(SinkError::ReadOnly)
        ));

        let missing = dir.path().join("nope");
        assert!(DiskTileSink::open_read_only(missing).is_err());
    }
}
