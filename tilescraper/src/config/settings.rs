//! Settings structs for each configuration section.

use std::path::PathBuf;
use std::time::Duration;

use geo::Geometry;

use crate::coord::ZoomLevel;
use crate::request::CacheRequest;

pub const DEFAULT_MAX_LEVEL: u8 = 18;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EXPIRE_DAYS: u64 = 7;
pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_MIN_ZOOM: u8 = 0;
pub const DEFAULT_MAX_ZOOM: u8 = 12;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Complete scrape configuration loaded from an INI file.
#[derive(Debug, Clone, Default)]
pub struct ScrapeConfig {
    pub source: SourceSettings,
    pub cache: CacheSettings,
    pub scrape: ScrapeSettings,
    pub logging: LoggingSettings,
}

/// `[source]` section.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    /// XYZ URL template
    pub url: Option<String>,
    /// Finest level the source serves
    pub max_level: u8,
    /// HTTP timeout in seconds
    pub timeout: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_level: DEFAULT_MAX_LEVEL,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub directory: PathBuf,
    /// Days until a stored tile expires
    pub expire_days: u64,
    pub skip_unexpired: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("tilescraper"),
            expire_days: DEFAULT_EXPIRE_DAYS,
            skip_unexpired: false,
        }
    }
}

/// `[scrape]` section.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub threads: usize,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Byte budget, 0 = unlimited
    pub max_bytes: u64,
    pub debug_tint: bool,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            max_bytes: 0,
            debug_tint: false,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Optional log file
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl ScrapeConfig {
    /// Build a request for `region` from these settings.
    ///
    /// # Arguments
    ///
    /// * `region` - Target region in WGS84
    /// * `levels` - Pyramid of the source the request will run against
    pub fn request_for(&self, region: Geometry<f64>, levels: &[ZoomLevel]) -> CacheRequest {
        CacheRequest::new(region)
            .with_zoom_range(levels, self.scrape.min_zoom, self.scrape.max_zoom)
            .with_max_threads(self.scrape.threads)
            .with_max_download_bytes(self.scrape.max_bytes)
            .with_expiration_offset(Duration::from_secs(
                self.cache.expire_days.saturating_mul(SECONDS_PER_DAY),
            ))
            .with_skip_unexpired_tiles(self.cache.skip_unexpired)
            .with_debug_tint(self.scrape.debug_tint)
    }
}
