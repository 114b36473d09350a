//! Cache request configuration.
//!
//! A [`CacheRequest`] is the full configuration surface of a scrape: which
//! region, which levels, how many threads, how much data, and how long the
//! stored tiles stay fresh. It is immutable for the duration of a run except
//! for its cancellation token, which both the caller and the engine may trip.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use geo::{point, Geometry};
//! use tilescraper::coord::web_mercator_levels;
//! use tilescraper::request::CacheRequest;
//!
//! let levels = web_mercator_levels(18, 256);
//! let request = CacheRequest::new(Geometry::Point(point!(x: 10.0, y: 20.0)))
//!     .with_zoom_range(&levels, 5, 12)
//!     .with_max_threads(4)
//!     .with_expiration_offset(Duration::from_secs(24 * 3600));
//!
//! assert!(request.validate().is_ok());
//! ```

use std::time::Duration;

use geo::Geometry;
use tokio_util::sync::CancellationToken;

use crate::coord::ZoomLevel;
use crate::error::{ScrapeError, ScrapeResult};

/// Default freshness window for stored tiles (7 days).
pub const DEFAULT_EXPIRATION_OFFSET: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Relative slack applied when deriving resolution bounds from levels.
const RESOLUTION_SLACK: f64 = 1e-6;

/// Caller-supplied description of a scrape.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    /// Target region in WGS84 (x = longitude, y = latitude)
    pub region: Geometry<f64>,
    /// Finest qualifying resolution (inclusive)
    pub min_resolution: f64,
    /// Coarsest qualifying resolution (inclusive)
    pub max_resolution: f64,
    /// Worker threads; values above 1 select the threaded downloader
    pub max_threads: usize,
    /// Soft byte budget for the run, 0 = unlimited
    pub max_download_bytes: u64,
    /// How far in the future freshly stored tiles expire
    pub expiration_offset: Duration,
    /// Skip tiles the sink reports as not yet expired
    pub skip_unexpired_tiles: bool,
    /// Only count tiles, never fetch them
    pub count_only: bool,
    /// Tint fetched imagery so fresh tiles stand out
    pub debug_tint: bool,
    canceled: CancellationToken,
}

impl CacheRequest {
    /// Creates a request for `region` covering every level of the source.
    pub fn new(region: Geometry<f64>) -> Self {
        Self {
            region,
            min_resolution: 0.0,
            max_resolution: f64::MAX,
            max_threads: 1,
            max_download_bytes: 0,
            expiration_offset: DEFAULT_EXPIRATION_OFFSET,
            skip_unexpired_tiles: false,
            count_only: false,
            debug_tint: false,
            canceled: CancellationToken::new(),
        }
    }

    /// Set the inclusive resolution bounds.
    pub fn with_resolutions(mut self, min_resolution: f64, max_resolution: f64) -> Self {
        self.min_resolution = min_resolution;
        self.max_resolution = max_resolution;
        self
    }

    /// Set resolution bounds so that exactly the levels `min_level..=max_level`
    /// of `levels` qualify.
    ///
    /// Levels missing from `levels` are ignored. If none of the range exists,
    /// the bounds are collapsed so that no level qualifies and discovery
    /// falls back to the coarsest level.
    pub fn with_zoom_range(mut self, levels: &[ZoomLevel], min_level: u8, max_level: u8) -> Self {
        let (lo, hi) = (min_level.min(max_level), min_level.max(max_level));
        let in_range = || levels.iter().filter(|l| (lo..=hi).contains(&l.level));

        let finest = in_range().map(|l| l.resolution).reduce(f64::min);
        let coarsest = in_range().map(|l| l.resolution).reduce(f64::max);
        if let (Some(finest), Some(coarsest)) = (finest, coarsest) {
            self.min_resolution = finest * (1.0 - RESOLUTION_SLACK);
            self.max_resolution = coarsest * (1.0 + RESOLUTION_SLACK);
        } else {
            self.min_resolution = 0.0;
            self.max_resolution = 0.0;
        }
        self
    }

    /// Set the worker thread count.
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the soft byte budget (0 = unlimited).
    pub fn with_max_download_bytes(mut self, max_download_bytes: u64) -> Self {
        self.max_download_bytes = max_download_bytes;
        self
    }

    /// Set the expiration offset for stored tiles.
    pub fn with_expiration_offset(mut self, offset: Duration) -> Self {
        self.expiration_offset = offset;
        self
    }

    /// Enable or disable skipping of unexpired tiles.
    pub fn with_skip_unexpired_tiles(mut self, skip: bool) -> Self {
        self.skip_unexpired_tiles = skip;
        self
    }

    /// Enable or disable count-only mode.
    pub fn with_count_only(mut self, count_only: bool) -> Self {
        self.count_only = count_only;
        self
    }

    /// Enable or disable the debug tint.
    pub fn with_debug_tint(mut self, debug_tint: bool) -> Self {
        self.debug_tint = debug_tint;
        self
    }

    /// Whether `resolution` falls within the request's bounds.
    ///
    /// The bounds are treated as an unordered pair.
    pub fn accepts_resolution(&self, resolution: f64) -> bool {
        let lo = self.min_resolution.min(self.max_resolution);
        let hi = self.min_resolution.max(self.max_resolution);
        resolution >= lo && resolution <= hi
    }

    /// Request cancellation of any scrape using this request.
    ///
    /// Cancellation is cooperative: tiles already being fetched complete.
    pub fn cancel(&self) {
        self.canceled.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        self.canceled.is_cancelled()
    }

    /// Token shared by every clone of this request.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.canceled
    }

    /// Check the request for values no scrape could honor.
    pub fn validate(&self) -> ScrapeResult<()> {
        if !self.min_resolution.is_finite() || self.min_resolution < 0.0 {
            return Err(ScrapeError::InvalidRequest(format!(
                "min_resolution must be a non-negative number, got {}",
                self.min_resolution
            )));
        }
        if self.max_resolution.is_nan() || self.max_resolution < 0.0 {
            return Err(ScrapeError::InvalidRequest(format!(
                "max_resolution must be a non-negative number, got {}",
                self.max_resolution
            )));
        }
        Ok(())
    }
}
