//! Progress and result reporting.
//!
//! The scraper never returns per-tile failures to its caller. Everything a
//! user sees about a running scrape arrives through a [`ScrapeListener`]:
//! one `started` call, a stream of `progress` calls, and exactly one of
//! `complete`, `canceled` or `error` at the end.

use tracing::{error, info};

/// Snapshot of scrape progress, taken just before a tile is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrapeProgress {
    /// Position of the current level in the run (0-based)
    pub level_index: usize,
    /// Number of levels in the run
    pub total_levels: usize,
    /// Tiles processed so far in the current level
    pub tiles_this_level: usize,
    /// Tiles queued for the current level
    pub total_this_level: usize,
    /// Tiles processed so far across the run
    pub tiles_total: usize,
    /// Tiles queued across the run
    pub total_tiles: usize,
}

impl ScrapeProgress {
    /// Fraction of the run processed, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total_tiles == 0 {
            return 1.0;
        }
        self.tiles_total as f64 / self.total_tiles as f64
    }
}

/// Receives run lifecycle events.
///
/// Callbacks are made from the thread that drives the scrape, never from
/// worker threads.
pub trait ScrapeListener: Send + Sync {
    /// The run is about to dispatch its first tile.
    fn on_request_started(&self) {}

    /// A tile is about to be processed.
    fn on_request_progress(&self, _progress: &ScrapeProgress) {}

    /// The run finished, possibly early because of the byte budget.
    fn on_request_complete(&self) {}

    /// The run stopped because cancellation was requested.
    fn on_request_canceled(&self) {}

    /// The run stopped because of an error.
    ///
    /// # Arguments
    ///
    /// * `detail` - Description of the first failure observed
    /// * `fatal` - Whether the run was aborted because of it
    fn on_request_error(&self, _detail: &str, _fatal: bool) {}
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ScrapeListener for NoopListener {}

/// Listener that reports through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl ScrapeListener for TracingListener {
    fn on_request_started(&self) {
        info!("Scrape started");
    }

    fn on_request_progress(&self, progress: &ScrapeProgress) {
        // Log at level boundaries only
        if progress.tiles_this_level == 0 {
            info!(
                level = progress.level_index + 1,
                levels = progress.total_levels,
                tiles = progress.total_this_level,
                done = progress.tiles_total,
                total = progress.total_tiles,
                "Scraping level"
            );
        }
    }

    fn on_request_complete(&self) {
        info!("Scrape complete");
    }

    fn on_request_canceled(&self) {
        info!("Scrape canceled");
    }

    fn on_request_error(&self, detail: &str, fatal: bool) {
        error!(fatal, "Scrape failed: {}", detail);
    }
}
