//! Download strategies.
//!
//! The driver loop is shared by every strategy and lives in the default
//! [`Downloader::download`] method. Strategies only decide how a
//! [`DownloadTask`] is executed and may hook the run and level boundaries.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info};

use super::context::{wrap_column, ScrapeContext, TileOutcome};
use super::task::DownloadTask;
use crate::coord::ZoomLevel;
use crate::listener::{ScrapeListener, ScrapeProgress};

/// Delay between readiness checks while the driver waits for backpressure
/// relief.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Why the driver loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Every discovered tile was processed
    Complete,
    /// The byte budget was exceeded
    BudgetReached,
    /// Cancellation was requested
    Canceled,
    /// A tile failed and the run was aborted
    Failed,
}

/// Strategy for executing tile downloads.
pub trait Downloader: Send + Sync {
    /// Execute or enqueue one task.
    fn download_tile(&self, task: DownloadTask);

    /// Whether another task may be dispatched now.
    fn check_ready(&self) -> bool {
        true
    }

    /// Called once before the first tile.
    fn on_download_enter(&self, _context: &ScrapeContext) {}

    /// Called before the first tile of each level.
    fn on_level_start(&self, _context: &ScrapeContext, _zoom: &ZoomLevel) {}

    /// Called after the last tile of each level has been dispatched.
    fn on_level_complete(&self, _context: &ScrapeContext) {}

    /// Called once after the driver loop, whatever its outcome.
    fn on_download_exit(&self, _context: &ScrapeContext) {}

    /// Release any resources held by the strategy.
    fn stop(&self) {}

    /// Run the scrape described by `context`.
    ///
    /// Reports exactly one of complete, canceled or error to `listener`.
    /// Returns `true` when the run completed, including an early finish
    /// because of the byte budget.
    fn download(&self, context: &Arc<ScrapeContext>, listener: &dyn ScrapeListener) -> bool {
        listener.on_request_started();
        self.on_download_enter(context);
        let outcome = drive(self, context, listener);
        self.on_download_exit(context);

        // Workers may have failed while the queue drained
        let outcome = match outcome {
            DriveOutcome::Complete | DriveOutcome::BudgetReached
                if context.had_download_error() =>
            {
                DriveOutcome::Failed
            }
            other => other,
        };

        match outcome {
            DriveOutcome::Complete | DriveOutcome::BudgetReached => {
                info!(
                    tiles = context.tiles_downloaded(),
                    bytes = context.bytes_downloaded(),
                    "Download finished"
                );
                listener.on_request_complete();
                true
            }
            DriveOutcome::Canceled => {
                info!(tiles = context.tiles_downloaded(), "Download canceled");
                listener.on_request_canceled();
                false
            }
            DriveOutcome::Failed => {
                let detail = context
                    .error_detail()
                    .unwrap_or_else(|| "tile download failed".to_string());
                error!(detail = %detail, "Download aborted");
                listener.on_request_error(&detail, true);
                false
            }
        }
    }
}

/// Block until the strategy accepts another task, or the run must stop.
fn wait_until_ready<D: Downloader + ?Sized>(
    downloader: &D,
    context: &ScrapeContext,
) -> Option<DriveOutcome> {
    loop {
        if context.had_download_error() {
            return Some(DriveOutcome::Failed);
        }
        if context.is_canceled() {
            return Some(DriveOutcome::Canceled);
        }
        if downloader.check_ready() {
            return None;
        }
        thread::sleep(READY_POLL_INTERVAL);
    }
}

/// The shared driver loop.
fn drive<D: Downloader + ?Sized>(
    downloader: &D,
    context: &Arc<ScrapeContext>,
    listener: &dyn ScrapeListener,
) -> DriveOutcome {
    let request = context.request();
    let total_levels = context.levels().len();
    let total_tiles = context.total_tiles();
    let mut tiles_total = 0;

    for (level_index, level) in context.levels().iter().enumerate() {
        let zoom = level.zoom;
        let wrap = context.source().wrap_columns(&zoom);
        debug!(level = zoom.level, tiles = level.tiles.len(), "Starting level");
        downloader.on_level_start(context, &zoom);

        for (tiles_this_level, tile) in level.tiles.iter().enumerate() {
            if let Some(stop) = wait_until_ready(downloader, context) {
                return stop;
            }

            listener.on_request_progress(&ScrapeProgress {
                level_index,
                total_levels,
                tiles_this_level,
                total_this_level: level.tiles.len(),
                tiles_total,
                total_tiles,
            });
            tiles_total += 1;

            let col = wrap_column(tile.col, wrap);
            if request.skip_unexpired_tiles && context.is_tile_unexpired(zoom.level, col, tile.row) {
                debug!(level = zoom.level, x = col, y = tile.row, "Tile unexpired, skipping");
                context.download_complete(&TileOutcome::Skipped);
                continue;
            }

            downloader.download_tile(DownloadTask::new(
                Arc::clone(context),
                zoom.level,
                col,
                tile.row,
            ));

            if context.budget_exceeded() {
                info!(
                    limit = request.max_download_bytes,
                    bytes = context.bytes_downloaded(),
                    "Download budget reached"
                );
                return DriveOutcome::BudgetReached;
            }
        }

        downloader.on_level_complete(context);
    }

    DriveOutcome::Complete
}

/// Runs every task synchronously on the driver thread.
///
/// Deterministic and easy to debug; used when a single thread is requested.
#[derive(Debug, Default)]
pub struct LegacyDownloader;

impl LegacyDownloader {
    pub fn new() -> Self {
        Self
    }
}

impl Downloader for LegacyDownloader {
    fn download_tile(&self, task: DownloadTask) {
        task.run();
    }
}
