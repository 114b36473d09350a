//! Per-tile fetch with retry.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use super::context::{ScrapeContext, TileOutcome};
use crate::tint::apply_debug_tint;

/// Fetch attempts per tile before the tile is recorded as failed.
pub const MAX_ATTEMPTS: u32 = 2;

/// What happened to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub outcome: TileOutcome,
    /// Fetch attempts made; 0 when the tile was skipped
    pub attempts: u32,
}

/// Fetches one tile and stores it into the sink.
///
/// Transient source failures and sink write failures are retried up to
/// [`MAX_ATTEMPTS`]. A tile the source reports as absent ends the task
/// immediately and is not an error.
pub struct DownloadTask {
    context: Arc<ScrapeContext>,
    level: u8,
    x: u32,
    y: u32,
}

impl DownloadTask {
    pub fn new(context: Arc<ScrapeContext>, level: u8, x: u32, y: u32) -> Self {
        Self {
            context,
            level,
            x,
            y,
        }
    }

    /// `(level, x, y)` of the tile.
    pub fn tile(&self) -> (u8, u32, u32) {
        (self.level, self.x, self.y)
    }

    /// Run the task and record its outcome on the context.
    pub fn run(self) -> TaskReport {
        let report = self.execute();
        self.context.download_complete(&report.outcome);
        report
    }

    fn execute(&self) -> TaskReport {
        let (level, x, y) = self.tile();
        let request = self.context.request();

        if request.skip_unexpired_tiles && self.context.is_tile_unexpired(level, x, y) {
            debug!(level, x, y, "Tile unexpired, skipping");
            return TaskReport {
                outcome: TileOutcome::Skipped,
                attempts: 0,
            };
        }

        let mut attempts = 0;
        let mut last_error = String::new();
        while attempts < MAX_ATTEMPTS {
            attempts += 1;
            match self.context.source().tile_data(level, x, y) {
                Ok(Some(data)) => match self.store(&data) {
                    Ok(()) => {
                        debug!(level, x, y, bytes = data.len(), attempts, "Tile stored");
                        return TaskReport {
                            outcome: TileOutcome::Downloaded(data.len() as u64),
                            attempts,
                        };
                    }
                    Err(e) => {
                        warn!(level, x, y, attempt = attempts, error = %e, "Failed to store tile");
                        last_error = e.to_string();
                    }
                },
                Ok(None) => {
                    debug!(level, x, y, "Tile absent at source");
                    return TaskReport {
                        outcome: TileOutcome::Absent,
                        attempts,
                    };
                }
                Err(e) => {
                    warn!(level, x, y, attempt = attempts, error = %e, "Tile fetch failed");
                    last_error = e.to_string();
                }
            }
        }

        TaskReport {
            outcome: TileOutcome::Failed(format!(
                "tile {}/{}/{} failed after {} attempts: {}",
                level, x, y, attempts, last_error
            )),
            attempts,
        }
    }

    fn store(&self, data: &[u8]) -> Result<(), crate::sink::SinkError> {
        let (level, x, y) = self.tile();
        let request = self.context.request();
        let offset_millis = i64::try_from(request.expiration_offset.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Utc::now().timestamp_millis().saturating_add(offset_millis);

        if request.debug_tint {
            match apply_debug_tint(data) {
                Ok(tinted) => {
                    return self
                        .context
                        .sink()
                        .set_tile(level, x, y, &tinted, expires_at)
                }
                Err(e) => warn!(level, x, y, error = %e, "Debug tint failed, storing original"),
            }
        }
        self.context.sink().set_tile(level, x, y, data, expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CacheRequest;
    use crate::sink::{MemoryTileSink, TileSink};
    use crate::source::TileSource;
    use crate::testing::MemorySource;
    use geo::{point, Geometry};
    use std::time::Duration;

    fn context(source: Arc<MemorySource>, sink: Arc<MemoryTileSink>, request: CacheRequest) -> Arc<ScrapeContext> {
        let source: Arc<dyn TileSource> = source;
        let sink: Arc<dyn TileSink> = sink;
        Arc::new(ScrapeContext::new(source, sink, request).unwrap())
    }

    fn request() -> CacheRequest {
        CacheRequest::new(Geometry::Point(point!(x: 10.0, y: 20.0)))
    }

    #[test]
    fn test_success_stores_tile_with_expiration() {
        let source = Arc::new(MemorySource::new(5).with_tile_bytes(vec![7; 60]));
        let sink = Arc::new(MemoryTileSink::new());
        let req = request().with_expiration_offset(Duration::from_secs(3600));
        let ctx = context(Arc::clone(&source), Arc::clone(&sink), req);

        let before = Utc::now().timestamp_millis();
        let report = DownloadTask::new(Arc::clone(&ctx), 5, 16, 14).run();

        assert_eq!(report, TaskReport { outcome: TileOutcome::Downloaded(60), attempts: 1 });
        let stored = sink.get(5, 16, 14).unwrap();
        assert_eq!(stored.data, vec![7; 60]);
        assert!(stored.expires_at_millis >= before + 3_600_000);
        assert_eq!(ctx.tiles_downloaded(), 1);
        assert_eq!(ctx.bytes_downloaded(), 60);
    }

    #[test]
    fn test_single_transient_failure_is_retried() {
        let source = Arc::new(MemorySource::new(5).fail_times(5, 16, 14, 1));
        let sink = Arc::new(MemoryTileSink::new());
        let ctx = context(Arc::clone(&source), Arc::clone(&sink), request());

        let report = DownloadTask::new(Arc::clone(&ctx), 5, 16, 14).run();

        assert!(report.outcome.is_success());
        assert_eq!(report.attempts, 2);
        assert_eq!(source.fetch_count(), 2);
        assert!(!ctx.had_download_error());
    }

    #[test]
    fn test_persistent_failure_exhausts_attempts() {
        let source = Arc::new(MemorySource::new(5).failing());
        let sink = Arc::new(MemoryTileSink::new());
        let ctx = context(Arc::clone(&source), Arc::clone(&sink), request());

        let report = DownloadTask::new(Arc::clone(&ctx), 5, 16, 14).run();

        assert!(matches!(report.outcome, TileOutcome::Failed(_)));
        assert_eq!(report.attempts, MAX_ATTEMPTS);
        assert_eq!(source.fetch_count(), 2);
        assert!(ctx.had_download_error());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_absent_tile_is_not_an_error() {
        let source = Arc::new(MemorySource::new(5).absent(5, 16, 14));
        let sink = Arc::new(MemoryTileSink::new());
        let ctx = context(Arc::clone(&source), Arc::clone(&sink), request());

        let report = DownloadTask::new(Arc::clone(&ctx), 5, 16, 14).run();

        assert_eq!(report, TaskReport { outcome: TileOutcome::Absent, attempts: 1 });
        assert!(!ctx.had_download_error());
        assert_eq!(ctx.tiles_downloaded(), 0);
        assert_eq!(ctx.counters().tiles_absent, 1);
    }

    #[test]
    fn test_unexpired_tile_is_never_fetched() {
        let source = Arc::new(MemorySource::new(5));
        let sink = Arc::new(MemoryTileSink::new());
        sink.insert_expiration(5, 16, 14, Utc::now().timestamp_millis() + 60_000);
        let ctx = context(Arc::clone(&source), Arc::clone(&sink), request().with_skip_unexpired_tiles(true));

        let report = DownloadTask::new(Arc::clone(&ctx), 5, 16, 14).run();

        assert_eq!(report, TaskReport { outcome: TileOutcome::Skipped, attempts: 0 });
        assert_eq!(source.fetch_count(), 0);
    }

    #[test]
    fn test_expired_tile_is_refetched() {
        let source = Arc::new(MemorySource::new(5));
        let sink = Arc::new(MemoryTileSink::new());
        sink.insert_expiration(5, 16, 14, Utc::now().timestamp_millis() - 1);
        let ctx = context(Arc::clone(&source), Arc::clone(&sink), request().with_skip_unexpired_tiles(true));

        let report = DownloadTask::new(Arc::clone(&ctx), 5, 16, 14).run();

        assert!(report.outcome.is_success());
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn test_debug_tint_falls_back_to_original_bytes() {
        // Not an image, so tinting fails and the raw bytes are stored
        let source = Arc::new(MemorySource::new(5).with_tile_bytes(b"raw".to_vec()));
        let sink = Arc::new(MemoryTileSink::new());
        let ctx = context(Arc::clone(&source), Arc::clone(&sink), request().with_debug_tint(true));

        let report = DownloadTask::new(Arc::clone(&ctx), 5, 16, 14).run();

        assert!(report.outcome.is_success());
        assert_eq!(sink.get(5, 16, 14).unwrap().data, b"raw");
    }
}
