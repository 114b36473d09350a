//! Scraper façade.

use std::sync::Arc;

use tracing::info;

use super::context::{discover_tiles, ScrapeContext};
use super::pool::MultiThreadDownloader;
use super::strategy::{Downloader, LegacyDownloader};
use crate::error::{ScrapeError, ScrapeResult};
use crate::listener::ScrapeListener;
use crate::request::CacheRequest;
use crate::sink::TileSink;
use crate::source::TileSource;

/// Populates a tile sink from a tile source.
///
/// `run` and `cancel` take `&self`, so a scraper can be shared behind an
/// `Arc` and cancelled from another thread while it runs.
pub struct TileScraper {
    context: Arc<ScrapeContext>,
    listener: Arc<dyn ScrapeListener>,
}

impl TileScraper {
    /// Validate the sink, discover tiles and bind a scraper to them.
    ///
    /// # Errors
    ///
    /// Fails if the sink is read-only, the source has no levels, the source
    /// SRID is unsupported, or the request is invalid.
    pub fn create(
        source: Arc<dyn TileSource>,
        sink: Arc<dyn TileSink>,
        request: CacheRequest,
        listener: Arc<dyn ScrapeListener>,
    ) -> ScrapeResult<Self> {
        if sink.is_read_only() {
            return Err(ScrapeError::ReadOnlySink);
        }
        let context = Arc::new(ScrapeContext::new(source, sink, request)?);
        Ok(Self { context, listener })
    }

    /// Run the scrape to completion, cancellation or failure.
    ///
    /// Returns `Ok(true)` when the run completed. Run-time failures are
    /// reported through the listener and yield `Ok(false)`; `Err` is only
    /// returned when the worker pool cannot be started.
    pub fn run(&self) -> ScrapeResult<bool> {
        let threads = self.context.request().max_threads;
        info!(
            threads,
            tiles = self.context.total_tiles(),
            "Starting scrape"
        );

        let downloader: Box<dyn Downloader> = if threads > 1 {
            Box::new(MultiThreadDownloader::new(threads)?)
        } else {
            Box::new(LegacyDownloader::new())
        };

        let completed = downloader.download(&self.context, self.listener.as_ref());
        downloader.stop();
        Ok(completed)
    }

    /// Stop dispatching tiles. Tiles already being fetched still complete.
    pub fn cancel(&self) {
        self.context.cancel();
    }

    pub fn total_tiles(&self) -> usize {
        self.context.total_tiles()
    }

    pub fn tiles_downloaded(&self) -> usize {
        self.context.tiles_downloaded()
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.context.bytes_downloaded()
    }

    pub fn had_download_error(&self) -> bool {
        self.context.had_download_error()
    }

    pub fn context(&self) -> &Arc<ScrapeContext> {
        &self.context
    }
}

/// Count the tiles a request would fetch, without touching the network or
/// any cache.
pub fn estimate_tile_count(source: &dyn TileSource, request: &CacheRequest) -> ScrapeResult<usize> {
    let request = request.clone().with_count_only(true);
    Ok(discover_tiles(source, &request)?.total_tiles)
}
