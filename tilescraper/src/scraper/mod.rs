//! The scrape engine.
//!
//! # Architecture
//!
//! ```text
//! CacheRequest ──▶ TileScraper::create ──▶ ScrapeContext (discovery)
//!                        │
//!                        ▼
//!                  TileScraper::run
//!                        │  max_threads > 1 ?
//!            ┌───────────┴────────────┐
//!            ▼                        ▼
//!   LegacyDownloader        MultiThreadDownloader
//!   (task on driver)        (queue + worker pool)
//!            │                        │
//!            └──────── DownloadTask ──┘
//!                        │
//!            TileSource::tile_data ─▶ TileSink::set_tile
//!                        │
//!            ScrapeContext::download_complete (counters)
//! ```
//!
//! Both strategies share the driver loop in [`Downloader::download`], which
//! polls for errors, cancellation and backpressure before every tile and
//! reports through a [`ScrapeListener`](crate::listener::ScrapeListener).

mod context;
mod facade;
mod pool;
mod strategy;
mod task;

pub use context::{
    discover_tiles, wrap_column, Discovery, LevelTiles, ScrapeContext, ScrapeCounters,
    TileOutcome, MAX_TILES,
};
pub use facade::{estimate_tile_count, TileScraper};
pub use pool::{MultiThreadDownloader, QUEUE_DEPTH_FACTOR};
pub use strategy::{DriveOutcome, Downloader, LegacyDownloader, READY_POLL_INTERVAL};
pub use task::{DownloadTask, TaskReport, MAX_ATTEMPTS};
