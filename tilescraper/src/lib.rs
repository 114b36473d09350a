//! TileScraper - populate a local tile cache from a tiled imagery source.
//!
//! The library crawls a tile source across a geographic region and a range
//! of zoom levels, storing every fetched tile into a tile sink (cache) with an
//! expiration timestamp. It decides *which* tiles to fetch, *in what order*,
//! *how many at once*, and how to react to success, failure, expiry and
//! cancellation. Rendering, container formats and transport are left to the
//! [`source::TileSource`] and [`sink::TileSink`] implementations.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use geo::{point, Geometry};
//! use tilescraper::listener::TracingListener;
//! use tilescraper::request::CacheRequest;
//! use tilescraper::scraper::TileScraper;
//! use tilescraper::sink::DiskTileSink;
//! use tilescraper::source::{ReqwestClient, TileSource, XyzHttpSource};
//!
//! let source = XyzHttpSource::new(ReqwestClient::new()?, "https://tiles.example.com/{z}/{x}/{y}.png", 18);
//! let sink = DiskTileSink::open("/var/cache/tiles")?;
//! let request = CacheRequest::new(Geometry::Point(point!(x: 10.0, y: 20.0)))
//!     .with_zoom_range(source.zoom_levels(), 5, 12)
//!     .with_max_threads(4);
//!
//! let scraper = TileScraper::create(Arc::new(source), Arc::new(sink), request, Arc::new(TracingListener))?;
//! scraper.run()?;
//! ```

pub mod config;
pub mod coord;
pub mod error;
pub mod listener;
pub mod logging;
pub mod region;
pub mod request;
pub mod scraper;
pub mod sink;
pub mod source;
pub mod tint;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ScrapeError, ScrapeResult};
