//! Tile sources.
//!
//! A [`TileSource`] describes a tile pyramid (its projection, grid origin and
//! zoom levels) and fetches the encoded bytes of individual tiles. The
//! scraper never interprets tile bytes; it only decides which tiles to ask
//! for.
//!
//! [`XyzHttpSource`] is the bundled implementation for slippy-map style
//! servers. The HTTP transport is abstracted behind [`HttpClient`] so that
//! sources can be exercised without a network.

mod http;
mod types;
mod xyz;

pub use http::{HttpClient, ReqwestClient};
pub use types::{SourceError, TileSource};
pub use xyz::XyzHttpSource;
