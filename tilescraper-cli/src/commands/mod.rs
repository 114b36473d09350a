//! CLI command implementations.
//!
//! - [`scrape`] - Download a region into the cache
//! - [`estimate`] - Count the tiles a scrape would fetch

pub mod common;
pub mod estimate;
pub mod scrape;
