//! Error types for scrape setup.
//!
//! Only synchronous preconditions are reported as errors. Once a run has
//! started, tile failures are delivered through the
//! [`ScrapeListener`](crate::listener::ScrapeListener) instead.

use std::io;

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::coord::CoordError;
use crate::sink::SinkError;
use crate::source::SourceError;

/// Result type for scrape operations.
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Errors that can prevent a scrape from starting.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The sink does not accept writes.
    #[error("tile sink is read-only")]
    ReadOnlySink,

    /// The source has no zoom levels to scrape.
    #[error("tile source '{0}' has no zoom levels")]
    NoZoomLevels(String),

    /// The request holds values no scrape can honor.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] io::Error),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigFileError),
}
