//! Scrape job configuration.
//!
//! Library users describe a scrape with [`CacheRequest`](crate::request::CacheRequest)
//! directly. The command-line front end reads an INI file instead:
//!
//! ```ini
//! [source]
//! url = https://tiles.example.com/{z}/{x}/{y}.png
//! max_level = 18
//! timeout = 30
//!
//! [cache]
//! directory = ~/tiles
//! expire_days = 7
//! skip_unexpired = true
//!
//! [scrape]
//! threads = 4
//! min_zoom = 5
//! max_zoom = 12
//! max_bytes = 500MB
//! debug_tint = false
//!
//! [logging]
//! level = info
//! file = ~/tilescraper.log
//! ```
//!
//! Missing keys keep their defaults; a missing file yields the defaults.

mod file;
mod parser;
mod settings;
mod size;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, LoggingSettings, ScrapeConfig, ScrapeSettings, SourceSettings,
    DEFAULT_EXPIRE_DAYS, DEFAULT_LOG_LEVEL, DEFAULT_MAX_LEVEL, DEFAULT_MAX_ZOOM,
    DEFAULT_MIN_ZOOM, DEFAULT_THREADS, DEFAULT_TIMEOUT_SECS,
};
pub use size::{format_size, parse_size, SizeParseError};
