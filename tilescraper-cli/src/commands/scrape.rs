//! `scrape` command: download a region into the cache.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use tilescraper::config::{format_size, parse_size};
use tilescraper::logging::init_logging;
use tilescraper::scraper::TileScraper;
use tilescraper::sink::DiskTileSink;
use tilescraper::source::{ReqwestClient, TileSource, XyzHttpSource};
use tracing::info;

use super::common::RegionArgs;
use crate::error::CliError;
use crate::progress::ProgressListener;

/// Arguments for `tilescraper scrape`.
#[derive(Debug, Args)]
pub struct ScrapeArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Cache directory
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Worker threads (1 = sequential)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Stop after downloading more than this much data (e.g. 500MB, 0 = unlimited)
    #[arg(long, value_parser = parse_size_arg)]
    pub max_bytes: Option<u64>,

    /// Days until downloaded tiles expire
    #[arg(long)]
    pub expire_days: Option<u64>,

    /// Skip tiles whose cached copy has not expired
    #[arg(long)]
    pub skip_unexpired: bool,

    /// Tint downloaded imagery red for debugging
    #[arg(long)]
    pub debug_tint: bool,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write a copy of the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

fn parse_size_arg(s: &str) -> Result<u64, String> {
    parse_size(s).map_err(|e| e.to_string())
}

/// Run the scrape command.
pub fn run(args: ScrapeArgs) -> Result<(), CliError> {
    let mut config = args.region.load_config()?;
    if let Some(dir) = &args.cache {
        config.cache.directory = dir.clone();
    }
    if let Some(threads) = args.threads {
        config.scrape.threads = threads.max(1);
    }
    if let Some(bytes) = args.max_bytes {
        config.scrape.max_bytes = bytes;
    }
    if let Some(days) = args.expire_days {
        config.cache.expire_days = days;
    }
    if let Some(timeout) = args.timeout {
        config.source.timeout = timeout;
    }
    if args.log_file.is_some() {
        config.logging.file = args.log_file.clone();
    }
    config.cache.skip_unexpired |= args.skip_unexpired;
    config.scrape.debug_tint |= args.debug_tint;

    let _log_guard = init_logging(&config.logging.level, config.logging.file.as_deref())
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let url = config.source.url.clone().ok_or_else(|| {
        CliError::Config("no tile URL given; use --url or set [source] url".into())
    })?;
    let client = ReqwestClient::with_timeout(config.source.timeout)
        .map_err(|e| CliError::Config(e.to_string()))?;
    let source = XyzHttpSource::new(client, url, config.source.max_level);
    source
        .validate_template()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    let sink = DiskTileSink::open(&config.cache.directory)
        .map_err(|e| CliError::Setup(e.into()))?;
    let request = config.request_for(args.region.region()?, source.zoom_levels());

    println!("Source: {}", source.template());
    println!("Cache:  {}", config.cache.directory.display());
    println!(
        "Zoom:   {}-{}, threads: {}, budget: {}",
        config.scrape.min_zoom,
        config.scrape.max_zoom,
        config.scrape.threads,
        if config.scrape.max_bytes == 0 {
            "unlimited".to_string()
        } else {
            format_size(config.scrape.max_bytes)
        }
    );

    let scraper = Arc::new(TileScraper::create(
        Arc::new(source),
        Arc::new(sink),
        request,
        Arc::new(if args.quiet {
            ProgressListener::hidden()
        } else {
            ProgressListener::new(0)
        }),
    )?);
    println!("Tiles:  {}", scraper.total_tiles());
    println!("Press Ctrl+C to stop");
    println!();

    let handle = Arc::clone(&scraper);
    ctrlc::set_handler(move || {
        handle.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let started = Instant::now();
    let completed = scraper.run()?;
    let elapsed = started.elapsed();

    let context = scraper.context();
    let counters = context.counters();
    info!(
        downloaded = counters.tiles_downloaded,
        bytes = counters.bytes_downloaded,
        elapsed_secs = elapsed.as_secs_f64(),
        "Scrape finished"
    );
    println!();
    println!(
        "Downloaded {} tiles ({}) in {:.1}s",
        counters.tiles_downloaded,
        format_size(counters.bytes_downloaded),
        elapsed.as_secs_f64()
    );
    if counters.tiles_absent > 0 || counters.tiles_skipped > 0 {
        println!(
            "Absent at source: {}, skipped as fresh: {}",
            counters.tiles_absent, counters.tiles_skipped
        );
    }

    if completed {
        Ok(())
    } else if context.is_canceled() {
        Err(CliError::Canceled)
    } else {
        Err(CliError::ScrapeFailed(
            counters
                .error_detail
                .unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}
