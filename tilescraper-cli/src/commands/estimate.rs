//! `estimate` command: count the tiles a scrape would fetch.

use clap::Args;
use tilescraper::scraper::{estimate_tile_count, MAX_TILES};
use tilescraper::source::{ReqwestClient, TileSource, XyzHttpSource};

use super::common::RegionArgs;
use crate::error::CliError;

/// Arguments for `tilescraper estimate`.
#[derive(Debug, Args)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub region: RegionArgs,
}

/// Run the estimate command.
pub fn run(args: EstimateArgs) -> Result<(), CliError> {
    let config = args.region.load_config()?;

    // Only the pyramid is consulted; no request is ever sent
    let client = ReqwestClient::new().map_err(|e| CliError::Config(e.to_string()))?;
    let template = config.source.url.clone().unwrap_or_default();
    let source = XyzHttpSource::new(client, template, config.source.max_level);

    let request = config.request_for(args.region.region()?, source.zoom_levels());
    let count = estimate_tile_count(&source, &request)?;

    println!(
        "Zoom {}-{}: {} tiles",
        config.scrape.min_zoom, config.scrape.max_zoom, count
    );
    if count >= MAX_TILES {
        println!(
            "Note: a single scrape is capped at {} tiles; split the region or narrow the zoom range",
            MAX_TILES
        );
    }
    Ok(())
}
