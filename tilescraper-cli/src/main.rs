//! TileScraper CLI - Command-line interface
//!
//! Populates a local tile cache from an XYZ tile server, or estimates how
//! many tiles a region would need.

mod commands;
mod error;
mod progress;

use clap::{Parser, Subcommand};

use commands::estimate::EstimateArgs;
use commands::scrape::ScrapeArgs;

#[derive(Parser)]
#[command(name = "tilescraper")]
#[command(version, about = "Populate a local tile cache from a tile server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the tiles covering a region into the cache
    Scrape(ScrapeArgs),
    /// Count the tiles covering a region without downloading anything
    Estimate(EstimateArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape(args) => commands::scrape::run(args),
        Commands::Estimate(args) => commands::estimate::run(args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
