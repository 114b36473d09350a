//! Arguments and helpers shared by the commands.

use std::path::PathBuf;

use clap::Args;
use geo::{Coord, Geometry, Point, Rect};
use tilescraper::config::ScrapeConfig;

use crate::error::CliError;

/// Region, zoom and configuration arguments.
#[derive(Debug, Args)]
pub struct RegionArgs {
    /// Bounding box as min_lon,min_lat,max_lon,max_lat
    #[arg(long, value_parser = parse_bbox, conflicts_with = "point", required_unless_present = "point", allow_hyphen_values = true)]
    pub bbox: Option<Geometry<f64>>,

    /// Single location as lon,lat
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub point: Option<Geometry<f64>>,

    /// Coarsest zoom level to fetch
    #[arg(long)]
    pub min_zoom: Option<u8>,

    /// Finest zoom level to fetch
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Tile URL template with {z}, {x} and {y} (or {-y}) placeholders
    #[arg(long)]
    pub url: Option<String>,

    /// Finest level served by the tile server
    #[arg(long)]
    pub max_level: Option<u8>,

    /// Configuration file (default: user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RegionArgs {
    /// The requested region.
    pub fn region(&self) -> Result<Geometry<f64>, CliError> {
        self.bbox
            .clone()
            .or_else(|| self.point.clone())
            .ok_or_else(|| CliError::InvalidArgument("either --bbox or --point is required".into()))
    }

    /// Load the configuration file and apply these arguments over it.
    pub fn load_config(&self) -> Result<ScrapeConfig, CliError> {
        let mut config = match &self.config {
            Some(path) if !path.exists() => {
                return Err(CliError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )))
            }
            Some(path) => ScrapeConfig::load_from(path)?,
            None => ScrapeConfig::load()?,
        };

        if let Some(z) = self.min_zoom {
            config.scrape.min_zoom = z;
        }
        if let Some(z) = self.max_zoom {
            config.scrape.max_zoom = z;
        }
        if let Some(url) = &self.url {
            config.source.url = Some(url.clone());
        }
        if let Some(level) = self.max_level {
            config.source.max_level = level;
        }
        Ok(config)
    }
}

fn parse_numbers<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("'{}': {}", s, e))?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected {} comma-separated numbers, got {}", N, v.len()))
}

/// Parse `min_lon,min_lat,max_lon,max_lat`.
pub fn parse_bbox(s: &str) -> Result<Geometry<f64>, String> {
    let [min_lon, min_lat, max_lon, max_lat] = parse_numbers::<4>(s)?;
    if min_lon > max_lon || min_lat > max_lat {
        return Err(format!("'{}': minimum exceeds maximum", s));
    }
    Ok(Geometry::Rect(Rect::new(
        Coord { x: min_lon, y: min_lat },
        Coord { x: max_lon, y: max_lat },
    )))
}

/// Parse `lon,lat`.
pub fn parse_point(s: &str) -> Result<Geometry<f64>, String> {
    let [lon, lat] = parse_numbers::<2>(s)?;
    Ok(Geometry::Point(Point::new(lon, lat)))
}
