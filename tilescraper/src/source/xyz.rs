//! Slippy-map (XYZ) HTTP tile source.
//!
//! Serves a standard Web Mercator pyramid with 256 pixel tiles and the grid
//! origin at the north-west corner of the world. Tile URLs are produced
//! from a template containing `{z}`, `{x}` and either `{y}` or `{-y}` (TMS
//! row order).

use crate::coord::{
    web_mercator_levels, ZoomLevel, DEFAULT_TILE_SIZE, MAX_PYRAMID_LEVEL, MERCATOR_HALF_WORLD,
    SRID_WEB_MERCATOR,
};

use super::http::HttpClient;
use super::types::{SourceError, TileSource};

/// Tile source backed by an XYZ URL template.
pub struct XyzHttpSource<C: HttpClient> {
    http_client: C,
    template: String,
    levels: Vec<ZoomLevel>,
}

impl<C: HttpClient> XyzHttpSource<C> {
    /// Creates a source serving levels `0..=max_level`.
    ///
    /// # Arguments
    ///
    /// * `http_client` - Transport used for tile requests
    /// * `template` - URL template, e.g. `https://tiles.example.com/{z}/{x}/{y}.png`
    /// * `max_level` - Finest level served, capped at [`MAX_PYRAMID_LEVEL`]
    pub fn new(http_client: C, template: impl Into<String>, max_level: u8) -> Self {
        Self {
            http_client,
            template: template.into(),
            levels: web_mercator_levels(max_level, DEFAULT_TILE_SIZE),
        }
    }

    /// The URL template this source was built with.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Check that the template addresses every tile uniquely.
    pub fn validate_template(&self) -> Result<(), SourceError> {
        let has_y = self.template.contains("{y}") || self.template.contains("{-y}");
        if !self.template.contains("{z}") || !self.template.contains("{x}") || !has_y {
            return Err(SourceError::InvalidTemplate(format!(
                "'{}' must contain {{z}}, {{x}} and {{y}} or {{-y}}",
                self.template
            )));
        }
        Ok(())
    }

    /// Build the request URL for a tile.
    pub fn tile_url(&self, level: u8, x: u32, y: u32) -> String {
        let rows = 1u64 << level.min(MAX_PYRAMID_LEVEL);
        let flipped = rows.saturating_sub(1).saturating_sub(y as u64);
        self.template
            .replace("{z}", &level.to_string())
            .replace("{x}", &x.to_string())
            .replace("{-y}", &flipped.to_string())
            .replace("{y}", &y.to_string())
    }
}

impl<C: HttpClient> TileSource for XyzHttpSource<C> {
    fn name(&self) -> &str {
        "xyz"
    }

    fn srid(&self) -> i32 {
        SRID_WEB_MERCATOR
    }

    fn origin_x(&self) -> f64 {
        -MERCATOR_HALF_WORLD
    }

    fn origin_y(&self) -> f64 {
        MERCATOR_HALF_WORLD
    }

    fn zoom_levels(&self) -> &[ZoomLevel] {
        &self.levels
    }

    fn tile_data(&self, level: u8, x: u32, y: u32) -> Result<Option<Vec<u8>>, SourceError> {
        if self.zoom_level(level).is_none() {
            return Err(SourceError::UnknownLevel(level));
        }
        self.http_client.get(&self.tile_url(level, x, y))
    }

    fn wrap_columns(&self, level: &ZoomLevel) -> Option<u32> {
        1u32.checked_shl(level.level as u32)
    }

    fn row_count(&self, level: &ZoomLevel) -> Option<u32> {
        1u32.checked_shl(level.level as u32)
    }
}
