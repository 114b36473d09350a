//! Scrape context: tile discovery and shared run state.
//!
//! Discovery walks the source's tile pyramid top-down. Every tile at the
//! coarsest level that overlaps the region's envelope is tested against the
//! region; selected tiles are admitted when their level is requested and
//! refined into their four children. Unselected tiles prune their whole
//! subtree, so the cost follows the region's outline rather than the size
//! of the pyramid.
//!
//! ```text
//! level 0   [ 0,0 ]  selected
//!              │
//! level 1   [0,0] [0,1] [1,0] [1,1]   only selected children recurse
//!              │           │
//! level 2    ....        ....
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{TilePoint, ZoomLevel};
use crate::error::{ScrapeError, ScrapeResult};
use crate::region::{self, RegionPart};
use crate::request::CacheRequest;
use crate::sink::TileSink;
use crate::source::TileSource;

/// Hard ceiling on the number of tiles a single scrape may discover.
pub const MAX_TILES: usize = 300_000;

/// Result of processing one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileOutcome {
    /// Fetched and stored; carries the number of bytes fetched
    Downloaded(u64),
    /// The source has no tile at this position
    Absent,
    /// Not fetched because the cached copy is still fresh
    Skipped,
    /// Every attempt failed; carries a description of the last failure
    Failed(String),
}

impl TileOutcome {
    /// Whether the tile was fetched and stored.
    pub fn is_success(&self) -> bool {
        matches!(self, TileOutcome::Downloaded(_))
    }
}

/// Tiles to fetch at one level.
#[derive(Debug, Clone)]
pub struct LevelTiles {
    pub zoom: ZoomLevel,
    pub tiles: Vec<TilePoint>,
}

/// Snapshot of the shared run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeCounters {
    pub tiles_downloaded: usize,
    pub bytes_downloaded: u64,
    pub tiles_absent: usize,
    pub tiles_skipped: usize,
    pub tiles_failed: usize,
    pub download_error: bool,
    /// Description of the first failure of the run
    pub error_detail: Option<String>,
}

/// Outcome of tile discovery.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Qualifying levels in ascending order, with their tiles
    pub levels: Vec<LevelTiles>,
    /// Tiles admitted across all levels, capped at [`MAX_TILES`]
    pub total_tiles: usize,
    pub min_level: u8,
    pub max_level: u8,
}

impl Discovery {
    /// Whether discovery stopped at the tile ceiling.
    pub fn hit_ceiling(&self) -> bool {
        self.total_tiles >= MAX_TILES
    }
}

/// Map a raw column onto the source's addressing.
///
/// Columns at or past `wrap` continue on the far side of the antimeridian.
pub fn wrap_column(col: u32, wrap: Option<u32>) -> u32 {
    match wrap {
        Some(wrap) if wrap > 0 && col >= wrap => col - wrap,
        _ => col,
    }
}

/// Discover the tiles covering `request.region` on `source`'s pyramid.
///
/// With `request.count_only` set, tiles are counted but the per-level lists
/// stay empty.
pub fn discover_tiles(source: &dyn TileSource, request: &CacheRequest) -> ScrapeResult<Discovery> {
    request.validate()?;

    let mut pyramid: Vec<ZoomLevel> = source.zoom_levels().to_vec();
    if pyramid.is_empty() {
        return Err(ScrapeError::NoZoomLevels(source.name().to_string()));
    }
    pyramid.sort_by_key(|zl| zl.level);

    let mut selected: Vec<ZoomLevel> = pyramid
        .iter()
        .filter(|zl| request.accepts_resolution(zl.resolution))
        .copied()
        .collect();
    if selected.is_empty() {
        debug!(
            level = pyramid[0].level,
            "No level within resolution bounds, using coarsest level"
        );
        selected.push(pyramid[0]);
    }

    let min_level = selected[0].level;
    let max_level = selected[selected.len() - 1].level;

    let projected = region::project_geometry(&request.region, source.srid())?;
    let parts = region::parts(&projected);

    let wraps = pyramid.iter().map(|zl| source.wrap_columns(zl)).collect();
    let rows = pyramid.iter().map(|zl| source.row_count(zl)).collect();
    let mut walker = Walker {
        pyramid: &pyramid,
        wraps,
        rows,
        origin_x: source.origin_x(),
        origin_y: source.origin_y(),
        min_level,
        max_level,
        count_only: request.count_only,
        seen: HashSet::new(),
        tiles: vec![Vec::new(); pyramid.len()],
        total: 0,
    };
    for part in &parts {
        walker.seed(part);
    }

    if walker.total >= MAX_TILES {
        warn!(
            limit = MAX_TILES,
            "Tile ceiling reached, region coverage is truncated"
        );
    }

    let total_tiles = walker.total;
    let mut per_level = walker.tiles;
    let levels = selected
        .into_iter()
        .map(|zoom| {
            let index = pyramid.iter().position(|zl| zl.level == zoom.level);
            let tiles = index
                .map(|i| std::mem::take(&mut per_level[i]))
                .unwrap_or_default();
            LevelTiles { zoom, tiles }
        })
        .collect();

    Ok(Discovery {
        levels,
        total_tiles,
        min_level,
        max_level,
    })
}

/// Recursive quad-tree walk over one pyramid.
struct Walker<'a> {
    pyramid: &'a [ZoomLevel],
    /// Antimeridian wrap per pyramid level
    wraps: Vec<Option<u32>>,
    /// Grid height per pyramid level
    rows: Vec<Option<u32>>,
    origin_x: f64,
    origin_y: f64,
    min_level: u8,
    max_level: u8,
    count_only: bool,
    seen: HashSet<(u8, TilePoint)>,
    /// Admitted tiles, indexed like `pyramid`
    tiles: Vec<Vec<TilePoint>>,
    total: usize,
}

impl Walker<'_> {
    fn seed(&mut self, part: &RegionPart) {
        let top = &self.pyramid[0];
        let envelope = part.envelope();
        let (min, max) = (envelope.min(), envelope.max());

        let first_col = top.column_at(self.origin_x, min.x).max(0);
        let last_col = top.column_at(self.origin_x, max.x).max(0);
        let first_row = top.row_at(self.origin_y, max.y).max(0);
        let last_row = top.row_at(self.origin_y, min.y).max(0);

        for row in first_row..=last_row {
            for col in first_col..=last_col {
                if self.total >= MAX_TILES {
                    return;
                }
                let (Ok(row), Ok(col)) = (u32::try_from(row), u32::try_from(col)) else {
                    continue;
                };
                self.visit(part, 0, TilePoint::new(row, col));
            }
        }
    }

    fn visit(&mut self, part: &RegionPart, index: usize, tile: TilePoint) {
        if self.total >= MAX_TILES {
            return;
        }

        if self.rows[index].is_some_and(|rows| tile.row >= rows) {
            return;
        }

        let zoom = self.pyramid[index];
        let corners = zoom.tile_corners(self.origin_x, self.origin_y, tile);
        if !part.intersects_tile(&corners) {
            return;
        }

        // Tiles past the antimeridian alias tiles already in the grid
        let key = TilePoint::new(tile.row, wrap_column(tile.col, self.wraps[index]));
        if zoom.level >= self.min_level
            && zoom.level <= self.max_level
            && self.seen.insert((zoom.level, key))
        {
            self.total += 1;
            if !self.count_only {
                self.tiles[index].push(tile);
            }
        }

        let next = index + 1;
        let Some(child_level) = self.pyramid.get(next) else {
            return;
        };
        // Children of this tile would not fit the u32 grid
        if tile.row > u32::MAX / 2 || tile.col > u32::MAX / 2 {
            return;
        }
        if child_level.level > self.max_level {
            return;
        }
        for child in tile.children() {
            self.visit(part, next, child);
        }
    }
}

/// Per-run state shared between the driver and worker threads.
///
/// The discovered tile lists are immutable once built. The counters live
/// behind a single mutex; cancellation is a token derived from the
/// request's, so cancelling the request also cancels the run.
pub struct ScrapeContext {
    source: Arc<dyn TileSource>,
    sink: Arc<dyn TileSink>,
    request: CacheRequest,
    discovery: Discovery,
    counters: Mutex<ScrapeCounters>,
    canceled: CancellationToken,
}

impl ScrapeContext {
    /// Build a context and discover the tiles to fetch.
    pub fn new(
        source: Arc<dyn TileSource>,
        sink: Arc<dyn TileSink>,
        request: CacheRequest,
    ) -> ScrapeResult<Self> {
        let discovery = discover_tiles(source.as_ref(), &request)?;
        info!(
            source = source.name(),
            min_level = discovery.min_level,
            max_level = discovery.max_level,
            tiles = discovery.total_tiles,
            "Tile discovery complete"
        );

        let canceled = request.cancellation_token().child_token();
        Ok(Self {
            source,
            sink,
            request,
            discovery,
            counters: Mutex::new(ScrapeCounters::default()),
            canceled,
        })
    }

    pub fn source(&self) -> &dyn TileSource {
        self.source.as_ref()
    }

    pub fn sink(&self) -> &dyn TileSink {
        self.sink.as_ref()
    }

    pub fn request(&self) -> &CacheRequest {
        &self.request
    }

    /// Qualifying levels in ascending order, with their tiles.
    pub fn levels(&self) -> &[LevelTiles] {
        &self.discovery.levels
    }

    pub fn min_level(&self) -> u8 {
        self.discovery.min_level
    }

    pub fn max_level(&self) -> u8 {
        self.discovery.max_level
    }

    /// Number of tiles discovered across all levels.
    pub fn total_tiles(&self) -> usize {
        self.discovery.total_tiles
    }

    /// Record the outcome of one tile.
    ///
    /// Called exactly once per [`DownloadTask`](super::DownloadTask).
    pub fn download_complete(&self, outcome: &TileOutcome) {
        let mut counters = self.counters.lock();
        match outcome {
            TileOutcome::Downloaded(bytes) => {
                counters.tiles_downloaded += 1;
                counters.bytes_downloaded += bytes;
            }
            TileOutcome::Absent => counters.tiles_absent += 1,
            TileOutcome::Skipped => counters.tiles_skipped += 1,
            TileOutcome::Failed(detail) => {
                counters.tiles_failed += 1;
                counters.download_error = true;
                if counters.error_detail.is_none() {
                    counters.error_detail = Some(detail.clone());
                }
            }
        }
    }

    pub fn tiles_downloaded(&self) -> usize {
        self.counters.lock().tiles_downloaded
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.counters.lock().bytes_downloaded
    }

    pub fn had_download_error(&self) -> bool {
        self.counters.lock().download_error
    }

    /// Description of the first failure, if any.
    pub fn error_detail(&self) -> Option<String> {
        self.counters.lock().error_detail.clone()
    }

    /// Consistent copy of every counter.
    pub fn counters(&self) -> ScrapeCounters {
        self.counters.lock().clone()
    }

    /// Whether the byte budget of the request has been exceeded.
    pub fn budget_exceeded(&self) -> bool {
        let limit = self.request.max_download_bytes;
        limit > 0 && self.bytes_downloaded() > limit
    }

    /// Stop dispatching new tiles. In-flight tiles still complete.
    pub fn cancel(&self) {
        self.canceled.cancel();
    }

    /// Whether the run or its request was cancelled.
    pub fn is_canceled(&self) -> bool {
        self.canceled.is_cancelled()
    }

    /// Whether the sink holds a copy of the tile that has not yet expired.
    pub fn is_tile_unexpired(&self, level: u8, x: u32, y: u32) -> bool {
        self.sink
            .tile_expiration(level, x, y)
            .is_some_and(|expires| expires > Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryTileSink;
    use crate::testing::MemorySource;
    use geo::{point, polygon, Geometry, GeometryCollection, LineString, Rect};
    use proptest::prelude::*;

    fn request(region: Geometry<f64>, source: &MemorySource, min: u8, max: u8) -> CacheRequest {
        CacheRequest::new(region).with_zoom_range(source.zoom_levels(), min, max)
    }

    fn bbox(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Geometry<f64> {
        Geometry::Rect(Rect::new(
            geo::coord! { x: min_lon, y: min_lat },
            geo::coord! { x: max_lon, y: max_lat },
        ))
    }

    #[test]
    fn test_point_selects_single_tile() {
        let source = MemorySource::new(8);
        let req = request(Geometry::Point(point!(x: 10.0, y: 20.0)), &source, 5, 5);
        let discovery = discover_tiles(&source, &req).unwrap();

        assert_eq!(discovery.total_tiles, 1);
        assert_eq!(discovery.levels.len(), 1);
        assert_eq!(discovery.levels[0].zoom.level, 5);
        assert_eq!(discovery.levels[0].tiles, vec![TilePoint::new(14, 16)]);
    }

    #[test]
    fn test_point_one_tile_per_level() {
        let source = MemorySource::new(8);
        let req = request(Geometry::Point(point!(x: 10.0, y: 20.0)), &source, 2, 6);
        let discovery = discover_tiles(&source, &req).unwrap();

        let levels: Vec<u8> = discovery.levels.iter().map(|l| l.zoom.level).collect();
        assert_eq!(levels, vec![2, 3, 4, 5, 6]);
        assert!(discovery.levels.iter().all(|l| l.tiles.len() == 1));
        assert_eq!(discovery.total_tiles, 5);
        assert_eq!((discovery.min_level, discovery.max_level), (2, 6));
    }

    #[test]
    fn test_whole_world_covers_every_tile() {
        let source = MemorySource::new(3);
        let req = request(bbox(-180.0, -85.0, 180.0, 85.0), &source, 0, 3);
        let discovery = discover_tiles(&source, &req).unwrap();

        let per_level: Vec<usize> = discovery.levels.iter().map(|l| l.tiles.len()).collect();
        assert_eq!(per_level, vec![1, 4, 16, 64]);
        assert_eq!(discovery.total_tiles, 85);
    }

    #[test]
    fn test_no_qualifying_level_falls_back_to_coarsest() {
        let source = MemorySource::new(4);
        let req = CacheRequest::new(Geometry::Point(point!(x: 1.0, y: 1.0)))
            .with_resolutions(1e-9, 2e-9);
        let discovery = discover_tiles(&source, &req).unwrap();

        assert_eq!(discovery.levels.len(), 1);
        assert_eq!(discovery.levels[0].zoom.level, 0);
        assert_eq!(discovery.total_tiles, 1);
    }

    #[test]
    fn test_zoom_range_beyond_pyramid_falls_back_to_coarsest() {
        let source = MemorySource::new(6);
        let req = request(Geometry::Point(point!(x: 10.0, y: 20.0)), &source, 12, 14);
        let discovery = discover_tiles(&source, &req).unwrap();

        let levels: Vec<u8> = discovery.levels.iter().map(|l| l.zoom.level).collect();
        assert_eq!(levels, vec![0]);
        assert_eq!(discovery.total_tiles, 1);
        assert_eq!((discovery.min_level, discovery.max_level), (0, 0));
    }

    #[test]
    fn test_line_follows_its_path() {
        let source = MemorySource::new(4);
        // Runs along the equator just north of it, from lon 1 to lon 89
        let line = Geometry::LineString(LineString::from(vec![(1.0, 1.0), (89.0, 1.0)]));
        let req = request(line, &source, 2, 2);
        let discovery = discover_tiles(&source, &req).unwrap();

        // Level 2 columns span 90 degrees; row 1 is just north of the equator
        assert_eq!(discovery.levels[0].tiles, vec![TilePoint::new(1, 2)]);
    }

    #[test]
    fn test_polygon_interior_tiles_are_selected() {
        let source = MemorySource::new(3);
        // Large polygon that fully contains some level-3 tiles
        let poly = Geometry::Polygon(polygon![
            (x: -100.0, y: -60.0),
            (x: 100.0, y: -60.0),
            (x: 100.0, y: 60.0),
            (x: -100.0, y: 60.0),
            (x: -100.0, y: -60.0),
        ]);
        let req = request(poly, &source, 3, 3);
        let discovery = discover_tiles(&source, &req).unwrap();

        // An interior tile not touched by any edge
        assert!(discovery.levels[0].tiles.contains(&TilePoint::new(3, 3)));
        assert!(!discovery.levels[0].tiles.contains(&TilePoint::new(0, 0)));
    }

    #[test]
    fn test_collection_children_are_deduplicated() {
        let source = MemorySource::new(6);
        let a = Geometry::Point(point!(x: 10.0, y: 20.0));
        let b = Geometry::Point(point!(x: 10.1, y: 20.1));
        let collection = Geometry::GeometryCollection(GeometryCollection::from(vec![a, b]));
        let req = request(collection, &source, 5, 5);
        let discovery = discover_tiles(&source, &req).unwrap();

        assert_eq!(discovery.total_tiles, 1);
        assert_eq!(discovery.levels[0].tiles.len(), 1);
    }

    #[test]
    fn test_count_only_keeps_lists_empty() {
        let source = MemorySource::new(4);
        let req = request(bbox(-10.0, -10.0, 10.0, 10.0), &source, 0, 4).with_count_only(true);
        let discovery = discover_tiles(&source, &req).unwrap();

        assert!(discovery.total_tiles > 0);
        assert!(discovery.levels.iter().all(|l| l.tiles.is_empty()));
    }

    #[test]
    fn test_tile_ceiling_is_enforced() {
        let source = MemorySource::new(12);
        let req = request(bbox(-180.0, -85.0, 180.0, 85.0), &source, 0, 12).with_count_only(true);
        let discovery = discover_tiles(&source, &req).unwrap();

        assert_eq!(discovery.total_tiles, MAX_TILES);
        assert!(discovery.hit_ceiling());
    }

    #[test]
    fn test_antimeridian_alias_is_not_counted_twice() {
        let source = MemorySource::new(2);
        // Touches the east edge of the grid exactly
        let req = request(bbox(170.0, 10.0, 180.0, 20.0), &source, 2, 2);
        let discovery = discover_tiles(&source, &req).unwrap();

        let keys: HashSet<(u32, u32)> = discovery.levels[0]
            .tiles
            .iter()
            .map(|t| (t.row, wrap_column(t.col, Some(4))))
            .collect();
        assert_eq!(keys.len(), discovery.levels[0].tiles.len());
    }

    #[test]
    fn test_south_pole_stays_inside_grid() {
        let source = MemorySource::new(2);
        let req = request(bbox(-10.0, -90.0, 10.0, -80.0), &source, 0, 2);
        let discovery = discover_tiles(&source, &req).unwrap();

        for level in &discovery.levels {
            let rows = 1u32 << level.zoom.level;
            assert!(level.tiles.iter().all(|t| t.row < rows));
        }
        assert_eq!(discovery.levels[0].tiles, vec![TilePoint::new(0, 0)]);
    }

    #[test]
    fn test_deep_level_request_stays_within_pyramid() {
        let source = MemorySource::new(40);
        let req = request(Geometry::Point(point!(x: 179.9, y: -85.0)), &source, 28, 40);
        let discovery = discover_tiles(&source, &req).unwrap();

        let levels: Vec<u8> = discovery.levels.iter().map(|l| l.zoom.level).collect();
        assert_eq!(levels, vec![28, 29, 30]);
        assert_eq!(discovery.total_tiles, 3);
    }

    #[test]
    fn test_wrap_column() {
        assert_eq!(wrap_column(3, Some(4)), 3);
        assert_eq!(wrap_column(4, Some(4)), 0);
        assert_eq!(wrap_column(5, Some(4)), 1);
        assert_eq!(wrap_column(9, None), 9);
    }

    #[test]
    fn test_empty_pyramid_is_rejected() {
        let source = MemorySource::with_levels(Vec::new());
        let req = CacheRequest::new(Geometry::Point(point!(x: 0.0, y: 0.0)));
        assert!(matches!(
            discover_tiles(&source, &req),
            Err(ScrapeError::NoZoomLevels(_))
        ));
    }

    #[test]
    fn test_counters_record_outcomes() {
        let source: Arc<dyn TileSource> = Arc::new(MemorySource::new(2));
        let sink: Arc<dyn TileSink> = Arc::new(MemoryTileSink::new());
        let req = CacheRequest::new(Geometry::Point(point!(x: 0.5, y: 0.5)));
        let context = ScrapeContext::new(source, sink, req).unwrap();

        context.download_complete(&TileOutcome::Downloaded(10));
        context.download_complete(&TileOutcome::Absent);
        context.download_complete(&TileOutcome::Skipped);
        assert!(!context.had_download_error());

        context.download_complete(&TileOutcome::Failed("first".into()));
        context.download_complete(&TileOutcome::Failed("second".into()));
        context.download_complete(&TileOutcome::Downloaded(5));

        let counters = context.counters();
        assert_eq!(counters.tiles_downloaded, 2);
        assert_eq!(counters.bytes_downloaded, 15);
        assert_eq!(counters.tiles_absent, 1);
        assert_eq!(counters.tiles_skipped, 1);
        assert_eq!(counters.tiles_failed, 2);
        assert!(counters.download_error);
        assert_eq!(context.error_detail().as_deref(), Some("first"));
    }

    #[test]
    fn test_counters_are_monotonic_under_concurrency() {
        let source: Arc<dyn TileSource> = Arc::new(MemorySource::new(1));
        let sink: Arc<dyn TileSink> = Arc::new(MemoryTileSink::new());
        let req = CacheRequest::new(Geometry::Point(point!(x: 0.5, y: 0.5)));
        let context = Arc::new(ScrapeContext::new(source, sink, req).unwrap());

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let context = Arc::clone(&context);
                std::thread::spawn(move || {
                    for n in 0..250u64 {
                        if (n + i) % 5 == 0 {
                            context.download_complete(&TileOutcome::Absent);
                        } else {
                            context.download_complete(&TileOutcome::Downloaded(3));
                        }
                    }
                })
            })
            .collect();

        let mut last = (0, 0);
        while writers.iter().any(|w| !w.is_finished()) {
            let snapshot = context.counters();
            assert!(snapshot.tiles_downloaded >= last.0);
            assert!(snapshot.bytes_downloaded >= last.1);
            last = (snapshot.tiles_downloaded, snapshot.bytes_downloaded);
        }
        for writer in writers {
            writer.join().unwrap();
        }

        // 4 writers x 250 completions, one in five absent
        assert_eq!(context.tiles_downloaded(), 800);
        assert_eq!(context.bytes_downloaded(), 2400);
    }

    #[test]
    fn test_request_cancel_propagates_to_context() {
        let source: Arc<dyn TileSource> = Arc::new(MemorySource::new(1));
        let sink: Arc<dyn TileSink> = Arc::new(MemoryTileSink::new());
        let req = CacheRequest::new(Geometry::Point(point!(x: 0.5, y: 0.5)));
        let handle = req.clone();
        let context = ScrapeContext::new(source, sink, req).unwrap();

        assert!(!context.is_canceled());
        handle.cancel();
        assert!(context.is_canceled());
    }

    #[test]
    fn test_unexpired_tile_detection() {
        let source: Arc<dyn TileSource> = Arc::new(MemorySource::new(1));
        let sink = Arc::new(MemoryTileSink::new());
        let now = Utc::now().timestamp_millis();
        sink.insert_expiration(1, 0, 0, now + 60_000);
        sink.insert_expiration(1, 1, 0, now - 60_000);

        let req = CacheRequest::new(Geometry::Point(point!(x: 0.5, y: 0.5)));
        let context = ScrapeContext::new(source, sink, req).unwrap();

        assert!(context.is_tile_unexpired(1, 0, 0));
        assert!(!context.is_tile_unexpired(1, 1, 0));
        assert!(!context.is_tile_unexpired(1, 0, 1));
    }

    /// Brute-force classification of a tile against a projected rectangle.
    fn classify(zoom: &ZoomLevel, source: &MemorySource, tile: TilePoint, region: &Rect<f64>) -> Option<bool> {
        let c = zoom.tile_corners(source.origin_x(), source.origin_y(), tile);
        let (west, north, east, south) = (c[0].x, c[0].y, c[2].x, c[2].y);
        let (min, max) = (region.min(), region.max());
        let eps = 1e-6;
        if min.x > east + eps || max.x < west - eps || min.y > north + eps || max.y < south - eps {
            Some(false)
        } else if min.x < east - eps && max.x > west + eps && min.y < north - eps && max.y > south + eps {
            Some(true)
        } else {
            None
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_discovery_matches_brute_force(
            lon in -170.0f64..150.0,
            lat in -75.0f64..60.0,
            width in 0.5f64..20.0,
            height in 0.5f64..15.0,
        ) {
            let source = MemorySource::new(3);
            let region = bbox(lon, lat, lon + width, lat + height);
            let req = request(region.clone(), &source, 0, 3);
            let discovery = discover_tiles(&source, &req).unwrap();

            let projected = region::project_geometry(&region, source.srid()).unwrap();
            let Geometry::Rect(projected) = projected else {
                panic!("rectangle projected to {:?}", projected);
            };

            for level in &discovery.levels {
                let found: HashSet<TilePoint> = level.tiles.iter().copied().collect();
                let n = 1u32 << level.zoom.level;
                for row in 0..n {
                    for col in 0..n {
                        let tile = TilePoint::new(row, col);
                        match classify(&level.zoom, &source, tile, &projected) {
                            Some(true) => prop_assert!(found.contains(&tile), "missing {} at {}", tile, level.zoom.level),
                            Some(false) => prop_assert!(!found.contains(&tile), "extra {} at {}", tile, level.zoom.level),
                            None => {}
                        }
                    }
                }
            }
        }
    }
}
