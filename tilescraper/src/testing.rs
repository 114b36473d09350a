//! Test doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::coord::{web_mercator_levels, ZoomLevel, MERCATOR_HALF_WORLD, SRID_WEB_MERCATOR};
use crate::listener::{ScrapeListener, ScrapeProgress};
use crate::source::{SourceError, TileSource};

type TileKey = (u8, u32, u32);

/// Scripted in-memory tile source on a Web Mercator pyramid.
pub struct MemorySource {
    levels: Vec<ZoomLevel>,
    tile_bytes: Vec<u8>,
    always_fail: bool,
    /// Remaining transient failures per tile
    failures: Mutex<HashMap<TileKey, u32>>,
    absent: HashSet<TileKey>,
    delay: Option<Duration>,
    fetches: Mutex<Vec<TileKey>>,
}

impl MemorySource {
    pub fn new(max_level: u8) -> Self {
        Self::with_levels(web_mercator_levels(max_level, 256))
    }

    pub fn with_levels(levels: Vec<ZoomLevel>) -> Self {
        Self {
            levels,
            tile_bytes: vec![0x42; 16],
            always_fail: false,
            failures: Mutex::new(HashMap::new()),
            absent: HashSet::new(),
            delay: None,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tile_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.tile_bytes = bytes;
        self
    }

    /// Fail every fetch.
    pub fn failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    /// Fail the next `times` fetches of one tile.
    pub fn fail_times(self, level: u8, x: u32, y: u32, times: u32) -> Self {
        self.failures.lock().insert((level, x, y), times);
        self
    }

    /// Report one tile as absent.
    pub fn absent(mut self, level: u8, x: u32, y: u32) -> Self {
        self.absent.insert((level, x, y));
        self
    }

    /// Sleep this long in every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every fetch made, in order.
    pub fn fetches(&self) -> Vec<TileKey> {
        self.fetches.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.lock().len()
    }
}

impl TileSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
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
        self.fetches.lock().push((level, x, y));
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }

        if self.always_fail {
            return Err(SourceError::HttpError("scripted failure".into()));
        }
        if let Some(remaining) = self.failures.lock().get_mut(&(level, x, y)) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SourceError::HttpError("scripted transient failure".into()));
            }
        }
        if self.absent.contains(&(level, x, y)) {
            return Ok(None);
        }
        Ok(Some(self.tile_bytes.clone()))
    }

    fn wrap_columns(&self, level: &ZoomLevel) -> Option<u32> {
        1u32.checked_shl(level.level as u32)
    }

    fn row_count(&self, level: &ZoomLevel) -> Option<u32> {
        1u32.checked_shl(level.level as u32)
    }
}

/// Listener event, as recorded by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started,
    Progress(ScrapeProgress),
    Complete,
    Canceled,
    Error(String, bool),
}

/// Listener that records every event.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn progress(&self) -> Vec<ScrapeProgress> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn completed(&self) -> bool {
        self.events.lock().contains(&Event::Complete)
    }

    pub fn canceled(&self) -> bool {
        self.events.lock().contains(&Event::Canceled)
    }

    pub fn errors(&self) -> Vec<(String, bool)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Error(detail, fatal) => Some((detail.clone(), *fatal)),
                _ => None,
            })
            .collect()
    }
}

impl ScrapeListener for RecordingListener {
    fn on_request_started(&self) {
        self.events.lock().push(Event::Started);
    }

    fn on_request_progress(&self, progress: &ScrapeProgress) {
        self.events.lock().push(Event::Progress(*progress));
    }

    fn on_request_complete(&self) {
        self.events.lock().push(Event::Complete);
    }

    fn on_request_canceled(&self) {
        self.events.lock().push(Event::Canceled);
    }

    fn on_request_error(&self, detail: &str, fatal: bool) {
        self.events.lock().push(Event::Error(detail.to_string(), fatal));
    }
}
