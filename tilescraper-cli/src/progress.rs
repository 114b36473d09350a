//! Terminal progress display for a running scrape.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tilescraper::listener::{ScrapeListener, ScrapeProgress};

const TEMPLATE: &str =
    "{elapsed_precise} [{bar:40.cyan/blue}] {pos}/{len} tiles ({per_sec}, eta {eta}) | {msg}";

/// Listener drawing an `indicatif` progress bar on stdout.
pub struct ProgressListener {
    bar: ProgressBar,
}

impl ProgressListener {
    /// Create a bar sized for `total_tiles`.
    pub fn new(total_tiles: u64) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total_tiles), ProgressDrawTarget::stdout());
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ ");
        bar.set_style(style);
        Self { bar }
    }

    /// A listener that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

/// Status text for the bar.
fn level_message(progress: &ScrapeProgress) -> String {
    format!(
        "level {}/{} ({}/{})",
        progress.level_index + 1,
        progress.total_levels,
        progress.tiles_this_level,
        progress.total_this_level
    )
}

impl ScrapeListener for ProgressListener {
    fn on_request_progress(&self, progress: &ScrapeProgress) {
        self.bar.set_length(progress.total_tiles as u64);
        self.bar.set_position(progress.tiles_total as u64);
        self.bar.set_message(level_message(progress));
    }

    fn on_request_complete(&self) {
        self.bar.finish_with_message("done");
    }

    fn on_request_canceled(&self) {
        self.bar.abandon_with_message("canceled");
    }

    fn on_request_error(&self, detail: &str, _fatal: bool) {
        self.bar.abandon_with_message(format!("failed: {}", detail));
    }
}
