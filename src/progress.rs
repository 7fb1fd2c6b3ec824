//! Progress reporting for the catalog walk.
//!
//! Interactive runs get an indicatif bar; `--log-only` runs get a periodic
//! `[catalog] n/total` log line instead, which reads better when tailed.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

/// Songs between progress lines in log-only mode
const LOG_INTERVAL: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Bar,
    LogLines,
    /// Nothing at all (tests, embedding)
    Hidden,
}

/// Counts catalog entries as they are resolved.
pub struct CatalogProgress {
    mode: ProgressMode,
    bar: Option<ProgressBar>,
    total: u64,
    done: u64,
}

impl CatalogProgress {
    pub fn new(total: u64, mode: ProgressMode) -> Self {
        let bar = (mode == ProgressMode::Bar).then(|| {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                    .unwrap()
                    .progress_chars("=> "),
            );
            pb.set_message("Fetching songs");
            pb
        });
        Self {
            mode,
            bar,
            total,
            done: 0,
        }
    }

    pub fn song_added(&mut self) {
        self.done += 1;
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        if self.mode == ProgressMode::LogLines && is_log_point(self.done, self.total) {
            let pct = 100.0 * self.done as f64 / self.total as f64;
            info!("[catalog] {}/{} songs ({:.1}%)", self.done, self.total, pct);
        }
    }

    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_with_message(format!("Fetched {} songs", self.done));
        }
    }
}

fn is_log_point(done: u64, total: u64) -> bool {
    total > 0 && (done % LOG_INTERVAL == 0 || done == total)
}

/// Elapsed time for the run summary: "850ms", "4.2s", "2m 05s".
pub fn format_elapsed(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else if millis < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
