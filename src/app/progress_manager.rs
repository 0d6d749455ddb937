//! Progress bar for download runs.

use std::time::Duration;

use imgdl_core::{DownloadError, DownloadObserver, DownloadResult, TracingObserver};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Observer that drives a progress bar and still logs every event.
///
/// Log lines are written with the bar suspended so they do not tear it.
pub(crate) struct ProgressObserver {
    bar: ProgressBar,
    log: TracingObserver,
}

impl ProgressObserver {
    /// Progress bar on stderr for `total` URLs.
    pub(crate) fn new(total: usize) -> Self {
        Self::with_draw_target(total, ProgressDrawTarget::stderr())
    }

    pub(crate) fn with_draw_target(total: usize, target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(total as u64), target);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            log: TracingObserver,
        }
    }

    /// Removes the bar from the terminal.
    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl DownloadObserver for ProgressObserver {
    fn on_start(&self, url: &str, index: usize, total: usize) {
        self.bar.suspend(|| self.log.on_start(url, index, total));
        self.bar.set_message(url.to_string());
    }

    fn on_retry(&self, url: &str, attempt: u32, delay: Duration, error: &DownloadError) {
        self.bar
            .suspend(|| self.log.on_retry(url, attempt, delay, error));
    }

    fn on_finish(&self, result: &DownloadResult) {
        self.bar.suspend(|| self.log.on_finish(result));
        self.bar.inc(1);
    }
}
