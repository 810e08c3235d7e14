use indicatif::{ProgressBar, ProgressStyle};
use perf_sweep_summary_model::ConcurrencyLevel;

/// Displays a progress bar counting the concurrency levels completed so far.
///
/// The probe writes to the same terminal, so the bar is hidden while a level runs.
pub struct SweepProgress {
    bar: ProgressBar,
}

impl SweepProgress {
    pub fn new(levels: usize) -> Self {
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len} levels {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        let bar = ProgressBar::new(levels as u64);
        bar.set_style(style);
        Self { bar }
    }

    /// A progress bar that draws nothing, for CI logs and tests.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub(crate) fn level_started(&self, level: ConcurrencyLevel) {
        self.bar.set_message(format!("(running {level} VUs)"));
    }

    pub(crate) fn level_finished(&self) {
        self.bar.inc(1);
    }

    /// Hide the bar while `f` runs.
    pub(crate) fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.bar.suspend(f)
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
