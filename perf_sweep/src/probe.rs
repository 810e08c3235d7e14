mod k6;
mod recorded;

use std::path::PathBuf;

use perf_sweep_summary_model::ConcurrencyLevel;

pub use self::k6::{K6Probe, K6_PATH_ENV};
pub use self::recorded::RecordedArtifacts;
use crate::sweep::LevelFailure;

/// The load generator run once per concurrency level.
pub trait Probe {
    /// Where the artifact for `level` is expected once [`Probe::run`] returns.
    fn artifact_path(&self, level: ConcurrencyLevel) -> PathBuf;

    /// Run one measurement pass at `level`, returning only when it has finished.
    fn run(&mut self, level: ConcurrencyLevel) -> Result<(), LevelFailure>;
}

impl<P> Probe for &mut P
where
    P: Probe + ?Sized,
{
    fn artifact_path(&self, level: ConcurrencyLevel) -> PathBuf {
        (**self).artifact_path(level)
    }

    fn run(&mut self, level: ConcurrencyLevel) -> Result<(), LevelFailure> {
        (**self).run(level)
    }
}
