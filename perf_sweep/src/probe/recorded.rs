use std::path::PathBuf;

use perf_sweep_summary_model::{artifact_file_name, ConcurrencyLevel};

use super::Probe;
use crate::sweep::LevelFailure;

/// A [`Probe`] that runs nothing and hands back the artifacts of an earlier sweep.
///
/// Recompiling a report from unchanged artifacts gives the same tables and series.
pub struct RecordedArtifacts {
    artifact_dir: PathBuf,
}

impl RecordedArtifacts {
    pub fn new<P>(artifact_dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }
}

impl Probe for RecordedArtifacts {
    fn artifact_path(&self, level: ConcurrencyLevel) -> PathBuf {
        self.artifact_dir.join(artifact_file_name(level))
    }

    fn run(&mut self, level: ConcurrencyLevel) -> Result<(), LevelFailure> {
        log::debug!("Reusing recorded artifact for {level} VUs");
        Ok(())
    }
}
