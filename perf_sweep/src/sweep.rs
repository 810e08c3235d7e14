use std::collections::BTreeMap;
use std::path::PathBuf;

use itertools::Itertools;
use perf_sweep_summary_model::{
    ArtifactError, Category, ConcurrencyLevel, MetricsArtifact, StatSummary,
};

use crate::config::SweepConfig;
use crate::probe::Probe;
use crate::progress::SweepProgress;

/// Why a concurrency level was left out of the report.
#[derive(Debug, thiserror::Error)]
pub enum LevelFailure {
    #[error("probe execution failed at {level} VUs: {reason}")]
    ProbeExecutionFailed {
        level: ConcurrencyLevel,
        reason: String,
    },
    #[error("probe finished at {level} VUs but artifact {} is missing", path.display())]
    ArtifactMissing {
        level: ConcurrencyLevel,
        path: PathBuf,
    },
    #[error("artifact {} for {level} VUs is unparseable: {source}", path.display())]
    ArtifactUnparseable {
        level: ConcurrencyLevel,
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
}

/// Per-category summaries of one successful level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSummaries {
    /// The artifact the summaries were derived from.
    pub artifact: PathBuf,
    pub summaries: BTreeMap<Category, StatSummary>,
}

impl LevelSummaries {
    /// Summary of `category`, all sentinel when nothing was recorded for it.
    pub fn summary(&self, category: &Category) -> StatSummary {
        self.summaries
            .get(category)
            .copied()
            .unwrap_or_else(StatSummary::unavailable)
    }
}

/// The result of attempting one concurrency level.
#[derive(Debug)]
pub enum RunOutcome {
    Success(LevelSummaries),
    Failure(LevelFailure),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }

    pub fn summaries(&self) -> Option<&LevelSummaries> {
        match self {
            RunOutcome::Success(summaries) => Some(summaries),
            RunOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&LevelFailure> {
        match self {
            RunOutcome::Success(_) => None,
            RunOutcome::Failure(failure) => Some(failure),
        }
    }
}

/// Outcome of every attempted level, in the order the levels were run.
#[derive(Debug, Default)]
pub struct SweepOutcomes {
    outcomes: Vec<(ConcurrencyLevel, RunOutcome)>,
}

impl SweepOutcomes {
    pub fn iter(&self) -> impl Iterator<Item = (ConcurrencyLevel, &RunOutcome)> {
        self.outcomes.iter().map(|(level, outcome)| (*level, outcome))
    }

    pub fn get(&self, level: ConcurrencyLevel) -> Option<&RunOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| *candidate == level)
            .map(|(_, outcome)| outcome)
    }

    /// Successful levels with their summaries, in run order.
    pub fn successes(&self) -> impl Iterator<Item = (ConcurrencyLevel, &LevelSummaries)> {
        self.iter()
            .filter_map(|(level, outcome)| outcome.summaries().map(|s| (level, s)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (ConcurrencyLevel, &LevelFailure)> {
        self.iter()
            .filter_map(|(level, outcome)| outcome.failure().map(|f| (level, f)))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn push(&mut self, level: ConcurrencyLevel, outcome: RunOutcome) {
        self.outcomes.push((level, outcome));
    }
}

impl FromIterator<(ConcurrencyLevel, RunOutcome)> for SweepOutcomes {
    fn from_iter<T: IntoIterator<Item = (ConcurrencyLevel, RunOutcome)>>(iter: T) -> Self {
        Self {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Runs the probe once per configured level, one level at a time.
///
/// Levels never overlap: each probe run has to finish before the next one starts, otherwise
/// the runs would contend for the target service and skew each other's latencies. A failed
/// level is recorded and the sweep moves on.
pub struct SweepDriver<'a, P> {
    config: &'a SweepConfig,
    probe: P,
    progress: SweepProgress,
}

impl<'a, P> SweepDriver<'a, P>
where
    P: Probe,
{
    pub fn new(config: &'a SweepConfig, probe: P) -> Self {
        Self {
            config,
            probe,
            progress: SweepProgress::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: SweepProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run every configured level and collect one outcome per level.
    pub fn run(mut self) -> SweepOutcomes {
        let config = self.config;
        let levels = &config.levels;
        info!(
            "Starting sweep over {} levels: {}",
            levels.len(),
            levels.iter().join(", ")
        );

        let mut outcomes = SweepOutcomes::default();
        for &level in levels {
            info!("Running probe with VUs={level}");
            self.progress.level_started(level);

            let outcome = match self.run_level(level) {
                Ok(summaries) => {
                    info!("Completed VUs={level}");
                    RunOutcome::Success(summaries)
                }
                Err(failure) => {
                    warn!("Excluding VUs={level} from the report: {failure}");
                    RunOutcome::Failure(failure)
                }
            };
            outcomes.push(level, outcome);
            self.progress.level_finished();
        }
        self.progress.finish();

        info!(
            "Sweep finished: {} of {} levels succeeded",
            outcomes.successes().count(),
            outcomes.len()
        );
        outcomes
    }

    fn run_level(&mut self, level: ConcurrencyLevel) -> Result<LevelSummaries, LevelFailure> {
        let probe = &mut self.probe;
        self.progress.suspend(|| probe.run(level))?;

        let path = self.probe.artifact_path(level);
        if !path.exists() {
            return Err(LevelFailure::ArtifactMissing { level, path });
        }
        debug!("Reading artifact {}", path.display());

        let artifact =
            MetricsArtifact::from_file(&path).map_err(|source| LevelFailure::ArtifactUnparseable {
                level,
                path: path.clone(),
                source,
            })?;
        for category in &self.config.categories {
            if !artifact.contains(category) {
                debug!("Artifact for VUs={level} has no entry for '{category}'");
            }
        }

        Ok(LevelSummaries {
            summaries: artifact.summarize(&self.config.categories),
            artifact: path,
        })
    }
}
