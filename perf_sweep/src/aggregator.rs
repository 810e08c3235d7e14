use perf_sweep_summary_model::{Category, ConcurrencyLevel, StatSummary};
use serde::Serialize;

use crate::sweep::SweepOutcomes;

/// One chart point: p95 latency, in milliseconds, at a concurrency level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub level: ConcurrencyLevel,
    pub p95: f64,
}

/// One table row: the statistics of a category at a level that ran.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryRow {
    pub level: ConcurrencyLevel,
    #[serde(flatten)]
    pub summary: StatSummary,
}

/// Everything reported for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub category: Category,
    /// A row per successful level, in run order. Failed levels have no row.
    pub rows: Vec<SummaryRow>,
    /// Points of the successful levels whose p95 is a number, ascending by level.
    pub series: Vec<SeriesPoint>,
}

impl ReportSection {
    /// Whether there is anything to chart.
    pub fn has_chart(&self) -> bool {
        !self.series.is_empty()
    }
}

/// Builds the per-category tables and chart series from the outcomes of a sweep.
pub struct SeriesAggregator;

impl SeriesAggregator {
    /// One [`ReportSection`] per category, in the given order.
    pub fn aggregate(outcomes: &SweepOutcomes, categories: &[Category]) -> Vec<ReportSection> {
        categories
            .iter()
            .map(|category| Self::section(outcomes, category))
            .collect()
    }

    /// Build the [`ReportSection`] of a single category.
    ///
    /// A level that ran keeps its row even when every statistic is unavailable, so "ran without
    /// samples" stays distinguishable from "did not run".
    pub fn section(outcomes: &SweepOutcomes, category: &Category) -> ReportSection {
        let rows = outcomes
            .successes()
            .map(|(level, summaries)| SummaryRow {
                level,
                summary: summaries.summary(category),
            })
            .collect::<Vec<_>>();

        let series = rows
            .iter()
            .filter_map(|row| {
                row.summary.p95.as_f64().map(|p95| SeriesPoint {
                    level: row.level,
                    p95,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            "Aggregated '{category}': {} rows, {} chart points",
            rows.len(),
            series.len()
        );

        ReportSection {
            category: category.clone(),
            rows,
            series,
        }
    }
}
