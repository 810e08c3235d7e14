mod chart;
mod html;
mod table;
mod text;

use chrono::{DateTime, SecondsFormat, Utc};
use perf_sweep_summary_model::ConcurrencyLevel;
use serde::Serialize;

pub use self::chart::{ChartError, SvgLineChart};
pub use self::html::{DocumentError, HtmlDocument};
pub use self::text::TextDocument;
use crate::aggregator::ReportSection;
use crate::config::SweepConfig;
use crate::sweep::SweepOutcomes;

const REPORT_TITLE: &str = "Load test report";
const X_AXIS_LABEL: &str = "Concurrency (VUs)";
const Y_AXIS_LABEL: &str = "ms (p95 latency)";

/// Data of a line chart, p95 latency against concurrency level.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart<'a> {
    pub title: String,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub section: &'a ReportSection,
}

/// A rendered chart, ready to embed in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub media_type: &'static str,
    pub data: String,
}

/// Turns a chart series into an image.
pub trait ChartRenderer {
    type Error: std::fmt::Display;

    fn render(&self, chart: &LineChart<'_>) -> Result<ChartImage, Self::Error>;
}

/// Receives the compiled report, one part at a time, and writes it out.
pub trait Document {
    type Error;

    fn write_overview(&mut self, overview: &SweepOverview) -> Result<(), Self::Error>;

    fn write_section(&mut self, section: &CompiledSection) -> Result<(), Self::Error>;

    /// Complete the document. Nothing is usable until this returns `Ok`.
    fn finish(self) -> Result<(), Self::Error>;
}

/// Whether an attempted level made it into the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum LevelState {
    #[display("ok")]
    Ok,
    #[display("failed")]
    Failed,
}

/// How one attempted level ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelStatus {
    pub level: ConcurrencyLevel,
    pub status: LevelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Header of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepOverview {
    pub title: &'static str,
    pub generated_at: String,
    pub fingerprint: String,
    pub levels: Vec<LevelStatus>,
}

impl SweepOverview {
    fn new(config: &SweepConfig, outcomes: &SweepOutcomes, generated_at: DateTime<Utc>) -> Self {
        Self {
            title: REPORT_TITLE,
            generated_at: generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            fingerprint: config.fingerprint(),
            levels: outcomes
                .iter()
                .map(|(level, outcome)| LevelStatus {
                    level,
                    status: if outcome.is_success() {
                        LevelState::Ok
                    } else {
                        LevelState::Failed
                    },
                    reason: outcome.failure().map(ToString::to_string),
                })
                .collect(),
        }
    }
}

/// The chart slot of a section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionChart {
    /// No level produced a numeric p95.
    NoData,
    Rendered(ChartImage),
    /// Rendering failed; the table is still reported.
    Failed { reason: String },
}

/// A category's table data together with its chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSection {
    pub section: ReportSection,
    pub chart: SectionChart,
}

/// The whole report, ready to be written to any number of [`Document`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledReport {
    pub overview: SweepOverview,
    pub sections: Vec<CompiledSection>,
}

impl CompiledReport {
    /// Write the overview and then every section, in category order.
    pub fn write_to<D>(&self, mut document: D) -> Result<(), D::Error>
    where
        D: Document,
    {
        document.write_overview(&self.overview)?;
        for section in &self.sections {
            document.write_section(section)?;
        }
        document.finish()
    }
}

/// Combines the aggregated sections with their charts.
///
/// Rendering is left to the [`ChartRenderer`]; the tables are laid out by the [`Document`].
pub struct ReportCompiler<'a, C> {
    config: &'a SweepConfig,
    charts: C,
    generated_at: DateTime<Utc>,
}

impl<'a, C> ReportCompiler<'a, C>
where
    C: ChartRenderer,
{
    pub fn new(config: &'a SweepConfig, charts: C) -> Self {
        Self {
            config,
            charts,
            generated_at: Utc::now(),
        }
    }

    /// Builds a [`ReportCompiler`] stamping reports with `generated_at`.
    pub fn generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    pub fn compile(&self, outcomes: &SweepOutcomes, sections: Vec<ReportSection>) -> CompiledReport {
        let sections = sections
            .into_iter()
            .map(|section| {
                let chart = self.chart_for(&section);
                CompiledSection { section, chart }
            })
            .collect();

        CompiledReport {
            overview: SweepOverview::new(self.config, outcomes, self.generated_at),
            sections,
        }
    }

    fn chart_for(&self, section: &ReportSection) -> SectionChart {
        if !section.has_chart() {
            debug!("No p95 values for '{}', omitting chart", section.category);
            return SectionChart::NoData;
        }

        let chart = LineChart {
            title: format!("{} - p95 vs Concurrency", section.category),
            x_label: X_AXIS_LABEL,
            y_label: Y_AXIS_LABEL,
            section,
        };
        match self.charts.render(&chart) {
            Ok(image) => SectionChart::Rendered(image),
            Err(e) => {
                warn!(
                    "Chart for '{}' could not be rendered, keeping its table: {e}",
                    section.category
                );
                SectionChart::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use perf_sweep_summary_model::{Category, StatSummary, StatValue};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::aggregator::SeriesAggregator;
    use crate::sweep::{LevelFailure, LevelSummaries, RunOutcome};

    struct RecordingCharts {
        fail_for: Option<&'static str>,
        titles: RefCell<Vec<String>>,
    }

    impl RecordingCharts {
        fn new(fail_for: Option<&'static str>) -> Self {
            Self {
                fail_for,
                titles: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChartRenderer for &RecordingCharts {
        type Error = String;

        fn render(&self, chart: &LineChart<'_>) -> Result<ChartImage, Self::Error> {
            self.titles.borrow_mut().push(chart.title.clone());
            if self.fail_for == Some(chart.section.category.as_str()) {
                return Err("canvas unavailable".to_string());
            }
            Ok(ChartImage {
                media_type: "image/svg+xml",
                data: format!("<svg>{}</svg>", chart.section.series.len()),
            })
        }
    }

    #[derive(Default)]
    struct RecordingDocument {
        calls: Vec<String>,
    }

    impl Document for &mut RecordingDocument {
        type Error = String;

        fn write_overview(&mut self, overview: &SweepOverview) -> Result<(), Self::Error> {
            self.calls.push(format!("overview:{}", overview.levels.len()));
            Ok(())
        }

        fn write_section(&mut self, section: &CompiledSection) -> Result<(), Self::Error> {
            self.calls.push(format!("section:{}", section.section.category));
            Ok(())
        }

        fn finish(self) -> Result<(), Self::Error> {
            self.calls.push("finish".to_string());
            Ok(())
        }
    }

    fn level(vus: u32) -> ConcurrencyLevel {
        ConcurrencyLevel::new(vus).unwrap()
    }

    fn outcomes() -> SweepOutcomes {
        let p95 = |value: f64| StatSummary {
            p95: StatValue::Value(value),
            ..StatSummary::unavailable()
        };
        let success = |vus: u32, entries: Vec<(&str, StatSummary)>| {
            (
                level(vus),
                RunOutcome::Success(LevelSummaries {
                    artifact: PathBuf::from(format!("results_vus_{vus}.json")),
                    summaries: entries
                        .into_iter()
                        .map(|(name, summary)| (Category::from(name), summary))
                        .collect::<BTreeMap<_, _>>(),
                }),
            )
        };
        SweepOutcomes::from_iter([
            success(1, vec![("a", p95(1.0)), ("b", p95(2.0))]),
            (
                level(2),
                RunOutcome::Failure(LevelFailure::ProbeExecutionFailed {
                    level: level(2),
                    reason: "exit status: 1".to_string(),
                }),
            ),
            success(8, vec![("a", p95(3.0))]),
        ])
    }

    fn categories() -> Vec<Category> {
        vec![Category::from("a"), Category::from("b"), Category::from("c")]
    }

    #[test]
    fn test_should_chart_only_sections_with_series() {
        let config = SweepConfig::default().categories(categories());
        let outcomes = outcomes();
        let charts = RecordingCharts::new(None);

        let report = ReportCompiler::new(&config, &charts).compile(
            &outcomes,
            SeriesAggregator::aggregate(&outcomes, &config.categories),
        );

        assert_eq!(
            *charts.titles.borrow(),
            vec!["a - p95 vs Concurrency", "b - p95 vs Concurrency"]
        );
        assert_eq!(
            report.sections[0].chart,
            SectionChart::Rendered(ChartImage {
                media_type: "image/svg+xml",
                data: "<svg>2</svg>".to_string(),
            })
        );
        assert_eq!(report.sections[2].chart, SectionChart::NoData);
    }

    #[test]
    fn test_should_keep_table_when_chart_fails() {
        let config = SweepConfig::default().categories(categories());
        let outcomes = outcomes();
        let charts = RecordingCharts::new(Some("a"));

        let report = ReportCompiler::new(&config, &charts).compile(
            &outcomes,
            SeriesAggregator::aggregate(&outcomes, &config.categories),
        );

        assert_eq!(
            report.sections[0].chart,
            SectionChart::Failed {
                reason: "canvas unavailable".to_string()
            }
        );
        assert_eq!(report.sections[0].section.rows.len(), 2);
        assert!(matches!(report.sections[1].chart, SectionChart::Rendered(_)));
    }

    #[test]
    fn test_should_describe_every_attempted_level() {
        let config = SweepConfig::default().categories(categories());
        let outcomes = outcomes();
        let charts = RecordingCharts::new(None);
        let generated_at = DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let report = ReportCompiler::new(&config, &charts)
            .generated_at(generated_at)
            .compile(&outcomes, vec![]);

        assert_eq!(report.overview.generated_at, "2026-10-16T12:00:00Z");
        assert_eq!(report.overview.fingerprint, config.fingerprint());
        let statuses = report
            .overview
            .levels
            .iter()
            .map(|l| (l.level.get(), l.status))
            .collect::<Vec<_>>();
        assert_eq!(
            statuses,
            vec![
                (1, LevelState::Ok),
                (2, LevelState::Failed),
                (8, LevelState::Ok)
            ]
        );
        assert!(report.overview.levels[1]
            .reason
            .as_deref()
            .unwrap()
            .contains("exit status: 1"));
    }

    #[test]
    fn test_should_write_sections_in_category_order() {
        let config = SweepConfig::default().categories(categories());
        let outcomes = outcomes();
        let charts = RecordingCharts::new(None);
        let report = ReportCompiler::new(&config, &charts).compile(
            &outcomes,
            SeriesAggregator::aggregate(&outcomes, &config.categories),
        );

        let mut document = RecordingDocument::default();
        report.write_to(&mut document).unwrap();

        assert_eq!(
            document.calls,
            vec!["overview:3", "section:a", "section:b", "section:c", "finish"]
        );
    }
}
