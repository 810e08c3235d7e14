use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::aggregator::ReportSection;
use crate::report::{CompiledReport, LevelStatus};

/// Machine readable summary of a sweep, the report without its charts.
#[derive(Debug, Serialize)]
pub struct SweepSummary<'a> {
    pub fingerprint: &'a str,
    pub generated_at: &'a str,
    pub levels: &'a [LevelStatus],
    pub sections: Vec<&'a ReportSection>,
}

impl<'a> From<&'a CompiledReport> for SweepSummary<'a> {
    fn from(report: &'a CompiledReport) -> Self {
        Self {
            fingerprint: &report.overview.fingerprint,
            generated_at: &report.overview.generated_at,
            levels: &report.overview.levels,
            sections: report.sections.iter().map(|s| &s.section).collect(),
        }
    }
}

/// Write the summary of `report` to `path` as pretty printed JSON.
///
/// Unavailable statistics are written as `null`.
pub fn write_summary_json<P>(path: P, report: &CompiledReport) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create summary file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &SweepSummary::from(report))
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush summary to {}", path.display()))?;

    info!("Wrote summary to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use perf_sweep_summary_model::{Category, ConcurrencyLevel, StatSummary, StatValue};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::aggregator::{SeriesPoint, SummaryRow};
    use crate::report::{CompiledSection, LevelState, SectionChart, SweepOverview};

    fn report() -> CompiledReport {
        let level = ConcurrencyLevel::new(16).unwrap();
        CompiledReport {
            overview: SweepOverview {
                title: "Load test report",
                generated_at: "2026-10-16T12:00:00Z".to_string(),
                fingerprint: "abc123".to_string(),
                levels: vec![LevelStatus {
                    level,
                    status: LevelState::Ok,
                    reason: None,
                }],
            },
            sections: vec![CompiledSection {
                section: ReportSection {
                    category: Category::from("kv_success_times"),
                    rows: vec![SummaryRow {
                        level,
                        summary: StatSummary {
                            p95: StatValue::Value(8.5),
                            ..StatSummary::unavailable()
                        },
                    }],
                    series: vec![SeriesPoint { level, p95: 8.5 }],
                },
                chart: SectionChart::NoData,
            }],
        }
    }

    #[test]
    fn test_should_write_summary_without_charts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");

        write_summary_json(&path, &report()).unwrap();

        let value: serde_json::Value =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "fingerprint": "abc123",
                "generated_at": "2026-10-16T12:00:00Z",
                "levels": [{"level": 16, "status": "ok"}],
                "sections": [{
                    "category": "kv_success_times",
                    "rows": [{"level": 16, "min": null, "median": null, "average": null, "p95": 8.5, "max": null}],
                    "series": [{"level": 16, "p95": 8.5}],
                }],
            })
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_should_report_error_when_buffered_output_cannot_be_flushed() {
        // writes to /dev/full fail with ENOSPC, but only once the buffer is flushed
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }

        let result = write_summary_json(full, &report());

        let error = result.unwrap_err();
        assert!(format!("{error:#}").contains("/dev/full"), "{error:#}");
    }

    #[test]
    fn test_should_fail_when_summary_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("summary.json");

        assert!(write_summary_json(&path, &report()).is_err());
        assert!(!path.exists());
    }
}
