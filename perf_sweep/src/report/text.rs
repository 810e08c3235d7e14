use std::io::{self, Write};

use super::table::render_table;
use super::{CompiledSection, Document, SectionChart, SweepOverview};

/// Plain text rendition of the report, for terminals and logs.
///
/// Charts cannot be drawn here; each section ends with a note on its chart instead.
pub struct TextDocument<W> {
    writer: W,
}

impl<W> TextDocument<W>
where
    W: Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W> Document for TextDocument<W>
where
    W: Write,
{
    type Error = io::Error;

    fn write_overview(&mut self, overview: &SweepOverview) -> Result<(), Self::Error> {
        writeln!(self.writer, "{}", overview.title)?;
        writeln!(self.writer, "Generated at: {}", overview.generated_at)?;
        writeln!(self.writer, "Configuration: {}", overview.fingerprint)?;
        for level in &overview.levels {
            match &level.reason {
                Some(reason) => {
                    writeln!(self.writer, "  {} VUs: {} ({reason})", level.level, level.status)?
                }
                None => writeln!(self.writer, "  {} VUs: {}", level.level, level.status)?,
            }
        }
        Ok(())
    }

    fn write_section(&mut self, section: &CompiledSection) -> Result<(), Self::Error> {
        writeln!(self.writer)?;
        writeln!(self.writer, "Task: {}", section.section.category)?;
        writeln!(self.writer, "{}", render_table(&section.section.rows))?;
        match &section.chart {
            SectionChart::Rendered(_) => writeln!(
                self.writer,
                "Chart: {} points",
                section.section.series.len()
            ),
            SectionChart::NoData => writeln!(self.writer, "Chart: omitted, no p95 data"),
            SectionChart::Failed { reason } => {
                writeln!(self.writer, "Chart: failed to render: {reason}")
            }
        }
    }

    fn finish(mut self) -> Result<(), Self::Error> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use perf_sweep_summary_model::{Category, ConcurrencyLevel, StatSummary};

    use super::*;
    use crate::aggregator::{ReportSection, SummaryRow};
    use crate::report::{CompiledReport, LevelState, LevelStatus};

    #[test]
    fn test_should_write_sections_after_overview() {
        let level = ConcurrencyLevel::new(32).unwrap();
        let report = CompiledReport {
            overview: SweepOverview {
                title: "Load test report",
                generated_at: "2026-10-16T12:00:00Z".to_string(),
                fingerprint: "abc123".to_string(),
                levels: vec![LevelStatus {
                    level,
                    status: LevelState::Failed,
                    reason: Some("no artifact".to_string()),
                }],
            },
            sections: vec![
                CompiledSection {
                    section: ReportSection {
                        category: Category::from("simple_fail_times"),
                        rows: vec![SummaryRow {
                            level,
                            summary: StatSummary::unavailable(),
                        }],
                        series: vec![],
                    },
                    chart: SectionChart::NoData,
                },
                CompiledSection {
                    section: ReportSection {
                        category: Category::from("kv_success_times"),
                        rows: vec![],
                        series: vec![],
                    },
                    chart: SectionChart::Failed {
                        reason: "template".to_string(),
                    },
                },
            ],
        };

        let mut out = Vec::new();
        report.write_to(TextDocument::new(&mut out)).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Load test report\n"));
        assert!(text.contains("  32 VUs: failed (no artifact)\n"));
        let first = text.find("Task: simple_fail_times").unwrap();
        let second = text.find("Task: kv_success_times").unwrap();
        assert!(first < second);
        assert!(text.contains("N/A"));
        assert!(text.contains("Chart: omitted, no p95 data"));
        assert!(text.contains("Chart: failed to render: template"));
    }
}
