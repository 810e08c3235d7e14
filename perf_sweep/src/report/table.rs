use perf_sweep_summary_model::{ConcurrencyLevel, StatValue};
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::{Table, Tabled};

use crate::aggregator::SummaryRow;

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "VUs")]
    level: ConcurrencyLevel,
    #[tabled(rename = "Min")]
    min: StatValue,
    #[tabled(rename = "Median")]
    median: StatValue,
    #[tabled(rename = "Avg")]
    average: StatValue,
    #[tabled(rename = "P95")]
    p95: StatValue,
    #[tabled(rename = "Max")]
    max: StatValue,
}

impl From<&SummaryRow> for TableRow {
    fn from(row: &SummaryRow) -> Self {
        Self {
            level: row.level,
            min: row.summary.min,
            median: row.summary.median,
            average: row.summary.average,
            p95: row.summary.p95,
            max: row.summary.max,
        }
    }
}

/// Lay out the rows of a section as a fixed-width text table.
///
/// Unavailable statistics show as [`StatValue::SENTINEL`]. With no rows only the header is
/// printed.
pub(crate) fn render_table(rows: &[SummaryRow]) -> String {
    let mut table = Table::new(rows.iter().map(TableRow::from));
    table
        .with(Style::modern())
        .modify(Columns::new(1..), Alignment::right());
    table.to_string()
}
