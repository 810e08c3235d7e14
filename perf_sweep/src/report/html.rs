use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;
use tempfile::NamedTempFile;

use super::table::render_table;
use super::{CompiledSection, Document, SectionChart, SweepOverview};

const REPORT_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{{ overview.title }}</title>
  <style>
    body { font-family: Helvetica, Arial, sans-serif; color: #222222; margin: 2em; }
    h1 { font-size: 1.6em; }
    h2 { font-size: 1.2em; margin-top: 0; }
    table.levels { border-collapse: collapse; margin-bottom: 2em; }
    table.levels td, table.levels th { border: 1px solid #cccccc; padding: 0.2em 0.6em; text-align: left; }
    td.failed { color: #b00020; }
    pre.summary { font-family: "DejaVu Sans Mono", Menlo, Consolas, monospace; font-size: 0.85em; }
    p.note { font-style: italic; color: #666666; }
    section.category { page-break-before: always; break-before: page; }
  </style>
</head>
<body>
  <header>
    <h1>{{ overview.title }}</h1>
    <p>Generated at {{ overview.generated_at }}, configuration <code>{{ overview.fingerprint }}</code></p>
    <table class="levels">
      <tr><th>VUs</th><th>Status</th><th>Reason</th></tr>
{%- for level in overview.levels %}
      <tr><td>{{ level.level }}</td><td class="{{ level.status }}">{{ level.status }}</td><td>{{ level.reason or "" }}</td></tr>
{%- endfor %}
    </table>
  </header>
{%- for section in sections %}
  <section class="category">
    <h2>Task: {{ section.category }}</h2>
    <pre class="summary">{{ section.table }}</pre>
{%- if section.chart %}
    <figure>{{ section.chart|safe }}</figure>
{%- endif %}
{%- if section.note %}
    <p class="note">{{ section.note }}</p>
{%- endif %}
  </section>
{%- endfor %}
</body>
</html>
"##;

/// An error type for [`HtmlDocument`].
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("report io error: {0}")]
    Io(#[from] io::Error),
    #[error("report template error: {0}")]
    Template(#[from] minijinja::Error),
    #[error("failed to move report into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Serialize)]
struct SectionContext {
    category: String,
    table: String,
    chart: Option<String>,
    note: Option<String>,
}

impl From<&CompiledSection> for SectionContext {
    fn from(compiled: &CompiledSection) -> Self {
        let (chart, note) = match &compiled.chart {
            SectionChart::Rendered(image) => (Some(image.data.clone()), None),
            SectionChart::NoData => (None, Some("No p95 data, chart omitted.".to_string())),
            SectionChart::Failed { reason } => {
                (None, Some(format!("Chart could not be rendered: {reason}")))
            }
        };
        Self {
            category: compiled.section.category.to_string(),
            table: render_table(&compiled.section.rows),
            chart,
            note,
        }
    }
}

/// A single HTML file holding the whole report.
///
/// Every category starts on a new page when printed. The file only appears at `path` once
/// [`Document::finish`] succeeds; an earlier report at the same path is replaced whole.
#[derive(Debug)]
pub struct HtmlDocument {
    path: PathBuf,
    overview: Option<SweepOverview>,
    sections: Vec<SectionContext>,
}

impl HtmlDocument {
    pub fn create<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            path: path.into(),
            overview: None,
            sections: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(&self) -> Result<String, DocumentError> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template("report.html", REPORT_TEMPLATE)?;
        let html = env.get_template("report.html")?.render(context! {
            overview => self.overview,
            sections => self.sections,
        })?;
        Ok(html)
    }
}

impl Document for HtmlDocument {
    type Error = DocumentError;

    fn write_overview(&mut self, overview: &SweepOverview) -> Result<(), Self::Error> {
        self.overview = Some(overview.clone());
        Ok(())
    }

    fn write_section(&mut self, section: &CompiledSection) -> Result<(), Self::Error> {
        self.sections.push(SectionContext::from(section));
        Ok(())
    }

    fn finish(self) -> Result<(), Self::Error> {
        let html = self.render()?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(html.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path)?;

        info!("Wrote report to {}", self.path.display());
        Ok(())
    }
}
