use minijinja::{context, AutoEscape, Environment};
use serde::Serialize;

use super::{ChartImage, ChartRenderer, LineChart};
use crate::config::ChartOptions;

const MEDIA_TYPE: &str = "image/svg+xml";
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 52.0;
const Y_INTERVALS: u32 = 5;

const LINE_CHART_TEMPLATE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="{{ width }}" height="{{ height }}" viewBox="0 0 {{ width }} {{ height }}" role="img" aria-label="{{ title }}">
  <rect width="100%" height="100%" fill="#ffffff"/>
  <text x="{{ center_x }}" y="20" text-anchor="middle" font-size="13" font-family="Helvetica, Arial, sans-serif">{{ title }}</text>
{%- for tick in y_ticks %}
  <line x1="{{ left }}" x2="{{ right }}" y1="{{ tick.y }}" y2="{{ tick.y }}" stroke="#e0e0e0"/>
  <text x="{{ left_label }}" y="{{ tick.y }}" text-anchor="end" dominant-baseline="middle" font-size="11" font-family="Helvetica, Arial, sans-serif">{{ tick.label }}</text>
{%- endfor %}
  <line x1="{{ left }}" x2="{{ left }}" y1="{{ top }}" y2="{{ bottom }}" stroke="#666666"/>
  <line x1="{{ left }}" x2="{{ right }}" y1="{{ bottom }}" y2="{{ bottom }}" stroke="#666666"/>
{%- for point in points %}
  <text x="{{ point.x }}" y="{{ bottom_label }}" text-anchor="middle" font-size="11" font-family="Helvetica, Arial, sans-serif">{{ point.label }}</text>
{%- endfor %}
  <polyline fill="none" stroke="#0000ff" stroke-width="2" stroke-linejoin="round" points="{{ polyline }}"/>
{%- for point in points %}
  <circle cx="{{ point.x }}" cy="{{ point.y }}" r="3" fill="#0000ff"><title>{{ point.label }} VUs: {{ point.value }} ms</title></circle>
{%- endfor %}
  <text x="{{ center_x }}" y="{{ x_title_y }}" text-anchor="middle" font-size="12" font-family="Helvetica, Arial, sans-serif">{{ x_label }}</text>
  <text x="16" y="{{ center_y }}" text-anchor="middle" font-size="12" font-family="Helvetica, Arial, sans-serif" transform="rotate(-90 16 {{ center_y }})">{{ y_label }}</text>
</svg>
"##;

/// An error type for [`SvgLineChart::render`].
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("cannot chart an empty series")]
    EmptySeries,
    #[error("chart template error: {0}")]
    Template(#[from] minijinja::Error),
}

#[derive(Serialize)]
struct Tick {
    y: String,
    label: String,
}

#[derive(Serialize)]
struct Point {
    x: String,
    y: String,
    label: String,
    value: String,
}

/// Renders line charts as standalone SVG images.
///
/// Points are evenly spaced along the x axis and labelled with their level. The y axis starts
/// at zero and is split into five intervals up to a rounded maximum.
#[derive(Debug, Clone, Copy)]
pub struct SvgLineChart {
    options: ChartOptions,
}

impl SvgLineChart {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }
}

impl ChartRenderer for SvgLineChart {
    type Error = ChartError;

    fn render(&self, chart: &LineChart<'_>) -> Result<ChartImage, Self::Error> {
        let series = &chart.section.series;
        if series.is_empty() {
            return Err(ChartError::EmptySeries);
        }

        let width = f64::from(self.options.width);
        let height = f64::from(self.options.height);
        let (left, right) = (MARGIN_LEFT, width - MARGIN_RIGHT);
        let (top, bottom) = (MARGIN_TOP, height - MARGIN_BOTTOM);

        let y_max = nice_ceiling(series.iter().map(|p| p.p95).fold(0.0, f64::max));
        let y_of = |value: f64| bottom - (bottom - top) * (value / y_max);
        let x_of = |index: usize| {
            if series.len() == 1 {
                (left + right) / 2.0
            } else {
                left + (right - left) * index as f64 / (series.len() - 1) as f64
            }
        };

        let y_ticks = (0..=Y_INTERVALS)
            .map(|i| {
                let value = y_max * f64::from(i) / f64::from(Y_INTERVALS);
                Tick {
                    y: coordinate(y_of(value)),
                    label: tick_label(value),
                }
            })
            .collect::<Vec<_>>();
        let points = series
            .iter()
            .enumerate()
            .map(|(index, point)| Point {
                x: coordinate(x_of(index)),
                y: coordinate(y_of(point.p95)),
                label: point.level.to_string(),
                value: format!("{:.2}", point.p95),
            })
            .collect::<Vec<_>>();
        let polyline = points
            .iter()
            .map(|p| format!("{},{}", p.x, p.y))
            .collect::<Vec<_>>()
            .join(" ");

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template("line_chart.svg", LINE_CHART_TEMPLATE)?;
        let svg = env.get_template("line_chart.svg")?.render(context! {
            width => self.options.width,
            height => self.options.height,
            title => chart.title,
            x_label => chart.x_label,
            y_label => chart.y_label,
            left => coordinate(left),
            right => coordinate(right),
            top => coordinate(top),
            bottom => coordinate(bottom),
            left_label => coordinate(left - 6.0),
            bottom_label => coordinate(bottom + 16.0),
            x_title_y => coordinate(height - 12.0),
            center_x => coordinate((left + right) / 2.0),
            center_y => coordinate((top + bottom) / 2.0),
            y_ticks => y_ticks,
            points => points,
            polyline => polyline,
        })?;

        Ok(ChartImage {
            media_type: MEDIA_TYPE,
            data: svg,
        })
    }
}

/// Smallest of 1, 2, 2.5, 5 or 10 times a power of ten that is at least `value`.
fn nice_ceiling(value: f64) -> f64 {
    if !(value.is_finite() && value > 0.0) {
        return 1.0;
    }
    let magnitude = 10f64.powf(value.log10().floor());
    let fraction = value / magnitude;
    let nice = [1.0, 2.0, 2.5, 5.0, 10.0]
        .into_iter()
        .find(|candidate| fraction <= *candidate)
        .unwrap_or(10.0);
    let ceiling = nice * magnitude;
    if ceiling.is_finite() {
        ceiling
    } else {
        value
    }
}

fn coordinate(value: f64) -> String {
    format!("{value:.1}")
}

fn tick_label(value: f64) -> String {
    let label = format!("{value:.2}");
    label
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
