use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use log::trace;
use serde_json::{Map, Value};

use crate::stat::{StatField, StatSummary, StatValue};
use crate::Category;

/// Key of the statistics bundle inside a metric entry.
const VALUES_KEY: &str = "values";

/// An error type for reading a [`MetricsArtifact`].
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serde JSON error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("expected a JSON object keyed by metric name, found {found}")]
    NotAnObject { found: &'static str },
}

/// Metrics written by the probe for one concurrency level.
///
/// Maps metric name to a bundle whose statistics sit under `values`:
///
/// ```json
/// { "simple_success_times": { "type": "trend", "values": { "min": 1.2, "p(95)": 7.1 } } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsArtifact {
    metrics: Map<String, Value>,
}

impl MetricsArtifact {
    /// Parses an artifact from the given reader.
    pub fn from_reader<R>(reader: R) -> Result<Self, ArtifactError>
    where
        R: Read,
    {
        let value: Value = serde_json::from_reader(std::io::BufReader::new(reader))?;
        Self::from_value(value)
    }

    /// Parses the artifact at `path`.
    pub fn from_file<P>(path: P) -> Result<Self, ArtifactError>
    where
        P: AsRef<Path>,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_value(value: Value) -> Result<Self, ArtifactError> {
        match value {
            Value::Object(metrics) => Ok(Self { metrics }),
            other => Err(ArtifactError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Whether the probe recorded anything for `category`.
    pub fn contains(&self, category: &Category) -> bool {
        self.metrics.contains_key(category.as_str())
    }

    /// Derive the [`StatSummary`] of `category`.
    ///
    /// An absent category, or one without a `values` object, yields the all-sentinel summary.
    /// Otherwise every field is extracted on its own, so a malformed field never affects the
    /// others.
    pub fn summary(&self, category: &Category) -> StatSummary {
        let Some(values) = self
            .metrics
            .get(category.as_str())
            .and_then(|metric| metric.get(VALUES_KEY))
            .and_then(Value::as_object)
        else {
            trace!("No values recorded for '{category}', all fields unavailable");
            return StatSummary::unavailable();
        };

        let mut summary = StatSummary::unavailable();
        for field in StatField::ALL {
            let value = StatValue::from_json(values.get(field.key()));
            if !value.is_available() {
                trace!("Field '{field}' of '{category}' is missing or not numeric");
            }
            summary.set(field, value);
        }
        summary
    }

    /// Summaries for each of `categories`, keyed by category.
    pub fn summarize<'a, I>(&self, categories: I) -> BTreeMap<Category, StatSummary>
    where
        I: IntoIterator<Item = &'a Category>,
    {
        categories
            .into_iter()
            .map(|category| (category.clone(), self.summary(category)))
            .collect()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
