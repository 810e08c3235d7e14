use std::fmt;

use serde::{Deserialize, Serialize};

/// One latency statistic, either a number of milliseconds or the explicit sentinel.
///
/// Serializes as a number or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum StatValue {
    Value(f64),
    #[default]
    Unavailable,
}

impl StatValue {
    /// Marker printed in place of a statistic that could not be derived.
    pub const SENTINEL: &'static str = "N/A";

    /// Build a value from a raw artifact field.
    ///
    /// Only a JSON number yields [`StatValue::Value`], rounded to two decimals. Values too large
    /// to scale for rounding are kept as they are.
    pub fn from_json(raw: Option<&serde_json::Value>) -> Self {
        match raw.and_then(serde_json::Value::as_f64) {
            Some(value) if value.is_finite() => Self::Value(round_to_cents(value)),
            _ => Self::Unavailable,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(*value),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

fn round_to_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

impl From<Option<f64>> for StatValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unavailable, Self::Value)
    }
}

impl From<StatValue> for Option<f64> {
    fn from(value: StatValue) -> Self {
        value.as_f64()
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value:.2}"),
            Self::Unavailable => f.write_str(Self::SENTINEL),
        }
    }
}

/// The five statistics reported per category and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    Min,
    Median,
    Average,
    P95,
    Max,
}

impl StatField {
    /// All fields, in table column order.
    pub const ALL: [StatField; 5] = [
        StatField::Min,
        StatField::Median,
        StatField::Average,
        StatField::P95,
        StatField::Max,
    ];

    /// Key of the field inside the probe's `values` bundle.
    pub fn key(self) -> &'static str {
        match self {
            StatField::Min => "min",
            StatField::Median => "med",
            StatField::Average => "avg",
            StatField::P95 => "p(95)",
            StatField::Max => "max",
        }
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Latency statistics of one category at one level, in milliseconds.
///
/// Each field is derived independently, so a summary may be partially available.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatSummary {
    pub min: StatValue,
    pub median: StatValue,
    pub average: StatValue,
    pub p95: StatValue,
    pub max: StatValue,
}

impl StatSummary {
    /// A summary with every field set to the sentinel.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn get(&self, field: StatField) -> StatValue {
        match field {
            StatField::Min => self.min,
            StatField::Median => self.median,
            StatField::Average => self.average,
            StatField::P95 => self.p95,
            StatField::Max => self.max,
        }
    }

    pub fn set(&mut self, field: StatField, value: StatValue) {
        let slot = match field {
            StatField::Min => &mut self.min,
            StatField::Median => &mut self.median,
            StatField::Average => &mut self.average,
            StatField::P95 => &mut self.p95,
            StatField::Max => &mut self.max,
        };
        *slot = value;
    }

    /// True when no field carries a number.
    pub fn is_unavailable(&self) -> bool {
        StatField::ALL
            .iter()
            .all(|field| !self.get(*field).is_available())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_round_numeric_value_to_two_decimals() {
        let value = StatValue::from_json(Some(&json!(12.3456)));
        assert_eq!(value, StatValue::Value(12.35));
        assert_eq!(value.to_string(), "12.35");

        let value = StatValue::from_json(Some(&json!(7)));
        assert_eq!(value.to_string(), "7.00");
    }

    #[test]
    fn test_should_use_sentinel_for_missing_or_non_numeric_value() {
        assert_eq!(StatValue::from_json(None), StatValue::Unavailable);
        assert_eq!(
            StatValue::from_json(Some(&json!("12.5"))),
            StatValue::Unavailable
        );
        assert_eq!(StatValue::from_json(Some(&json!(null))), StatValue::Unavailable);
        assert_eq!(StatValue::from_json(Some(&json!([1.0]))), StatValue::Unavailable);
        assert_eq!(StatValue::Unavailable.to_string(), "N/A");
    }

    #[test]
    fn test_should_keep_huge_value_finite() {
        let value = StatValue::from_json(Some(&json!(1e307)));
        assert_eq!(value, StatValue::Value(1e307));
        assert!(value.as_f64().unwrap().is_finite());
        assert_ne!(value.to_string(), StatValue::SENTINEL);
        assert_eq!(serde_json::to_value(value).unwrap(), json!(1e307));

        let value = StatValue::from_json(Some(&json!(-1e307)));
        assert_eq!(value, StatValue::Value(-1e307));
    }

    #[test]
    fn test_should_keep_zero_distinct_from_sentinel() {
        let zero = StatValue::from_json(Some(&json!(0)));
        assert_eq!(zero, StatValue::Value(0.0));
        assert!(zero.is_available());
        assert_ne!(zero.to_string(), StatValue::SENTINEL);
    }

    #[test]
    fn test_should_serialize_sentinel_as_null() {
        let summary = StatSummary {
            min: StatValue::Value(1.5),
            ..StatSummary::unavailable()
        };
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(
            value,
            json!({"min": 1.5, "median": null, "average": null, "p95": null, "max": null})
        );
        let back: StatSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_should_get_and_set_fields() {
        let mut summary = StatSummary::unavailable();
        assert!(summary.is_unavailable());
        summary.set(StatField::P95, StatValue::Value(9.0));
        assert_eq!(summary.get(StatField::P95), StatValue::Value(9.0));
        assert_eq!(summary.p95, StatValue::Value(9.0));
        assert!(!summary.is_unavailable());
    }

    #[test]
    fn test_should_map_fields_to_probe_keys() {
        let keys = StatField::ALL.map(StatField::key);
        assert_eq!(keys, ["min", "med", "avg", "p(95)", "max"]);
    }
}
