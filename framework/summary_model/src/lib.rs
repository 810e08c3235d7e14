//! Data model shared by the concurrency sweep and its report.
//!
//! A sweep runs the load probe once per [`ConcurrencyLevel`]. Each run leaves a
//! [`MetricsArtifact`] behind, and each tracked [`Category`] of requests is reduced to a
//! [`StatSummary`] of five latency statistics. A statistic that cannot be derived is
//! [`StatValue::Unavailable`], never zero.

use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod artifact;
mod stat;

pub use artifact::{ArtifactError, MetricsArtifact};
pub use stat::{StatField, StatSummary, StatValue};

/// Number of concurrent virtual users simulated for one measurement pass.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct ConcurrencyLevel(NonZeroU32);

impl ConcurrencyLevel {
    /// Create a level, `None` for zero.
    pub fn new(vus: u32) -> Option<Self> {
        NonZeroU32::new(vus).map(Self)
    }

    /// The number of virtual users.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl From<NonZeroU32> for ConcurrencyLevel {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

/// Error returned when a [`ConcurrencyLevel`] cannot be parsed from text.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid concurrency level '{0}': expected a positive integer")]
pub struct ParseLevelError(String);

impl FromStr for ConcurrencyLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}

/// A named class of request whose latency is tracked on its own.
///
/// The name is the key the probe uses for the metric in its artifact, for example
/// `simple_success_times`.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// File name of the artifact the probe writes for `level`.
pub fn artifact_file_name(level: ConcurrencyLevel) -> String {
    format!("results_vus_{level}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_concurrency_level() {
        assert_eq!("8".parse::<ConcurrencyLevel>().unwrap().get(), 8);
        assert_eq!(" 16 ".parse::<ConcurrencyLevel>().unwrap().get(), 16);
        assert!("0".parse::<ConcurrencyLevel>().is_err());
        assert!("-1".parse::<ConcurrencyLevel>().is_err());
        assert!("many".parse::<ConcurrencyLevel>().is_err());
    }

    #[test]
    fn test_should_reject_zero_level() {
        assert!(ConcurrencyLevel::new(0).is_none());
        let level: Result<ConcurrencyLevel, _> = serde_json::from_str("0");
        assert!(level.is_err());
    }

    #[test]
    fn test_should_name_artifact_after_level() {
        let level = ConcurrencyLevel::new(32).unwrap();
        assert_eq!(artifact_file_name(level), "results_vus_32.json");
    }

    #[test]
    fn test_should_display_category_name() {
        assert_eq!(
            Category::from("kv_success_times").to_string(),
            "kv_success_times"
        );
    }
}
