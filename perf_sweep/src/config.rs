use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use itertools::Itertools;
use perf_sweep_summary_model::{Category, ConcurrencyLevel};
use serde::{Deserialize, Serialize};
use sha3::Digest;

/// Concurrency levels swept when none are configured.
pub const DEFAULT_LEVELS: [u32; 9] = [1, 2, 8, 16, 32, 64, 128, 256, 512];

/// Trend metrics recorded by the default probe script, one per request category.
pub const DEFAULT_CATEGORIES: [&str; 4] = [
    "simple_success_times",
    "simple_fail_times",
    "kv_success_times",
    "kv_fail_country_times",
];

const DEFAULT_DURATION_SECS: u64 = 60;
const DEFAULT_SCRIPT: &str = "load_test.js";
const DEFAULT_TOKEN: &str = "SINGULAR_TOKEN_VALUE";
const DEFAULT_SIMPLE_URL: &str = "http://localhost:3000/validate/simple";
const DEFAULT_KV_URL: &str = "http://localhost:3000/validate";
const DEFAULT_REPORT_PATH: &str = "load_test_report.html";
const MIN_CHART_SIDE: u32 = 100;

/// Everything a sweep and its report need, built once and passed by reference.
///
/// Deserializes from TOML where every key is optional.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Concurrency levels, strictly ascending.
    pub levels: Vec<ConcurrencyLevel>,
    /// Duration of each probe run, in seconds.
    pub duration_secs: u64,
    /// Categories to report, in report order.
    pub categories: Vec<Category>,
    /// Token the probe presents to the validation service.
    pub token: String,
    /// Target of the simple validation requests.
    pub simple_url: String,
    /// Target of the key-value validation requests.
    pub kv_url: String,
    /// Script handed to the probe.
    pub script: PathBuf,
    /// Directory the probe writes its artifacts to.
    pub artifact_dir: PathBuf,
    /// Where the report is written.
    pub report_path: PathBuf,
    pub chart: ChartOptions,
}

/// Size of the rendered charts, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 500,
            height: 300,
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS
                .into_iter()
                .filter_map(ConcurrencyLevel::new)
                .collect(),
            duration_secs: DEFAULT_DURATION_SECS,
            categories: DEFAULT_CATEGORIES.into_iter().map(Category::from).collect(),
            token: DEFAULT_TOKEN.to_string(),
            simple_url: DEFAULT_SIMPLE_URL.to_string(),
            kv_url: DEFAULT_KV_URL.to_string(),
            script: PathBuf::from(DEFAULT_SCRIPT),
            artifact_dir: PathBuf::from("."),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            chart: ChartOptions::default(),
        }
    }
}

impl fmt::Debug for SweepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SweepConfig")
            .field("levels", &self.levels)
            .field("duration_secs", &self.duration_secs)
            .field("categories", &self.categories)
            .field("token", &"<redacted>")
            .field("simple_url", &self.simple_url)
            .field("kv_url", &self.kv_url)
            .field("script", &self.script)
            .field("artifact_dir", &self.artifact_dir)
            .field("report_path", &self.report_path)
            .field("chart", &self.chart)
            .finish()
    }
}

impl SweepConfig {
    /// Load a configuration from a TOML file, keeping defaults for missing keys.
    pub fn from_toml_file<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Builds a [`SweepConfig`] with the specified concurrency levels.
    pub fn levels(mut self, levels: Vec<ConcurrencyLevel>) -> Self {
        self.levels = levels;
        self
    }

    /// Builds a [`SweepConfig`] with the specified categories.
    pub fn categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Builds a [`SweepConfig`] with the specified run duration, in seconds.
    pub fn duration_secs(mut self, duration_secs: u64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    /// Builds a [`SweepConfig`] with the specified token.
    pub fn token(mut self, token: String) -> Self {
        self.token = token;
        self
    }

    /// Builds a [`SweepConfig`] with the specified simple validation URL.
    pub fn simple_url(mut self, url: String) -> Self {
        self.simple_url = url;
        self
    }

    /// Builds a [`SweepConfig`] with the specified key-value validation URL.
    pub fn kv_url(mut self, url: String) -> Self {
        self.kv_url = url;
        self
    }

    /// Builds a [`SweepConfig`] with the specified probe script.
    pub fn script(mut self, script: PathBuf) -> Self {
        self.script = script;
        self
    }

    /// Builds a [`SweepConfig`] with the specified artifact directory.
    pub fn artifact_dir(mut self, dir: PathBuf) -> Self {
        self.artifact_dir = dir;
        self
    }

    /// Builds a [`SweepConfig`] with the specified report path.
    pub fn report_path(mut self, path: PathBuf) -> Self {
        self.report_path = path;
        self
    }

    /// Check the configuration before anything is run.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.levels.is_empty() {
            bail!("At least one concurrency level must be configured");
        }
        if let Some((previous, next)) = self
            .levels
            .iter()
            .tuple_windows()
            .find(|(previous, next)| previous >= next)
        {
            bail!(
                "Concurrency levels must be strictly ascending, found {previous} followed by {next}"
            );
        }

        if self.categories.is_empty() {
            bail!("At least one category must be configured");
        }
        let mut seen = HashSet::with_capacity(self.categories.len());
        for category in &self.categories {
            if category.as_str().trim().is_empty() {
                bail!("Category names must not be empty");
            }
            if !seen.insert(category) {
                bail!("Duplicate category: {category}");
            }
        }

        if self.duration_secs == 0 {
            bail!("Run duration must be greater than zero");
        }

        url::Url::parse(&self.simple_url)
            .with_context(|| format!("Invalid simple URL '{}'", self.simple_url))?;
        url::Url::parse(&self.kv_url)
            .with_context(|| format!("Invalid KV URL '{}'", self.kv_url))?;

        if self.chart.width < MIN_CHART_SIDE || self.chart.height < MIN_CHART_SIDE {
            bail!(
                "Chart must be at least {MIN_CHART_SIDE}x{MIN_CHART_SIDE} pixels, got {}x{}",
                self.chart.width,
                self.chart.height
            );
        }

        Ok(())
    }

    /// Compute a fingerprint of the settings that define a sweep.
    ///
    /// Two reports with the same fingerprint measured the same levels, duration, categories,
    /// targets and script. The token is not part of it.
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        // variable-length entries are length prefixed so adjacent entries cannot run together
        fn update_str(hasher: &mut sha3::Sha3_256, value: &str) {
            Digest::update(hasher, (value.len() as u64).to_le_bytes());
            Digest::update(hasher, value.as_bytes());
        }

        let mut hasher = sha3::Sha3_256::new();

        Digest::update(&mut hasher, (self.levels.len() as u64).to_le_bytes());
        self.levels.iter().for_each(|level| {
            Digest::update(&mut hasher, level.get().to_le_bytes());
        });
        Digest::update(&mut hasher, self.duration_secs.to_le_bytes());
        Digest::update(&mut hasher, (self.categories.len() as u64).to_le_bytes());
        self.categories.iter().for_each(|category| {
            update_str(&mut hasher, category.as_str());
        });
        update_str(&mut hasher, &self.simple_url);
        update_str(&mut hasher, &self.kv_url);
        update_str(&mut hasher, &self.script.to_string_lossy());

        format!("{:x}", hasher.finalize())
    }
}
