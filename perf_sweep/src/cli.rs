use std::path::PathBuf;

use clap::Parser;
use perf_sweep_summary_model::{Category, ConcurrencyLevel};

use crate::config::SweepConfig;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Path to a TOML configuration file.
    ///
    /// Every key is optional, flags given on the command line take precedence over the file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Concurrency levels to sweep, strictly ascending. For example `--levels 1,2,8`.
    #[arg(long, value_delimiter = ',')]
    pub levels: Option<Vec<ConcurrencyLevel>>,

    /// A category to report, in report order. Use the flag multiple times for more categories.
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// The number of seconds each level runs for.
    #[arg(long)]
    pub duration: Option<u64>,

    /// The script handed to the probe.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Directory the probe writes its artifacts to, and the report reads them from.
    #[arg(long)]
    pub artifact_dir: Option<PathBuf>,

    /// Where to write the report.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Also write a JSON summary of the sweep to this path.
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Token the probe presents to the service under test.
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// URL of the simple validation endpoint.
    #[arg(long, env = "SIMPLE_URL")]
    pub simple_url: Option<String>,

    /// URL of the key-value validation endpoint.
    #[arg(long, env = "KV_URL")]
    pub kv_url: Option<String>,

    /// Do not run the probe, build the report from artifacts already in the artifact directory.
    #[arg(long, default_value = "false")]
    pub skip_probe: bool,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at
    /// by anyone and is just adding noise to the logs.
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// Do not print the text report to stdout.
    #[arg(long, short, default_value = "false")]
    pub quiet: bool,
}

impl CliArgs {
    /// Resolve the configuration: defaults, then the config file, then flags and environment.
    pub fn sweep_config(&self) -> anyhow::Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::from_toml_file(path)?,
            None => SweepConfig::default(),
        };

        if let Some(levels) = &self.levels {
            config = config.levels(levels.clone());
        }
        if !self.categories.is_empty() {
            config = config.categories(
                self.categories
                    .iter()
                    .map(|c| Category::from(c.as_str()))
                    .collect(),
            );
        }
        if let Some(duration) = self.duration {
            config = config.duration_secs(duration);
        }
        if let Some(script) = &self.script {
            config = config.script(script.clone());
        }
        if let Some(dir) = &self.artifact_dir {
            config = config.artifact_dir(dir.clone());
        }
        if let Some(report) = &self.report {
            config = config.report_path(report.clone());
        }
        if let Some(token) = &self.token {
            config = config.token(token.clone());
        }
        if let Some(url) = &self.simple_url {
            config = config.simple_url(url.clone());
        }
        if let Some(url) = &self.kv_url {
            config = config.kv_url(url.clone());
        }

        Ok(config)
    }
}
