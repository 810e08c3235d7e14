use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context};
use perf_sweep_summary_model::{artifact_file_name, ConcurrencyLevel};

use super::Probe;
use crate::config::SweepConfig;
use crate::sweep::LevelFailure;

/// Environment variable naming the k6 binary, either a path or a program to look up in `PATH`.
pub const K6_PATH_ENV: &str = "K6_PATH";

const DEFAULT_BINARY: &str = "k6";

/// Runs the k6 load generator, one `k6 run <script>` per concurrency level.
///
/// k6 writes `results_vus_<level>.json` into its working directory, which is the artifact
/// directory.
pub struct K6Probe {
    binary: PathBuf,
    script: PathBuf,
    artifact_dir: PathBuf,
    env: Vec<(&'static str, String)>,
}

impl K6Probe {
    /// Creates a new [`K6Probe`] running `binary` with the settings of `config`.
    pub fn new(binary: PathBuf, config: &SweepConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.artifact_dir).with_context(|| {
            format!(
                "Failed to create artifact directory {}",
                config.artifact_dir.display()
            )
        })?;
        let script = std::path::absolute(&config.script).with_context(|| {
            format!("Failed to resolve probe script {}", config.script.display())
        })?;
        if !script.exists() {
            log::warn!("Probe script {} does not exist", script.display());
        }

        Ok(Self {
            binary: std::path::absolute(binary)?,
            script,
            artifact_dir: config.artifact_dir.clone(),
            env: vec![
                ("TOKEN", config.token.clone()),
                ("SIMPLE_URL", config.simple_url.clone()),
                ("KV_URL", config.kv_url.clone()),
                ("DURATION", format!("{}s", config.duration_secs)),
            ],
        })
    }

    /// Creates a new [`K6Probe`] running the binary named by [`K6_PATH_ENV`], or `k6` from
    /// `PATH` when it is unset.
    pub fn from_config(config: &SweepConfig) -> anyhow::Result<Self> {
        let binary = locate_binary(env::var_os(K6_PATH_ENV))?;
        log::debug!("Using k6 binary {}", binary.display());
        Self::new(binary, config)
    }

    fn remove_stale_artifact(path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                log::debug!("Removed stale artifact {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn locate_binary(requested: Option<OsString>) -> anyhow::Result<PathBuf> {
    let requested = match requested {
        Some(value) if value.is_empty() => bail!("{K6_PATH_ENV} is set but empty"),
        Some(value) => PathBuf::from(value),
        None => PathBuf::from(DEFAULT_BINARY),
    };

    let mut components = requested.components();
    let bare_name = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if bare_name {
        return which::which(&requested).with_context(|| {
            format!(
                "'{}' is not on PATH, install k6 or point {K6_PATH_ENV} at the binary",
                requested.display()
            )
        });
    }

    if !requested.is_file() {
        bail!(
            "{K6_PATH_ENV} points at {}, which is not a file",
            requested.display()
        );
    }
    Ok(std::path::absolute(requested)?)
}

impl Probe for K6Probe {
    fn artifact_path(&self, level: ConcurrencyLevel) -> PathBuf {
        self.artifact_dir.join(artifact_file_name(level))
    }

    fn run(&mut self, level: ConcurrencyLevel) -> Result<(), LevelFailure> {
        let failed = |reason: String| LevelFailure::ProbeExecutionFailed { level, reason };

        // an artifact left by an earlier sweep must not pass for this run's output
        Self::remove_stale_artifact(&self.artifact_path(level))
            .map_err(|e| failed(format!("could not remove stale artifact: {e}")))?;

        log::debug!(
            "Running {} run {} with VUS={level}",
            self.binary.display(),
            self.script.display()
        );
        let mut process = Command::new(&self.binary)
            .arg("run")
            .arg(&self.script)
            .current_dir(&self.artifact_dir)
            .envs(self.env.iter().map(|(key, value)| (*key, value.as_str())))
            .env("VUS", level.to_string())
            .spawn()
            .map_err(|e| failed(format!("could not start k6: {e}")))?;

        log::debug!("Running k6 with PID: {pid}", pid = process.id());
        let status = process
            .wait()
            .map_err(|e| failed(format!("could not wait for k6: {e}")))?;
        log::debug!("k6 process finished with status: {status}");

        if status.success() {
            Ok(())
        } else {
            Err(failed(format!("k6 process failed with status: {status}")))
        }
    }
}
