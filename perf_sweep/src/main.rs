#[macro_use]
extern crate log;

use std::io;

use anyhow::Context;
use clap::Parser as _;
use perf_sweep::aggregator::SeriesAggregator;
use perf_sweep::cli::CliArgs;
use perf_sweep::config::SweepConfig;
use perf_sweep::probe::{K6Probe, Probe, RecordedArtifacts};
use perf_sweep::progress::SweepProgress;
use perf_sweep::report::{HtmlDocument, ReportCompiler, SvgLineChart, TextDocument};
use perf_sweep::summary::write_summary_json;
use perf_sweep::sweep::{SweepDriver, SweepOutcomes};

const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    env_logger::try_init()?;

    let args = CliArgs::try_parse()?;
    info!("{CRATE_NAME} {CRATE_VERSION}");

    let config = args.sweep_config()?;
    config.validate().context("Invalid sweep configuration")?;
    debug!("Resolved configuration: {config:?}");
    info!("Configuration fingerprint: {}", config.fingerprint());

    let outcomes = if args.skip_probe {
        info!(
            "Skipping the probe, reading artifacts from {}",
            config.artifact_dir.display()
        );
        run_sweep(&config, RecordedArtifacts::new(&config.artifact_dir), &args)
    } else {
        run_sweep(&config, K6Probe::from_config(&config)?, &args)
    };

    let sections = SeriesAggregator::aggregate(&outcomes, &config.categories);
    let report =
        ReportCompiler::new(&config, SvgLineChart::new(config.chart)).compile(&outcomes, sections);

    report
        .write_to(HtmlDocument::create(&config.report_path))
        .with_context(|| {
            format!(
                "Failed to write report to {}",
                config.report_path.display()
            )
        })?;

    if let Some(path) = &args.summary_json {
        write_summary_json(path, &report)?;
    }

    if !args.quiet {
        report
            .write_to(TextDocument::new(io::stdout().lock()))
            .context("Failed to print report")?;
    }

    Ok(())
}

fn run_sweep<P>(config: &SweepConfig, probe: P, args: &CliArgs) -> SweepOutcomes
where
    P: Probe,
{
    let progress = if args.no_progress {
        SweepProgress::hidden()
    } else {
        SweepProgress::new(config.levels.len())
    };
    SweepDriver::new(config, probe)
        .with_progress(progress)
        .run()
}
