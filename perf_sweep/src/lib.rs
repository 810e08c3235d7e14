//! Concurrency sweep orchestration for load tests.
//!
//! A [`SweepDriver`](sweep::SweepDriver) runs a [`Probe`](probe::Probe) once per configured
//! concurrency level, strictly one level at a time, and reads the metrics artifact each run
//! leaves behind. The [`SeriesAggregator`](aggregator::SeriesAggregator) turns the outcomes into
//! one table and one p95 series per request category, and the
//! [`ReportCompiler`](report::ReportCompiler) pairs them with charts and writes them to a
//! [`Document`](report::Document).
//!
//! Failed levels never abort a sweep, they are left out of the tables and listed in the
//! report overview.

#[macro_use]
extern crate log;

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod probe;
pub mod progress;
pub mod report;
pub mod summary;
pub mod sweep;
