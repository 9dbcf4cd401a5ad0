// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! SpatialBench Benchmarking Framework
//!
//! Runs the SpatialBench query suite against one or more backends and turns
//! the collected execution records into statistics and reports.
//!
//! # Components
//!
//! - **Harness**: the orchestrator driving connect, load, warmup, the
//!   iteration loops and close for one backend
//! - **Metrics**: run summaries and per-query aggregated statistics
//! - **Format**: fixed-width console tables
//! - **Reporter**: JSON and CSV export, plus re-reading saved JSON reports

pub mod format;
pub mod harness;
pub mod metrics;
pub mod reporter;

pub use format::{
    format_aggregated_table, format_comparison_table, format_iteration_table, format_results_table,
};
pub use harness::{BenchmarkRunner, EngineOutcome, NoopObserver, RunError, RunObserver};
pub use metrics::{AggregatedStat, RunSummary, SystemInfo};
pub use reporter::{ComparisonReport, Reporter, ReporterError};
