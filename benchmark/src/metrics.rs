// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Run summaries and per-query aggregated statistics.
//!
//! A [`RunSummary`] holds every execution record collected for one backend.
//! Statistics are derived on demand, never stored, so a summary re-read from a
//! saved report reproduces the same numbers as the live run.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sysinfo::System;

use spatialbench_core::{ExecutionRecord, HardValidationError, IterationCount, QueryId, ScaleFactor};

/// Tolerance used when checking a re-read report's stored totals.
const TOTAL_TIME_TOLERANCE: f64 = 1e-6;

/// Statistics for one query across all of its attempts in a run.
///
/// Numeric statistics are `None` when no attempt succeeded; zero is a valid
/// measurement and is never used as a stand-in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedStat {
    #[serde(skip)]
    pub query_name: QueryId,
    #[serde(skip)]
    pub engine: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    /// Sample standard deviation (n - 1); zero for a single success
    pub std_dev: Option<f64>,
    /// Number of attempts, successful or not
    pub iterations: usize,
    pub successful_iterations: usize,
    /// Fraction of attempts that succeeded, in `0.0..=1.0`
    pub success_rate: f64,
    /// Non-empty error messages, collected only when every attempt failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl AggregatedStat {
    /// Aggregate the attempts of a single query.
    pub fn from_records<'a, I>(query_name: QueryId, engine: impl Into<String>, records: I) -> Self
    where
        I: IntoIterator<Item = &'a ExecutionRecord>,
    {
        let mut attempts = 0usize;
        let mut durations = Vec::new();
        let mut errors = Vec::new();

        for record in records {
            attempts += 1;
            if record.is_success() {
                durations.push(record.duration_seconds());
            } else if let Some(message) = record.error_message().filter(|m| !m.is_empty()) {
                errors.push(message.to_string());
            }
        }

        let successes = durations.len();
        let success_rate = if attempts == 0 {
            0.0
        } else {
            successes as f64 / attempts as f64
        };

        let mut stat = Self {
            query_name,
            engine: engine.into(),
            min: None,
            max: None,
            mean: None,
            median: None,
            std_dev: None,
            iterations: attempts,
            successful_iterations: successes,
            success_rate,
            errors: Vec::new(),
        };

        if durations.is_empty() {
            stat.errors = errors;
            return stat;
        }

        durations.sort_by(f64::total_cmp);
        let n = durations.len();
        let mean = durations.iter().sum::<f64>() / n as f64;

        stat.min = Some(durations[0]);
        stat.max = Some(durations[n - 1]);
        stat.mean = Some(mean);
        stat.median = Some(median_of_sorted(&durations));
        stat.std_dev = Some(sample_std_dev(&durations, mean));
        stat
    }

    pub fn has_successes(&self) -> bool {
        self.successful_iterations > 0
    }
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn sample_std_dev(samples: &[f64], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let variance = samples
        .iter()
        .map(|&x| {
            let diff = x - mean;
            diff * diff
        })
        .sum::<f64>()
        / (samples.len() - 1) as f64;
    variance.sqrt()
}

/// All results for one backend's run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub engine: String,
    pub engine_version: String,
    pub scale_factor: ScaleFactor,
    pub iterations: IterationCount,
    pub timestamp: DateTime<Utc>,
    /// Whether `total_time` adds the load phase
    pub include_load_time: bool,
    pub load_time_seconds: f64,
    records: Vec<ExecutionRecord>,
}

impl RunSummary {
    pub fn new(engine: impl Into<String>, scale_factor: ScaleFactor, iterations: IterationCount) -> Self {
        Self {
            engine: engine.into(),
            engine_version: "unknown".to_string(),
            scale_factor,
            iterations,
            timestamp: Utc::now(),
            include_load_time: false,
            load_time_seconds: 0.0,
            records: Vec::new(),
        }
    }

    /// Append a record in execution order.
    pub fn add_record(&mut self, record: ExecutionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    pub fn total_queries(&self) -> usize {
        self.records.len()
    }

    pub fn successful_queries(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_queries(&self) -> usize {
        self.total_queries() - self.successful_queries()
    }

    /// Sum of elapsed time over successful records.
    pub fn query_time(&self) -> f64 {
        self.records
            .iter()
            .filter(|r| r.is_success())
            .map(ExecutionRecord::duration_seconds)
            .sum()
    }

    /// Query time, plus the load phase once when load time is included.
    pub fn total_time(&self) -> f64 {
        if self.include_load_time {
            self.query_time() + self.load_time_seconds
        } else {
            self.query_time()
        }
    }

    /// Per-query statistics, ordered by each query's first appearance.
    pub fn aggregated(&self) -> Vec<AggregatedStat> {
        let mut order: Vec<&QueryId> = Vec::new();
        for record in &self.records {
            if !order.contains(&record.query_name()) {
                order.push(record.query_name());
            }
        }

        order
            .into_iter()
            .map(|query| {
                let attempts = self.records.iter().filter(|r| r.query_name() == query);
                AggregatedStat::from_records(query.clone(), self.engine.clone(), attempts)
            })
            .collect()
    }

    /// Statistics for a single query, if it ran at all.
    pub fn aggregated_for(&self, query: &QueryId) -> Option<AggregatedStat> {
        let mut attempts = self.records.iter().filter(|r| r.query_name() == query).peekable();
        attempts.peek()?;
        Some(AggregatedStat::from_records(query.clone(), self.engine.clone(), attempts))
    }
}

/// Run-level totals block of a saved report.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SummaryBlock {
    total_queries: usize,
    successful_queries: usize,
    failed_queries: usize,
    total_time_seconds: f64,
    query_time_seconds: f64,
    #[serde(default)]
    load_time_seconds: f64,
    #[serde(default)]
    include_load_time: bool,
}

/// Aggregated statistics keyed by query name, in first-appearance order.
struct OrderedStats<'a>(&'a [AggregatedStat]);

impl Serialize for OrderedStats<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for stat in self.0 {
            map.serialize_entry(stat.query_name.as_str(), stat)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    engine: &'a str,
    engine_version: &'a str,
    scale_factor: ScaleFactor,
    iterations: IterationCount,
    timestamp: DateTime<Utc>,
    summary: SummaryBlock,
    aggregated_results: OrderedStats<'a>,
    raw_results: &'a [ExecutionRecord],
}

impl Serialize for RunSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let aggregated = self.aggregated();
        ReportView {
            engine: &self.engine,
            engine_version: &self.engine_version,
            scale_factor: self.scale_factor,
            iterations: self.iterations,
            timestamp: self.timestamp,
            summary: SummaryBlock {
                total_queries: self.total_queries(),
                successful_queries: self.successful_queries(),
                failed_queries: self.failed_queries(),
                total_time_seconds: self.total_time(),
                query_time_seconds: self.query_time(),
                load_time_seconds: self.load_time_seconds,
                include_load_time: self.include_load_time,
            },
            aggregated_results: OrderedStats(&aggregated),
            raw_results: &self.records,
        }
        .serialize(serializer)
    }
}

/// Saved report as parsed, before the totals are checked against the records.
///
/// `aggregated_results` is derived data and is recomputed rather than read.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRunReport {
    engine: String,
    #[serde(default = "default_version")]
    engine_version: String,
    scale_factor: ScaleFactor,
    iterations: IterationCount,
    timestamp: DateTime<Utc>,
    summary: SummaryBlock,
    raw_results: Vec<ExecutionRecord>,
}

fn default_version() -> String {
    "unknown".to_string()
}

impl TryFrom<RawRunReport> for RunSummary {
    type Error = HardValidationError;

    fn try_from(raw: RawRunReport) -> Result<Self, Self::Error> {
        let mut summary = RunSummary::new(raw.engine, raw.scale_factor, raw.iterations);
        summary.engine_version = raw.engine_version;
        summary.timestamp = raw.timestamp;
        summary.include_load_time = raw.summary.include_load_time;
        summary.load_time_seconds = raw.summary.load_time_seconds;
        summary.records = raw.raw_results;

        let mismatch = |field: &'static str, stored: String, actual: String| {
            HardValidationError::InvalidFieldValue {
                field,
                value: stored,
                reason: format!("does not match raw results ({})", actual),
            }
        };

        let block = &raw.summary;
        if block.total_queries != summary.total_queries() {
            return Err(mismatch(
                "summary.total_queries",
                block.total_queries.to_string(),
                summary.total_queries().to_string(),
            ));
        }
        if block.successful_queries != summary.successful_queries() {
            return Err(mismatch(
                "summary.successful_queries",
                block.successful_queries.to_string(),
                summary.successful_queries().to_string(),
            ));
        }
        if block.failed_queries != summary.failed_queries() {
            return Err(mismatch(
                "summary.failed_queries",
                block.failed_queries.to_string(),
                summary.failed_queries().to_string(),
            ));
        }
        if (block.total_time_seconds - summary.total_time()).abs() > TOTAL_TIME_TOLERANCE {
            return Err(mismatch(
                "summary.total_time_seconds",
                block.total_time_seconds.to_string(),
                summary.total_time().to_string(),
            ));
        }

        Ok(summary)
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        let unknown = || "Unknown".to_string();
        Self {
            os: System::name().unwrap_or_else(unknown),
            os_version: System::os_version().unwrap_or_else(unknown),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .unwrap_or_else(unknown),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(name: &str) -> QueryId {
        QueryId::new(name).unwrap()
    }

    fn summary_with(durations: &[(&str, Option<f64>)]) -> RunSummary {
        let mut summary = RunSummary::new("duckdb", ScaleFactor::default(), IterationCount::default());
        for (i, (query, duration)) in durations.iter().enumerate() {
            let record = match duration {
                Some(secs) => ExecutionRecord::success(q(query), "duckdb", *secs, 10),
                None => ExecutionRecord::failure(q(query), "duckdb", 0.5, "boom"),
            };
            summary.add_record(record.with_iteration(i as u32 + 1));
        }
        summary
    }

    #[test]
    fn test_mean_and_median() {
        let summary = summary_with(&[("q1", Some(1.0)), ("q1", Some(2.0)), ("q1", Some(3.0))]);
        let stat = &summary.aggregated()[0];

        assert_eq!(stat.mean, Some(2.0));
        assert_eq!(stat.median, Some(2.0));
        assert_eq!(stat.min, Some(1.0));
        assert_eq!(stat.max, Some(3.0));
        assert_eq!(stat.success_rate, 1.0);
        assert!((stat.std_dev.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_median_sorts_samples() {
        let summary = summary_with(&[("q1", Some(1.0)), ("q1", Some(5.0)), ("q1", Some(2.0))]);
        assert_eq!(summary.aggregated()[0].median, Some(2.0));
    }

    #[test]
    fn test_median_even_count() {
        let summary = summary_with(&[("q1", Some(4.0)), ("q1", Some(1.0))]);
        assert_eq!(summary.aggregated()[0].median, Some(2.5));
    }

    #[test]
    fn test_partial_failure() {
        let summary = summary_with(&[("q1", Some(1.0)), ("q1", None), ("q1", Some(3.0))]);
        let stat = &summary.aggregated()[0];

        assert!((stat.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(stat.mean, Some(2.0));
        assert_eq!(stat.max, Some(3.0));
        assert_eq!(stat.iterations, 3);
        assert_eq!(stat.successful_iterations, 2);
        assert!(stat.errors.is_empty());
    }

    #[test]
    fn test_single_success_has_zero_std_dev() {
        let summary = summary_with(&[("q4", Some(0.7))]);
        assert_eq!(summary.aggregated()[0].std_dev, Some(0.0));
    }

    #[test]
    fn test_all_failed() {
        let summary = summary_with(&[("q2", None), ("q2", None)]);
        let stat = &summary.aggregated()[0];

        assert_eq!(stat.success_rate, 0.0);
        assert!(stat.mean.is_none());
        assert!(stat.median.is_none());
        assert!(stat.min.is_none());
        assert!(stat.max.is_none());
        assert!(stat.std_dev.is_none());
        assert_eq!(stat.errors, vec!["boom", "boom"]);
    }

    #[test]
    fn test_first_appearance_order() {
        let summary = summary_with(&[("q10", Some(1.0)), ("q2", Some(1.0)), ("q10", Some(1.0))]);
        let names: Vec<_> = summary.aggregated().iter().map(|s| s.query_name.to_string()).collect();
        assert_eq!(names, vec!["q10", "q2"]);
    }

    #[test]
    fn test_counts_and_total_time() {
        let mut summary = summary_with(&[("q1", Some(1.5)), ("q2", None), ("q3", Some(0.5))]);
        assert_eq!(summary.total_queries(), 3);
        assert_eq!(summary.successful_queries(), 2);
        assert_eq!(summary.failed_queries(), 1);
        assert_eq!(summary.total_time(), 2.0);

        summary.load_time_seconds = 4.0;
        assert_eq!(summary.total_time(), 2.0);
        summary.include_load_time = true;
        assert_eq!(summary.total_time(), 6.0);
        assert_eq!(summary.query_time(), 2.0);
    }

    #[test]
    fn test_aggregated_for_missing_query() {
        let summary = summary_with(&[("q1", Some(1.0))]);
        assert!(summary.aggregated_for(&q("q1")).is_some());
        assert!(summary.aggregated_for(&q("q9")).is_none());
    }

    #[test]
    fn test_report_shape() {
        let summary = summary_with(&[("q2", None), ("q10", Some(0.25)), ("q1", Some(0.5))]);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["engine"], "duckdb");
        assert_eq!(value["summary"]["total_queries"], 3);
        assert_eq!(value["summary"]["failed_queries"], 1);
        assert_eq!(value["aggregated_results"]["q2"]["mean"], serde_json::Value::Null);
        assert_eq!(value["aggregated_results"]["q2"]["errors"][0], "boom");
        assert!(value["aggregated_results"]["q1"].get("errors").is_none());
        assert_eq!(value["raw_results"].as_array().unwrap().len(), 3);

        let text = serde_json::to_string(&summary).unwrap();
        let q2 = text.find("\"q2\":{").unwrap();
        let q10 = text.find("\"q10\":{").unwrap();
        assert!(q2 < q10);
    }

    #[test]
    fn test_report_round_trip() {
        let mut summary = summary_with(&[("q1", Some(1.25)), ("q2", None), ("q1", Some(0.75))]);
        summary.engine_version = "v1.4.1".to_string();
        summary.load_time_seconds = 3.0;
        summary.include_load_time = true;

        let text = serde_json::to_string(&summary).unwrap();
        let raw: RawRunReport = serde_json::from_str(&text).unwrap();
        let loaded = RunSummary::try_from(raw).unwrap();

        assert_eq!(loaded.records(), summary.records());
        assert_eq!(loaded.total_time(), summary.total_time());
        assert_eq!(loaded.engine_version, "v1.4.1");
    }

    #[test]
    fn test_tampered_report_rejected() {
        let summary = summary_with(&[("q1", Some(1.0))]);
        let mut value = serde_json::to_value(&summary).unwrap();
        value["summary"]["total_queries"] = serde_json::json!(5);

        let raw: RawRunReport = serde_json::from_value(value).unwrap();
        let err = RunSummary::try_from(raw).unwrap_err();
        assert!(err.to_string().contains("summary.total_queries"));
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }
}
