// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON and CSV export of run summaries.
//!
//! A single backend is exported as its structured report. Several backends
//! are exported together as a comparison document tagged with a run id and
//! the host's system information.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use spatialbench_core::{
    ErrorCategory, HardValidationError, IterationCount, OutputFormat, ScaleFactor,
};

use crate::metrics::{AggregatedStat, RawRunReport, RunSummary, SystemInfo};

/// Header of the single-backend CSV export.
pub const CSV_HEADER: &str =
    "query_name,engine,mean_seconds,median_seconds,min_seconds,max_seconds,std_dev,iterations,success_rate";

/// Header of the multi-backend CSV export.
pub const COMPARISON_CSV_HEADER: &str =
    "engine,query_name,mean_seconds,median_seconds,min_seconds,max_seconds,std_dev,success_rate";

/// Errors that can occur during report export or re-reading.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid report {path}: {source}")]
    InvalidReport {
        path: PathBuf,
        #[source]
        source: HardValidationError,
    },

    #[error("Nothing to export: no backend completed")]
    Empty,
}

impl ReporterError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Export
    }
}

/// Combined document for several backends.
#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    comparison: bool,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub scale_factor: ScaleFactor,
    pub iterations: IterationCount,
    pub system_info: SystemInfo,
    pub engines: &'a [RunSummary],
}

impl<'a> ComparisonReport<'a> {
    /// Wrap `summaries`, collecting system information now.
    ///
    /// Scale factor and iteration count are taken from the first summary;
    /// every backend in one invocation shares them.
    pub fn new(summaries: &'a [RunSummary]) -> Option<Self> {
        let first = summaries.first()?;
        Some(Self {
            comparison: true,
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            scale_factor: first.scale_factor,
            iterations: first.iterations,
            system_info: SystemInfo::collect(),
            engines: summaries,
        })
    }
}

/// Writes summaries to one output file in the chosen format.
#[derive(Debug, Clone)]
pub struct Reporter {
    path: PathBuf,
    format: OutputFormat,
}

impl Reporter {
    /// Create a reporter for `path`. A `.json` or `.csv` extension overrides
    /// `format`.
    pub fn new(path: impl AsRef<Path>, format: OutputFormat) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = OutputFormat::resolve(&path, format);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Export completed runs. One summary is written as a plain report,
    /// several as a comparison.
    pub fn save(&self, summaries: &[RunSummary]) -> Result<PathBuf, ReporterError> {
        match (summaries, self.format) {
            ([], _) => return Err(ReporterError::Empty),
            ([single], OutputFormat::Json) => self.write_json(single)?,
            ([single], OutputFormat::Csv) => self.write_csv(&render_csv(single))?,
            (many, OutputFormat::Json) => {
                let report = ComparisonReport::new(many).ok_or(ReporterError::Empty)?;
                self.write_json(&report)?
            }
            (many, OutputFormat::Csv) => self.write_csv(&render_comparison_csv(many))?,
        }

        tracing::info!(
            path = %self.path.display(),
            format = %self.format,
            engines = summaries.len(),
            "Results exported"
        );
        Ok(self.path.clone())
    }

    /// Load a single-backend JSON report written by [`Reporter::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<RunSummary, ReporterError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReporterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawRunReport = serde_json::from_reader(io::BufReader::new(file))?;
        RunSummary::try_from(raw).map_err(|source| ReporterError::InvalidReport {
            path: path.to_path_buf(),
            source,
        })
    }

    fn create(&self) -> Result<BufWriter<File>, ReporterError> {
        let io_err = |source| ReporterError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = File::create(&self.path).map_err(io_err)?;
        Ok(BufWriter::new(file))
    }

    fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), ReporterError> {
        let mut writer = self.create()?;
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush().map_err(|source| ReporterError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn write_csv(&self, content: &str) -> Result<(), ReporterError> {
        let mut writer = self.create()?;
        writer
            .write_all(content.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|source| ReporterError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// Raw number, or empty when absent.
fn csv_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn stat_columns(stat: &AggregatedStat) -> [String; 5] {
    [
        csv_number(stat.mean),
        csv_number(stat.median),
        csv_number(stat.min),
        csv_number(stat.max),
        csv_number(stat.std_dev),
    ]
}

/// Flat export: one row per query, aggregated statistics only.
pub fn render_csv(summary: &RunSummary) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for stat in summary.aggregated() {
        let mut row = vec![csv_field(stat.query_name.as_str()), csv_field(&stat.engine)];
        row.extend(stat_columns(&stat));
        row.push(stat.iterations.to_string());
        row.push(stat.success_rate.to_string());
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Flat comparison export: one row per backend and query.
pub fn render_comparison_csv(summaries: &[RunSummary]) -> String {
    let mut out = String::from(COMPARISON_CSV_HEADER);
    out.push('\n');

    for summary in summaries {
        for stat in summary.aggregated() {
            let mut row = vec![csv_field(&summary.engine), csv_field(stat.query_name.as_str())];
            row.extend(stat_columns(&stat));
            row.push(stat.success_rate.to_string());
            out.push_str(&row.join(","));
            out.push('\n');
        }
    }
    out
}
