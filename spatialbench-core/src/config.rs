// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML run configuration with strict validation.
//!
//! A run file supplies defaults for every flag of the `run` command. Any
//! invalid field results in a HardValidationError before a backend is touched.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult, HardValidationError};
use crate::types::{IterationCount, ScaleFactor};

/// Serialization format of an exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    /// Format implied by a file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    /// The extension wins over the explicit format.
    pub fn resolve(path: &Path, explicit: Self) -> Self {
        Self::from_path(path).unwrap_or(explicit)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(HardValidationError::InvalidFieldValue {
                field: "output_format",
                value: s.to_string(),
                reason: "Expected one of: json, csv".to_string(),
            }),
        }
    }
}

/// Which engines a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSelection {
    /// Every registered engine.
    All,
    /// Named engines, in the order given.
    Named(Vec<String>),
}

impl EngineSelection {
    /// Engine names to run, given the registered names.
    pub fn names(&self, registered: &[String]) -> Vec<String> {
        match self {
            Self::All => registered.to_vec(),
            Self::Named(names) => names.clone(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    fn from_names<I, S>(names: I) -> Result<Self, HardValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();

        if names.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "engines",
                value: String::new(),
                reason: "At least one engine must be named".to_string(),
            });
        }
        if names.iter().any(|n| n.eq_ignore_ascii_case("all")) {
            return Ok(Self::All);
        }
        Ok(Self::Named(names))
    }
}

impl FromStr for EngineSelection {
    type Err = HardValidationError;

    /// Parses `all` or a comma-separated list of names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_names(s.split(','))
    }
}

/// Where and how to export results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputConfig {
    pub path: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Validated run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub engines: Option<EngineSelection>,
    pub data_dir: Option<PathBuf>,
    pub scale_factor: ScaleFactor,
    pub iterations: IterationCount,
    /// Requested query subset, as written. Unknown names are reported when the
    /// run resolves its query set.
    pub queries: Option<Vec<String>>,
    pub warmup: bool,
    pub include_load_time: bool,
    pub query_timeout: Duration,
    pub output: OutputConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            engines: None,
            data_dir: None,
            scale_factor: ScaleFactor::default(),
            iterations: IterationCount::default(),
            queries: None,
            warmup: true,
            include_load_time: false,
            query_timeout: Duration::from_secs(default_query_timeout_secs()),
            output: OutputConfig::default(),
        }
    }
}

/// Either a comma-separated string or a YAML list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNameList {
    Joined(String),
    List(Vec<String>),
}

impl RawNameList {
    fn into_names(self) -> Vec<String> {
        match self {
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            Self::List(list) => list,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutputConfig {
    path: Option<String>,
    format: Option<String>,
}

/// Raw configuration as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBenchConfig {
    engines: Option<RawNameList>,
    data_dir: Option<String>,
    #[serde(default = "default_scale_factor")]
    scale_factor: f64,
    #[serde(default = "default_iterations")]
    iterations: u32,
    queries: Option<RawNameList>,
    #[serde(default = "default_true")]
    warmup: bool,
    #[serde(default)]
    include_load_time: bool,
    #[serde(default = "default_query_timeout_secs")]
    query_timeout_secs: u64,
    #[serde(default)]
    output: RawOutputConfig,
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_iterations() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_query_timeout_secs() -> u64 {
    1200 // 20 minutes
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> BenchResult<BenchConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BenchError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| BenchError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> BenchResult<BenchConfig> {
        let raw: RawBenchConfig =
            serde_yaml::from_str(content).map_err(|e| BenchError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Ok(Self::validate(raw)?)
    }

    fn validate(raw: RawBenchConfig) -> Result<BenchConfig, HardValidationError> {
        let engines = raw
            .engines
            .map(|list| EngineSelection::from_names(list.into_names()))
            .transpose()?;

        let scale_factor = ScaleFactor::new(raw.scale_factor)?;
        let iterations = IterationCount::new(raw.iterations)?;

        if raw.query_timeout_secs == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "query_timeout_secs",
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        let queries = raw.queries.map(|list| {
            list.into_names()
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect::<Vec<_>>()
        });

        if matches!(&queries, Some(q) if q.is_empty()) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "queries",
                value: String::new(),
                reason: "Query list must not be empty when given".to_string(),
            });
        }

        let format = raw
            .output
            .format
            .as_deref()
            .map(|f| {
                f.parse::<OutputFormat>().map_err(|_| HardValidationError::InvalidFieldValue {
                    field: "output.format",
                    value: f.to_string(),
                    reason: "Expected one of: json, csv".to_string(),
                })
            })
            .transpose()?
            .unwrap_or_default();

        Ok(BenchConfig {
            engines,
            data_dir: raw.data_dir.map(PathBuf::from),
            scale_factor,
            iterations,
            queries,
            warmup: raw.warmup,
            include_load_time: raw.include_load_time,
            query_timeout: Duration::from_secs(raw.query_timeout_secs),
            output: OutputConfig {
                path: raw.output.path.map(PathBuf::from),
                format,
            },
        })
    }
}
