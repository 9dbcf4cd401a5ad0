// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Raw result of one query execution attempt.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;
use crate::types::QueryId;

/// Result of a single query execution attempt.
///
/// Built only through [`ExecutionRecord::success`] or
/// [`ExecutionRecord::failure`], so a successful record never carries an
/// error and a failed record always reports zero rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawExecutionRecord")]
pub struct ExecutionRecord {
    /// Identifier for the query (e.g., "q1")
    query_name: QueryId,
    /// Name of the engine that ran the query
    engine: String,
    /// Whether the query completed successfully
    success: bool,
    /// Wall-clock time for the attempt, failures included
    duration_seconds: f64,
    /// Number of rows returned (0 when failed)
    row_count: u64,
    /// Error description, present iff the attempt failed
    error_message: Option<String>,
    /// Which iteration this result is from (1-based)
    iteration: u32,
    /// Engine-specific metadata
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl ExecutionRecord {
    /// Record a successful execution.
    pub fn success(
        query_name: QueryId,
        engine: impl Into<String>,
        duration_seconds: f64,
        row_count: u64,
    ) -> Self {
        Self {
            query_name,
            engine: engine.into(),
            success: true,
            duration_seconds,
            row_count,
            error_message: None,
            iteration: 1,
            metadata: HashMap::new(),
        }
    }

    /// Record a failed execution. Row count is always zero.
    pub fn failure(
        query_name: QueryId,
        engine: impl Into<String>,
        duration_seconds: f64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            query_name,
            engine: engine.into(),
            success: false,
            duration_seconds,
            row_count: 0,
            error_message: Some(error_message.into()),
            iteration: 1,
            metadata: HashMap::new(),
        }
    }

    /// Stamp the iteration index. Zero is clamped to 1.
    pub fn with_iteration(mut self, iteration: u32) -> Self {
        self.iteration = iteration.max(1);
        self
    }

    /// Add metadata to the record.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn query_name(&self) -> &QueryId {
        &self.query_name
    }

    pub fn engine(&self) -> &str {
        &self.engine
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// Record as read from a report, before invariant checks.
#[derive(Debug, Deserialize)]
struct RawExecutionRecord {
    query_name: QueryId,
    engine: String,
    success: bool,
    #[serde(default)]
    duration_seconds: f64,
    #[serde(default)]
    row_count: u64,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default = "default_iteration")]
    iteration: u32,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

fn default_iteration() -> u32 {
    1
}

impl TryFrom<RawExecutionRecord> for ExecutionRecord {
    type Error = HardValidationError;

    fn try_from(raw: RawExecutionRecord) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| HardValidationError::InvalidRecord {
            query: raw.query_name.to_string(),
            reason: reason.to_string(),
        };

        if raw.success && raw.error_message.is_some() {
            return Err(invalid("successful record carries an error message"));
        }
        if !raw.success && raw.row_count != 0 {
            return Err(invalid("failed record reports a non-zero row count"));
        }
        if raw.iteration == 0 {
            return Err(invalid("iteration index must be at least 1"));
        }

        // A failed record read back without a message still gets one, so the
        // "error present iff failed" rule survives a round trip.
        let error_message = match (raw.success, raw.error_message) {
            (false, None) => Some(String::new()),
            (_, message) => message,
        };

        Ok(Self {
            query_name: raw.query_name,
            engine: raw.engine,
            success: raw.success,
            duration_seconds: raw.duration_seconds,
            row_count: raw.row_count,
            error_message,
            iteration: raw.iteration,
            metadata: raw.metadata,
        })
    }
}
