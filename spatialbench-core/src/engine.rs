// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The contract every benchmark backend implements.
//!
//! The typical lifecycle driven by the orchestrator is:
//!
//! 1. `connect()`
//! 2. `load_data(data_dir, scale_factor)`
//! 3. `warmup()` (optional)
//! 4. `run_query(query, text, timeout)` for every query and iteration
//! 5. `close()` on every exit path
//!
//! Backends come in two flavours, told apart by [`Engine::uses_query_text`]:
//! SQL backends execute the dialect text handed to them, function-dispatch
//! backends ignore the text and map query identifiers to their own callables.

use std::path::Path;
use std::time::Duration;

use crate::error::BenchResult;
use crate::record::ExecutionRecord;
use crate::types::{QueryId, ScaleFactor};

/// Standard SpatialBench tables, in load order.
pub const SPATIALBENCH_TABLES: [&str; 6] = ["trip", "customer", "driver", "vehicle", "building", "zone"];

/// Number of queries in the SpatialBench suite.
pub const SPATIALBENCH_QUERY_COUNT: u32 = 12;

/// Default advisory timeout handed to `run_query`.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1200);

/// A pluggable benchmark backend.
pub trait Engine {
    /// Short identifier used for registry lookup and result tagging.
    fn name(&self) -> &'static str;

    /// Query-text vocabulary this backend consumes. Function-dispatch
    /// backends return a placeholder label.
    fn dialect(&self) -> &'static str;

    /// Whether `run_query` consumes the dialect text.
    fn uses_query_text(&self) -> bool {
        true
    }

    /// Establish session state. Fails with a connection error when the
    /// backend is unreachable or misconfigured.
    fn connect(&mut self) -> BenchResult<()>;

    /// Bind the SpatialBench tables to the data under `data_dir`.
    ///
    /// Fails with `DataDirNotFound` when the directory is absent and with a
    /// load error when a required table cannot be materialized.
    fn load_data(&mut self, data_dir: &Path, scale_factor: ScaleFactor) -> BenchResult<()>;

    /// Execute exactly one unit of work.
    ///
    /// Never fails: every failure mode ends up in the returned record, and the
    /// elapsed time always covers the whole attempt. `timeout` is advisory.
    fn run_query(&mut self, query: &QueryId, query_text: &str, timeout: Duration) -> ExecutionRecord;

    /// Release all resources. Idempotent, and safe without a prior `connect`.
    fn close(&mut self);

    /// Pre-execution step that avoids cold-start skew in the first query.
    fn warmup(&mut self) -> BenchResult<()> {
        Ok(())
    }

    /// Backend version string for the report.
    fn version(&self) -> String {
        "unknown".to_string()
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn dialect(&self) -> &'static str {
        (**self).dialect()
    }

    fn uses_query_text(&self) -> bool {
        (**self).uses_query_text()
    }

    fn connect(&mut self) -> BenchResult<()> {
        (**self).connect()
    }

    fn load_data(&mut self, data_dir: &Path, scale_factor: ScaleFactor) -> BenchResult<()> {
        (**self).load_data(data_dir, scale_factor)
    }

    fn run_query(&mut self, query: &QueryId, query_text: &str, timeout: Duration) -> ExecutionRecord {
        (**self).run_query(query, query_text, timeout)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn warmup(&mut self) -> BenchResult<()> {
        (**self).warmup()
    }

    fn version(&self) -> String {
        (**self).version()
    }
}
