// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Function-dispatch backend over Arrow record batches.
//!
//! Tables are read from Parquet into memory during load. Query identifiers
//! map to native Rust implementations through a registration table built when
//! the engine is constructed; query text is never consulted.

mod geometry;
mod queries;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

use arrow::record_batch::RecordBatch;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use spatialbench_core::{
    BenchError, BenchResult, Engine, ExecutionRecord, QueryId, ScaleFactor, ScopedTimer, TableSet,
};

const ENGINE_NAME: &str = "arrow";

/// Failure inside a native query implementation.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Table '{0}' is not loaded")]
    MissingTable(String),

    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: DataType },

    #[error("Invalid geometry in column '{column}' at row {row}: {reason}")]
    Geometry {
        column: String,
        row: usize,
        reason: String,
    },
}

/// Native query implementation. Returns the number of result rows.
pub(crate) type QueryFn = fn(&TableStore) -> Result<u64, QueryError>;

/// In-memory tables keyed by name.
#[derive(Debug, Default)]
pub(crate) struct TableStore {
    tables: HashMap<&'static str, Vec<RecordBatch>>,
}

impl TableStore {
    pub(crate) fn table(&self, name: &str) -> Result<&[RecordBatch], QueryError> {
        self.tables
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| QueryError::MissingTable(name.to_string()))
    }

    fn row_count(&self, name: &str) -> usize {
        self.tables
            .get(name)
            .map(|batches| batches.iter().map(RecordBatch::num_rows).sum())
            .unwrap_or(0)
    }
}

fn read_parquet(path: &Path, batches: &mut Vec<RecordBatch>) -> Result<(), String> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    for batch in reader {
        batches.push(batch.map_err(|e| format!("{}: {}", path.display(), e))?);
    }
    Ok(())
}

/// Arrow function-dispatch engine.
pub struct ArrowEngine {
    queries: BTreeMap<QueryId, QueryFn>,
    store: TableStore,
    connected: bool,
}

impl ArrowEngine {
    pub fn new() -> Self {
        let queries = queries::REGISTERED
            .iter()
            .filter_map(|(number, func)| QueryId::from_number(*number).ok().map(|id| (id, *func)))
            .collect();

        Self {
            queries,
            store: TableStore::default(),
            connected: false,
        }
    }

    /// Query identifiers with a native implementation, in numeric order.
    pub fn available_queries(&self) -> Vec<QueryId> {
        self.queries.keys().cloned().collect()
    }

    /// Rows loaded for `table`, zero when not loaded.
    pub fn loaded_rows(&self, table: &str) -> usize {
        self.store.row_count(table)
    }
}

impl fmt::Debug for ArrowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrowEngine")
            .field("queries", &self.available_queries())
            .field("tables", &self.store.tables.keys().collect::<Vec<_>>())
            .field("connected", &self.connected)
            .finish()
    }
}

impl Default for ArrowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for ArrowEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn dialect(&self) -> &'static str {
        "Arrow"
    }

    fn uses_query_text(&self) -> bool {
        false
    }

    fn connect(&mut self) -> BenchResult<()> {
        tracing::info!(
            engine = ENGINE_NAME,
            queries = self.queries.len(),
            "Arrow engine ready"
        );
        self.connected = true;
        Ok(())
    }

    fn load_data(&mut self, data_dir: &Path, scale_factor: ScaleFactor) -> BenchResult<()> {
        if !self.connected {
            return Err(BenchError::connection(
                ENGINE_NAME,
                "Connection not established. Call connect() first.",
            ));
        }

        let tables = TableSet::resolve(data_dir, "parquet", &["trip"])?;
        tracing::info!(
            engine = ENGINE_NAME,
            data_dir = %data_dir.display(),
            scale_factor = %scale_factor,
            "Reading tables into memory"
        );

        let mut store = TableStore::default();
        for table in tables.iter() {
            let mut batches = Vec::new();
            for file in table.source.files() {
                read_parquet(file, &mut batches).map_err(|e| BenchError::load(table.name, e))?;
            }
            store.tables.insert(table.name, batches);
            tracing::info!(table = table.name, rows = store.row_count(table.name), "Loaded table");
        }

        self.store = store;
        Ok(())
    }

    fn run_query(&mut self, query: &QueryId, _query_text: &str, _timeout: Duration) -> ExecutionRecord {
        tracing::debug!(query = %query, "Executing query function");

        let func = self.queries.get(query).copied();
        let store = &self.store;

        let mut timer = ScopedTimer::new();
        let outcome = timer.time(|| match func {
            Some(func) => func(store).map_err(|e| e.to_string()),
            None => Err(format!("Query function '{}' not found", query)),
        });
        let elapsed = timer.elapsed_secs();

        match outcome {
            Ok(rows) => {
                tracing::debug!(query = %query, rows, elapsed_secs = elapsed, "Query completed");
                ExecutionRecord::success(query.clone(), ENGINE_NAME, elapsed, rows)
            }
            Err(e) => {
                tracing::error!(query = %query, error = %e, "Query failed");
                ExecutionRecord::failure(query.clone(), ENGINE_NAME, elapsed, e)
            }
        }
    }

    fn close(&mut self) {
        if self.connected {
            tracing::info!(engine = ENGINE_NAME, "Closing Arrow engine");
        }
        self.store = TableStore::default();
        self.connected = false;
    }

    fn version(&self) -> String {
        format!("arrow-rs (spatialbench-engines {})", env!("CARGO_PKG_VERSION"))
    }
}
