// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Embedded DuckDB backend.
//!
//! Runs the `DuckDB` dialect against an in-memory database with the spatial
//! extension loaded. Each SpatialBench table is exposed as a view over its
//! Parquet data, so nothing is copied into DuckDB's own storage.

use std::path::Path;
use std::time::Duration;

use duckdb::Connection;

use spatialbench_core::{
    BenchError, BenchResult, Engine, ExecutionRecord, QueryId, ScaleFactor, ScopedTimer, TableSet,
};

const ENGINE_NAME: &str = "duckdb";

/// In-memory DuckDB engine.
#[derive(Debug)]
pub struct DuckDbEngine {
    /// Open connection (None until connected or after close).
    conn: Option<Connection>,
    /// Whether connect installs and loads the spatial extension.
    load_spatial: bool,
    /// Views created by the last load.
    views: Vec<&'static str>,
}

impl DuckDbEngine {
    /// Create an engine that loads the spatial extension on connect.
    pub fn new() -> Self {
        Self {
            conn: None,
            load_spatial: true,
            views: Vec::new(),
        }
    }

    /// Create an engine that skips the spatial extension. Only plain SQL
    /// works against it, which is enough for offline checks.
    pub fn without_spatial() -> Self {
        Self {
            load_spatial: false,
            ..Self::new()
        }
    }

    /// Views registered by the last successful load.
    pub fn views(&self) -> &[&'static str] {
        &self.views
    }

    fn connection(&self) -> BenchResult<&Connection> {
        self.conn.as_ref().ok_or_else(|| {
            BenchError::connection(ENGINE_NAME, "Connection not established. Call connect() first.")
        })
    }
}

impl Default for DuckDbEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `sql` and count the rows it produces.
fn count_rows(conn: &Connection, sql: &str) -> duckdb::Result<u64> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut count = 0u64;
    while rows.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Quote a path for use inside a SQL string literal.
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl Engine for DuckDbEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn dialect(&self) -> &'static str {
        "DuckDB"
    }

    fn connect(&mut self) -> BenchResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        tracing::info!(engine = ENGINE_NAME, "Creating in-memory DuckDB connection");
        let conn = Connection::open_in_memory().map_err(|e| BenchError::connection(ENGINE_NAME, e))?;

        if self.load_spatial {
            tracing::info!(engine = ENGINE_NAME, "Loading DuckDB spatial extension");
            conn.execute_batch("INSTALL spatial; LOAD spatial;").map_err(|e| {
                BenchError::connection(
                    ENGINE_NAME,
                    format!("Failed to load DuckDB spatial extension: {}", e),
                )
            })?;
        }

        // Keeps repeated iterations from being served out of DuckDB's file cache.
        if let Err(e) = conn.execute_batch("SET enable_external_file_cache = false") {
            tracing::warn!(engine = ENGINE_NAME, error = %e, "Could not disable external file cache");
        }

        self.conn = Some(conn);
        tracing::info!(engine = ENGINE_NAME, "DuckDB connection established");
        Ok(())
    }

    fn load_data(&mut self, data_dir: &Path, scale_factor: ScaleFactor) -> BenchResult<()> {
        let conn = self.connection()?;
        let tables = TableSet::resolve(data_dir, "parquet", &[])?;

        tracing::info!(
            engine = ENGINE_NAME,
            data_dir = %data_dir.display(),
            scale_factor = %scale_factor,
            "Loading data"
        );

        let mut views = Vec::with_capacity(tables.len());
        for table in tables.iter() {
            let source = sql_literal(&table.source.scan_pattern("parquet"));
            conn.execute_batch(&format!(
                "CREATE OR REPLACE VIEW {} AS SELECT * FROM read_parquet({})",
                table.name, source
            ))
            .map_err(|e| BenchError::load(table.name, e))?;

            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |row| row.get(0))
                .map_err(|e| BenchError::load(table.name, e))?;

            tracing::info!(table = table.name, rows = count, "Loaded table");
            views.push(table.name);
        }

        self.views = views;
        tracing::info!(engine = ENGINE_NAME, tables = self.views.len(), "All tables loaded");
        Ok(())
    }

    fn run_query(&mut self, query: &QueryId, query_text: &str, _timeout: Duration) -> ExecutionRecord {
        tracing::debug!(query = %query, "Executing query");

        let conn = self.conn.as_ref();
        let mut timer = ScopedTimer::new();
        let outcome = timer.time(|| match conn {
            Some(conn) => count_rows(conn, query_text).map_err(|e| e.to_string()),
            None => Err("Connection not established".to_string()),
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
        self.views.clear();
        if let Some(conn) = self.conn.take() {
            tracing::info!(engine = ENGINE_NAME, "Closing DuckDB connection");
            if let Err((_, e)) = conn.close() {
                tracing::warn!(engine = ENGINE_NAME, error = %e, "Error closing connection");
            }
        }
    }

    fn warmup(&mut self) -> BenchResult<()> {
        let Some(conn) = self.conn.as_ref() else {
            return Ok(());
        };

        tracing::debug!(engine = ENGINE_NAME, "Running warmup query");
        count_rows(conn, "SELECT 1").map_err(|e| BenchError::warmup(ENGINE_NAME, e))?;
        if self.load_spatial {
            count_rows(conn, "SELECT ST_GeomFromText('POINT(0 0)')")
                .map_err(|e| BenchError::warmup(ENGINE_NAME, e))?;
        }
        Ok(())
    }

    fn version(&self) -> String {
        self.conn
            .as_ref()
            .and_then(|conn| {
                conn.query_row("SELECT version()", [], |row| row.get::<_, String>(0))
                    .ok()
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}
