// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! SpatialBench Backends
//!
//! Concrete implementations of the engine contract:
//!
//! - `duckdb`: embedded DuckDB with the spatial extension (`DuckDB` dialect)
//! - `databricks`: remote Databricks SQL warehouse (`Databricks` dialect)
//! - `arrow`: in-process function dispatch over Arrow record batches

pub mod columnar;
pub mod databricks;
pub mod duckdb;

pub use crate::columnar::{ArrowEngine, QueryError};
pub use crate::databricks::{DatabricksEngine, DatabricksSettings};
pub use crate::duckdb::DuckDbEngine;

use spatialbench_core::{BenchResult, Engine, EngineRegistry};

/// Registry holding every built-in backend.
pub fn default_registry() -> BenchResult<EngineRegistry> {
    let mut registry = EngineRegistry::new();
    registry.register("arrow", || Box::new(ArrowEngine::new()) as Box<dyn Engine>)?;
    registry.register("databricks", || Box::new(DatabricksEngine::new()) as Box<dyn Engine>)?;
    registry.register("duckdb", || Box::new(DuckDbEngine::new()) as Box<dyn Engine>)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.list(), vec!["arrow", "databricks", "duckdb"]);

        for name in registry.list() {
            let engine = registry.get(&name).unwrap();
            assert_eq!(engine.name(), name);
        }
    }

    #[test]
    fn test_dialects() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.get("duckdb").unwrap().dialect(), "DuckDB");
        assert_eq!(registry.get("Databricks").unwrap().dialect(), "Databricks");
        assert!(!registry.get("arrow").unwrap().uses_query_text());
    }
}
