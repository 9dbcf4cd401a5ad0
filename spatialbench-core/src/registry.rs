// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Name-keyed engine factory registry.
//!
//! The registry is an explicit value built once at process start and read-only
//! afterwards. Each lookup calls the stored constructor, so callers never share
//! an adapter instance.

use std::collections::BTreeMap;
use std::fmt;

use crate::engine::Engine;
use crate::error::{BenchError, BenchResult};

/// Constructor producing a fresh, unconnected engine.
pub type EngineFactory = Box<dyn Fn() -> Box<dyn Engine> + Send + Sync>;

/// Registry mapping lower-cased engine names to their constructors.
#[derive(Default)]
pub struct EngineRegistry {
    /// Sorted map of engine name to factory.
    factories: BTreeMap<String, EngineFactory>,
}

impl EngineRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a constructor under `name` (stored lower-cased).
    /// Returns DuplicateEngine if the name is taken.
    pub fn register<F>(&mut self, name: &str, factory: F) -> BenchResult<()>
    where
        F: Fn() -> Box<dyn Engine> + Send + Sync + 'static,
    {
        let key = name.to_lowercase();

        if self.factories.contains_key(&key) {
            return Err(BenchError::DuplicateEngine { name: key });
        }

        self.factories.insert(key, Box::new(factory));
        Ok(())
    }

    /// Build a fresh engine for `name`, case-insensitively.
    ///
    /// Fails with UnknownEngine listing every registered name when the name is
    /// absent, and with EngineIdentityMismatch when the built engine reports a
    /// different identity than its key.
    pub fn get(&self, name: &str) -> BenchResult<Box<dyn Engine>> {
        let key = name.to_lowercase();
        let factory = self
            .factories
            .get(&key)
            .ok_or_else(|| BenchError::UnknownEngine {
                name: name.to_string(),
                available: self.list().join(", "),
            })?;

        let engine = factory();
        if engine.name() != key {
            return Err(BenchError::EngineIdentityMismatch {
                key,
                identity: engine.name().to_string(),
            });
        }

        Ok(engine)
    }

    /// Registered names in lexicographic order.
    pub fn list(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Check if an engine is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Get the number of registered engines.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::error::ErrorCategory;
    use crate::record::ExecutionRecord;
    use crate::types::{QueryId, ScaleFactor};

    struct NamedEngine {
        name: &'static str,
        connected: bool,
    }

    impl NamedEngine {
        fn boxed(name: &'static str) -> Box<dyn Engine> {
            Box::new(Self {
                name,
                connected: false,
            })
        }
    }

    impl Engine for NamedEngine {
        fn name(&self) -> &'static str {
            self.name
        }

        fn dialect(&self) -> &'static str {
            "DuckDB"
        }

        fn connect(&mut self) -> BenchResult<()> {
            self.connected = true;
            Ok(())
        }

        fn load_data(&mut self, _data_dir: &Path, _scale_factor: ScaleFactor) -> BenchResult<()> {
            Ok(())
        }

        fn run_query(&mut self, query: &QueryId, _text: &str, _timeout: Duration) -> ExecutionRecord {
            ExecutionRecord::success(query.clone(), self.name, 0.0, 0)
        }

        fn close(&mut self) {
            self.connected = false;
        }
    }

    fn registry() -> EngineRegistry {
        let mut registry = EngineRegistry::new();
        registry.register("duckdb", || NamedEngine::boxed("duckdb")).unwrap();
        registry.register("arrow", || NamedEngine::boxed("arrow")).unwrap();
        registry
    }

    #[test]
    fn test_register_and_get() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("duckdb"));

        let engine = registry.get("duckdb").unwrap();
        assert_eq!(engine.name(), "duckdb");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.get("DuckDB").unwrap().name(), "duckdb");
        assert!(registry.contains("ARROW"));
    }

    #[test]
    fn test_list_is_sorted() {
        assert_eq!(registry().list(), vec!["arrow", "duckdb"]);
    }

    #[test]
    fn test_unknown_engine_lists_available() {
        let err = registry().get("NONEXISTENT").err().unwrap();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        let message = err.to_string();
        assert!(message.contains("NONEXISTENT"));
        assert!(message.contains("arrow, duckdb"));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry();
        let err = registry.register("DUCKDB", || NamedEngine::boxed("duckdb"));
        assert!(matches!(err, Err(BenchError::DuplicateEngine { .. })));
    }

    #[test]
    fn test_identity_must_match_key() {
        let mut registry = EngineRegistry::new();
        registry.register("sedona", || NamedEngine::boxed("duckdb")).unwrap();
        assert!(matches!(
            registry.get("sedona"),
            Err(BenchError::EngineIdentityMismatch { .. })
        ));
    }

    #[test]
    fn test_get_returns_distinct_instances() {
        let registry = registry();
        let mut first = registry.get("duckdb").unwrap();
        let second = registry.get("duckdb").unwrap();

        first.connect().unwrap();
        assert!(!std::ptr::eq(
            first.as_ref() as *const dyn Engine as *const u8,
            second.as_ref() as *const dyn Engine as *const u8
        ));
    }
}
