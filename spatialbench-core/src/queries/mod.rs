// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Query Provider Adapter.
//!
//! Resolves a dialect name to the ordered mapping of query identifier to
//! query text. Every supported dialect must expose the same identifiers.

pub mod spatialbench;

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, BenchResult};
use crate::types::QueryId;

/// Ordered mapping of query identifier to query text, in numeric order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySet {
    queries: BTreeMap<QueryId, String>,
}

impl QuerySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers `q1..=qN` mapped to empty text, for backends that dispatch
    /// query identifiers themselves.
    pub fn placeholders(count: u32) -> Self {
        QueryId::sequence(count)
            .into_iter()
            .map(|id| (id, String::new()))
            .collect()
    }

    pub fn insert(&mut self, id: QueryId, text: impl Into<String>) {
        self.queries.insert(id, text.into());
    }

    pub fn get(&self, id: &QueryId) -> Option<&str> {
        self.queries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &QueryId) -> bool {
        self.queries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Identifiers in numeric order.
    pub fn ids(&self) -> Vec<QueryId> {
        self.queries.keys().cloned().collect()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, QueryId, String> {
        self.queries.iter()
    }

    /// Keep only the requested identifiers. Returns the requested names that
    /// were not present, including names that are not valid identifiers.
    pub fn retain_requested<S: AsRef<str>>(&mut self, requested: &[S]) -> Vec<String> {
        let mut wanted = BTreeSet::new();
        let mut missing = Vec::new();

        for name in requested {
            let name = name.as_ref().trim();
            match name.parse::<QueryId>() {
                Ok(id) if self.queries.contains_key(&id) => {
                    wanted.insert(id);
                }
                _ => missing.push(name.to_string()),
            }
        }

        self.queries.retain(|id, _| wanted.contains(id));
        missing
    }
}

impl FromIterator<(QueryId, String)> for QuerySet {
    fn from_iter<I: IntoIterator<Item = (QueryId, String)>>(iter: I) -> Self {
        Self {
            queries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for QuerySet {
    type Item = (QueryId, String);
    type IntoIter = btree_map::IntoIter<QueryId, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySet {
    type Item = (&'a QueryId, &'a String);
    type IntoIter = btree_map::Iter<'a, QueryId, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

/// Source of query text per dialect.
pub trait QueryProvider {
    /// Supported dialect names, sorted.
    fn dialects(&self) -> Vec<String>;

    /// Full query mapping for `dialect`. Fails with UnknownDialect when the
    /// dialect is not supported.
    fn queries_for(&self, dialect: &str) -> BenchResult<QuerySet>;

    /// Text of one query, or `None` when the dialect lacks it.
    fn query_for(&self, dialect: &str, id: &QueryId) -> BenchResult<Option<String>> {
        Ok(self.queries_for(dialect)?.get(id).map(str::to_string))
    }

    /// Number of queries defined for `dialect`.
    fn count_for(&self, dialect: &str) -> BenchResult<usize> {
        Ok(self.queries_for(dialect)?.len())
    }

    /// Query identifiers for `dialect` in numeric order.
    fn list_queries(&self, dialect: &str) -> BenchResult<Vec<QueryId>> {
        Ok(self.queries_for(dialect)?.ids())
    }
}

fn unknown_dialect(dialect: &str, available: &[String]) -> BenchError {
    BenchError::UnknownDialect {
        dialect: dialect.to_string(),
        available: available.join(", "),
    }
}

/// The built-in SpatialBench suite for the four supported SQL dialects.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinQueries;

impl BuiltinQueries {
    pub fn new() -> Self {
        Self
    }

    /// Number of queries in the suite, identical for every dialect.
    pub fn query_count() -> usize {
        spatialbench::TEMPLATES.len()
    }
}

impl QueryProvider for BuiltinQueries {
    fn dialects(&self) -> Vec<String> {
        let mut names: Vec<String> = spatialbench::DIALECTS
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        names.sort();
        names
    }

    fn queries_for(&self, dialect: &str) -> BenchResult<QuerySet> {
        let spelling =
            spatialbench::dialect(dialect).ok_or_else(|| unknown_dialect(dialect, &self.dialects()))?;

        Ok(QueryId::sequence(spatialbench::TEMPLATES.len() as u32)
            .into_iter()
            .zip(spatialbench::TEMPLATES.iter())
            .map(|(id, render)| (id, render(spelling)))
            .collect())
    }
}

/// Query texts loaded from `<root>/<Dialect>/qN.sql` files.
#[derive(Debug, Clone)]
pub struct DirectoryQueries {
    root: PathBuf,
    sets: BTreeMap<String, QuerySet>,
}

impl DirectoryQueries {
    /// Load every dialect directory under `root` and check that all of them
    /// define the same query identifiers.
    pub fn open(root: impl AsRef<Path>) -> BenchResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(BenchError::ConfigNotFound { path: root });
        }

        let mut sets = BTreeMap::new();
        for entry in read_dir_sorted(&root)? {
            if !entry.is_dir() {
                continue;
            }
            let Some(dialect) = entry.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let set = load_dialect_dir(&entry)?;
            tracing::debug!(dialect = %dialect, queries = set.len(), "Loaded query directory");
            sets.insert(dialect.to_string(), set);
        }

        let provider = Self { root, sets };
        provider.validate()?;
        Ok(provider)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate(&self) -> BenchResult<()> {
        let mut sets = self.sets.iter();
        let Some((_, reference)) = sets.next() else {
            return Ok(());
        };
        let expected = reference.ids();

        for (dialect, set) in sets {
            let found = set.ids();
            if found != expected {
                return Err(BenchError::QuerySetMismatch {
                    dialect: dialect.clone(),
                    expected: join_ids(&expected),
                    found: join_ids(&found),
                });
            }
        }
        Ok(())
    }
}

impl QueryProvider for DirectoryQueries {
    fn dialects(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    fn queries_for(&self, dialect: &str) -> BenchResult<QuerySet> {
        self.sets
            .get(dialect)
            .cloned()
            .ok_or_else(|| unknown_dialect(dialect, &self.dialects()))
    }
}

fn read_dir_sorted(dir: &Path) -> BenchResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| BenchError::Io {
        context: "reading query directory",
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BenchError::Io {
            context: "reading query directory entry",
            source,
        })?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn load_dialect_dir(dir: &Path) -> BenchResult<QuerySet> {
    let mut set = QuerySet::new();

    for path in read_dir_sorted(dir)? {
        if path.extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let id = match stem.parse::<QueryId>() {
            Ok(id) => id,
            Err(_) => {
                tracing::warn!(file = %path.display(), "Skipping query file with invalid identifier");
                continue;
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| BenchError::Io {
            context: "reading query file",
            source,
        })?;
        set.insert(id, text.trim());
    }

    Ok(set)
}

fn join_ids(ids: &[QueryId]) -> String {
    ids.iter().map(QueryId::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(name: &str) -> QueryId {
        QueryId::new(name).unwrap()
    }

    #[test]
    fn test_builtin_returns_twelve_queries() {
        let provider = BuiltinQueries::new();
        let queries = provider.queries_for("DuckDB").unwrap();

        assert_eq!(queries.len(), 12);
        for (id, sql) in &queries {
            assert!(sql.to_uppercase().contains("SELECT"), "{} missing SELECT", id);
        }
    }

    #[test]
    fn test_builtin_dialects_share_identifiers() {
        let provider = BuiltinQueries::new();
        let reference = provider.list_queries("SedonaSpark").unwrap();

        for dialect in provider.dialects() {
            assert_eq!(provider.list_queries(&dialect).unwrap(), reference);
            assert_eq!(provider.count_for(&dialect).unwrap(), BuiltinQueries::query_count());
        }
    }

    #[test]
    fn test_dialects_are_sorted() {
        assert_eq!(
            BuiltinQueries::new().dialects(),
            vec!["Databricks", "DuckDB", "SedonaDB", "SedonaSpark"]
        );
    }

    #[test]
    fn test_unknown_dialect() {
        let err = BuiltinQueries::new().queries_for("NonexistentDialect").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown dialect"));
        assert!(message.contains("DuckDB"));

        assert!(BuiltinQueries::new().queries_for("duckdb").is_err());
    }

    #[test]
    fn test_query_for() {
        let provider = BuiltinQueries::new();
        assert!(provider.query_for("DuckDB", &q("q1")).unwrap().is_some());
        assert!(provider.query_for("DuckDB", &q("q99")).unwrap().is_none());
    }

    #[test]
    fn test_ids_in_numeric_order() {
        let ids = BuiltinQueries::new().list_queries("DuckDB").unwrap();
        let names: Vec<&str> = ids.iter().map(QueryId::as_str).collect();
        assert_eq!(&names[..3], &["q1", "q2", "q3"]);
        assert_eq!(names[9], "q10");
    }

    #[test]
    fn test_placeholders() {
        let set = QuerySet::placeholders(12);
        assert_eq!(set.len(), 12);
        assert!(set.iter().all(|(_, text)| text.is_empty()));
    }

    #[test]
    fn test_retain_requested_reports_missing() {
        let mut set = QuerySet::placeholders(12);
        let missing = set.retain_requested(&["q10", "q2", "q99", "bogus"]);

        assert_eq!(set.ids(), vec![q("q2"), q("q10")]);
        assert_eq!(missing, vec!["q99", "bogus"]);
    }
}
