// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Resolution of SpatialBench tables inside a data directory.
//!
//! Each table is either a single file `{table}.{ext}` or a directory
//! `{table}/` holding partition files with the same extension.

use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::SPATIALBENCH_TABLES;
use crate::error::{BenchError, BenchResult};

/// Where a table's data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// One file holding the whole table.
    File(PathBuf),
    /// A partition directory and its files, sorted by path.
    Partitioned { dir: PathBuf, files: Vec<PathBuf> },
}

impl TableSource {
    /// Every file backing the table.
    pub fn files(&self) -> Vec<&Path> {
        match self {
            Self::File(path) => vec![path.as_path()],
            Self::Partitioned { files, .. } => files.iter().map(PathBuf::as_path).collect(),
        }
    }

    /// Glob-style pattern understood by SQL engines reading the table,
    /// e.g. `data/trip/*.parquet` for a partitioned table.
    pub fn scan_pattern(&self, ext: &str) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Partitioned { dir, .. } => dir.join(format!("*.{}", ext)).display().to_string(),
        }
    }
}

/// One resolved table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTable {
    pub name: &'static str,
    pub source: TableSource,
}

/// Tables found under a data directory, in load order.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: Vec<ResolvedTable>,
    missing: Vec<&'static str>,
}

impl TableSet {
    /// Resolve every SpatialBench table under `dir`.
    ///
    /// Fails with DataDirNotFound when `dir` does not exist, and with a load
    /// error when a table listed in `required` is unresolvable or when no
    /// table resolves at all. Other unresolvable tables are logged and skipped.
    pub fn resolve(dir: &Path, ext: &str, required: &[&str]) -> BenchResult<Self> {
        if !dir.is_dir() {
            return Err(BenchError::DataDirNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut set = Self::default();
        for table in SPATIALBENCH_TABLES {
            match resolve_table(dir, table, ext)? {
                Some(source) => {
                    tracing::debug!(table, source = ?source, "Resolved table");
                    set.tables.push(ResolvedTable { name: table, source });
                }
                None if required.contains(&table) => {
                    return Err(BenchError::load(
                        table,
                        format!("not found at {} or {}", file_path(dir, table, ext).display(), dir.join(table).display()),
                    ));
                }
                None => {
                    tracing::warn!(
                        table,
                        path = %file_path(dir, table, ext).display(),
                        "Table not found, skipping"
                    );
                    set.missing.push(table);
                }
            }
        }

        if set.tables.is_empty() {
            return Err(BenchError::load(
                "*",
                format!("no SpatialBench tables found in {}", dir.display()),
            ));
        }

        Ok(set)
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedTable> {
        self.tables.iter()
    }

    /// Tables that could not be resolved.
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn file_path(dir: &Path, table: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}.{}", table, ext))
}

fn resolve_table(dir: &Path, table: &str, ext: &str) -> BenchResult<Option<TableSource>> {
    let file = file_path(dir, table, ext);
    if file.is_file() {
        return Ok(Some(TableSource::File(file)));
    }

    let partition_dir = dir.join(table);
    if !partition_dir.is_dir() {
        return Ok(None);
    }

    let entries = fs::read_dir(&partition_dir).map_err(|source| BenchError::Io {
        context: "reading table partition directory",
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| BenchError::Io {
                context: "reading table partition entry",
                source,
            })?
            .path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(ext) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Ok(None);
    }
    files.sort();

    Ok(Some(TableSource::Partitioned {
        dir: partition_dir,
        files,
    }))
}
