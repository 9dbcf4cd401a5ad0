// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod list_engines;
pub mod list_queries;
pub mod run;
pub mod show;
pub mod validate;

use std::path::Path;

use spatialbench_core::{BenchResult, BuiltinQueries, DirectoryQueries, QueryProvider};

/// Query texts from `dir` when given, otherwise the built-in set.
pub fn query_provider(dir: Option<&Path>) -> BenchResult<Box<dyn QueryProvider>> {
    match dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Loading query texts from directory");
            Ok(Box::new(DirectoryQueries::open(dir)?))
        }
        None => Ok(Box::new(BuiltinQueries::new())),
    }
}
