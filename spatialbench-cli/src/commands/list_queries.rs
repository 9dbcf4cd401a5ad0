// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `spatialbench list-queries` command - Show the query set of a dialect.

use std::path::Path;

pub fn execute(dialect: &str, queries_dir: Option<&Path>) -> anyhow::Result<()> {
    let provider = super::query_provider(queries_dir)?;
    let ids = provider.list_queries(dialect)?;

    println!("Dialect: {}", dialect);
    println!("Available dialects: {}", provider.dialects().join(", "));
    println!();
    println!("Queries ({}):", ids.len());
    for id in &ids {
        println!("  {}", id);
    }

    Ok(())
}
