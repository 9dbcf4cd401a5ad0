// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `spatialbench show` command - Render a saved JSON report.

use std::path::Path;

use anyhow::Context;

use spatialbench_benchmark::{format_iteration_table, Reporter};

pub fn execute(file: &Path, raw: bool) -> anyhow::Result<()> {
    let summary =
        Reporter::load(file).with_context(|| format!("Failed to read report {}", file.display()))?;

    println!("Report: {} ({})", file.display(), summary.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    super::run::print_summary(&summary);

    if raw {
        println!();
        print!("{}", format_iteration_table(summary.records()));
    }

    Ok(())
}
