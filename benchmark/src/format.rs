// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Fixed-width text tables for console output.
//!
//! Durations render with four decimals and percentages with none. A missing
//! statistic renders as `-`, never as zero.

use std::collections::BTreeSet;
use std::fmt::Write;

use spatialbench_core::{ExecutionRecord, QueryId};

use crate::metrics::{AggregatedStat, RunSummary};

/// Placeholder for an absent value.
pub const MISSING: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Column {
    title: String,
    width: usize,
    align: Align,
}

impl Column {
    fn left(title: impl Into<String>, width: usize) -> Self {
        Self {
            title: title.into(),
            width,
            align: Align::Left,
        }
    }

    fn right(title: impl Into<String>, width: usize) -> Self {
        Self {
            title: title.into(),
            width,
            align: Align::Right,
        }
    }
}

/// Column-aligned table. Cells wider than their column push it wider.
#[derive(Debug, Default)]
struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain([col.width, col.title.chars().count()])
                    .max()
                    .unwrap_or(col.width)
            })
            .collect()
    }

    fn render_row(&self, cells: &[String], widths: &[usize], header: bool) -> String {
        self.columns
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (col, &width))| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                match (header, col.align) {
                    (true, _) | (false, Align::Left) => format!("{:<width$}", cell),
                    (false, Align::Right) => format!("{:>width$}", cell),
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }

    fn render(&self) -> String {
        let widths = self.widths();
        let titles: Vec<String> = self.columns.iter().map(|c| c.title.clone()).collect();
        let separator = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-");

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.render_row(&titles, &widths, true));
        let _ = writeln!(out, "{}", separator);
        for row in &self.rows {
            let _ = writeln!(out, "{}", self.render_row(row, &widths, false));
        }
        out
    }
}

/// Seconds with four decimals, or the placeholder.
pub fn format_seconds(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |secs| format!("{:.4}", secs))
}

/// Fraction rendered as a whole percentage.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

fn status(record: &ExecutionRecord) -> &'static str {
    if record.is_success() {
        "OK"
    } else {
        "FAILED"
    }
}

fn duration_and_rows(record: &ExecutionRecord) -> (String, String) {
    if record.is_success() {
        (
            format_seconds(Some(record.duration_seconds())),
            record.row_count().to_string(),
        )
    } else {
        (MISSING.to_string(), MISSING.to_string())
    }
}

/// One row per execution, for single-iteration runs.
pub fn format_results_table(records: &[ExecutionRecord]) -> String {
    let mut table = Table::new(vec![
        Column::left("Query", 8),
        Column::left("Engine", 12),
        Column::right("Duration (s)", 14),
        Column::right("Rows", 10),
        Column::left("Status", 8),
    ]);

    for record in records {
        let (duration, rows) = duration_and_rows(record);
        table.push(vec![
            record.query_name().to_string(),
            record.engine().to_string(),
            duration,
            rows,
            status(record).to_string(),
        ]);
    }
    table.render()
}

/// One row per execution with its iteration index.
pub fn format_iteration_table(records: &[ExecutionRecord]) -> String {
    let mut table = Table::new(vec![
        Column::left("Query", 8),
        Column::right("Iter", 4),
        Column::left("Engine", 12),
        Column::right("Duration (s)", 14),
        Column::right("Rows", 10),
        Column::left("Status", 8),
    ]);

    for record in records {
        let (duration, rows) = duration_and_rows(record);
        table.push(vec![
            record.query_name().to_string(),
            record.iteration().to_string(),
            record.engine().to_string(),
            duration,
            rows,
            status(record).to_string(),
        ]);
    }
    table.render()
}

/// One row per query with its aggregated statistics.
pub fn format_aggregated_table(stats: &[AggregatedStat]) -> String {
    let mut table = Table::new(vec![
        Column::left("Query", 8),
        Column::left("Engine", 12),
        Column::right("Mean (s)", 10),
        Column::right("Median (s)", 10),
        Column::right("Min (s)", 10),
        Column::right("Max (s)", 10),
        Column::right("StdDev", 8),
        Column::right("Success", 8),
    ]);

    for stat in stats {
        table.push(vec![
            stat.query_name.to_string(),
            stat.engine.clone(),
            format_seconds(stat.mean),
            format_seconds(stat.median),
            format_seconds(stat.min),
            format_seconds(stat.max),
            format_seconds(stat.std_dev),
            format_percent(stat.success_rate),
        ]);
    }
    table.render()
}

/// Mean time per query side by side for several backends, with a total row.
pub fn format_comparison_table(summaries: &[RunSummary]) -> String {
    let mut columns = vec![Column::left("Query", 8)];
    columns.extend(
        summaries
            .iter()
            .map(|s| Column::right(format!("{} (s)", s.engine), 12)),
    );
    let mut table = Table::new(columns);

    let per_engine: Vec<Vec<AggregatedStat>> = summaries.iter().map(RunSummary::aggregated).collect();
    let queries: BTreeSet<&QueryId> = per_engine
        .iter()
        .flatten()
        .map(|stat| &stat.query_name)
        .collect();

    for query in queries {
        let mut row = vec![query.to_string()];
        for stats in &per_engine {
            let mean = stats
                .iter()
                .find(|stat| &stat.query_name == query)
                .and_then(|stat| stat.mean);
            row.push(format_seconds(mean));
        }
        table.push(row);
    }

    let mut total = vec!["TOTAL".to_string()];
    total.extend(summaries.iter().map(|s| format_seconds(Some(s.total_time()))));
    table.push(total);

    let body = table.render();
    let width = body.lines().next().map(|l| l.chars().count()).unwrap_or(0);
    let rule = "=".repeat(width);
    format!("{}\nCOMPARISON: Mean Query Times\n{}\n{}", rule, rule, body)
}
