// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `spatialbench run` command - Benchmark one or more engines.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Args;

use spatialbench_benchmark::{
    format_aggregated_table, format_comparison_table, format_results_table, BenchmarkRunner,
    Reporter, RunObserver, RunSummary,
};
use spatialbench_core::{
    BenchConfig, BenchError, ConfigLoader, EngineRegistry, EngineSelection, ExecutionRecord,
    IterationCount, OutputFormat, ScaleFactor,
};

const RULE_WIDTH: usize = 80;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Engine to benchmark: a name, a comma-separated list, or "all"
    #[arg(short, long)]
    pub engine: Option<String>,

    /// Directory holding the generated SpatialBench tables
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Dataset scale factor
    #[arg(short, long)]
    pub scale_factor: Option<f64>,

    /// Passes over the query suite
    #[arg(short = 'n', long)]
    pub iterations: Option<u32>,

    /// Comma-separated subset of queries, e.g. q1,q5,q10
    #[arg(short, long)]
    pub queries: Option<String>,

    /// Write results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format when the file extension does not decide it
    #[arg(long, value_parser = ["json", "csv"])]
    pub output_format: Option<String>,

    /// Skip the warmup phase
    #[arg(long)]
    pub no_warmup: bool,

    /// Add data loading time to the total
    #[arg(long)]
    pub include_load_time: bool,

    /// Per-query timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// YAML run file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read query texts from <DIR>/<Dialect>/qN.sql instead of the built-in set
    #[arg(long)]
    pub queries_dir: Option<PathBuf>,
}

impl RunArgs {
    /// Merge the run file (if any) with the flags given on the command line.
    pub fn resolve(&self) -> anyhow::Result<BenchConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_file(path)?,
            None => BenchConfig::default(),
        };

        if let Some(engine) = &self.engine {
            config.engines = Some(engine.parse::<EngineSelection>()?);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(sf) = self.scale_factor {
            config.scale_factor = ScaleFactor::new(sf)?;
        }
        if let Some(n) = self.iterations {
            config.iterations = IterationCount::new(n)?;
        }
        if let Some(queries) = &self.queries {
            let names: Vec<String> = queries
                .split(',')
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect();
            config.queries = (!names.is_empty()).then_some(names);
        }
        if let Some(path) = &self.output {
            config.output.path = Some(path.clone());
        }
        if let Some(format) = &self.output_format {
            config.output.format = format.parse::<OutputFormat>()?;
        }
        if self.no_warmup {
            config.warmup = false;
        }
        if self.include_load_time {
            config.include_load_time = true;
        }
        if let Some(secs) = self.timeout {
            if secs == 0 {
                bail!("Timeout must be greater than 0");
            }
            config.query_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Prints each execution as it completes.
struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn on_run_start(&mut self, engine: &str) {
        println!();
        println!("{}", "=".repeat(RULE_WIDTH));
        println!("Running benchmark: {}", engine);
        println!("{}", "=".repeat(RULE_WIDTH));
    }

    fn on_iteration_start(&mut self, _engine: &str, iteration: u32, total: u32) {
        if total > 1 {
            println!();
            println!("Iteration {}/{}", iteration, total);
        }
    }

    fn on_record(&mut self, record: &ExecutionRecord) {
        if record.is_success() {
            println!(
                "  [✓] {}: {:.4}s ({} rows)",
                record.query_name(),
                record.duration_seconds(),
                record.row_count()
            );
        } else {
            println!(
                "  [✗] {}: FAILED - {}",
                record.query_name(),
                record.error_message().unwrap_or("")
            );
        }
    }
}

/// Header and table for one completed run.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("RESULTS: {}", summary.engine);
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("Version:       {}", summary.engine_version);
    println!("Scale factor:  {}", summary.scale_factor);
    println!("Iterations:    {}", summary.iterations);
    println!(
        "Successful:    {}/{}",
        summary.successful_queries(),
        summary.total_queries()
    );
    if summary.include_load_time {
        println!(
            "Total time:    {:.2}s (includes {:.2}s load)",
            summary.total_time(),
            summary.load_time_seconds
        );
    } else {
        println!("Total time:    {:.2}s", summary.total_time());
    }
    println!();

    if summary.iterations.value() > 1 {
        print!("{}", format_aggregated_table(&summary.aggregated()));
    } else {
        print!("{}", format_results_table(summary.records()));
    }
}

/// Fail early on names the registry does not know.
fn check_engines(registry: &EngineRegistry, names: &[String]) -> Result<(), BenchError> {
    for name in names {
        if !registry.contains(name) {
            return Err(BenchError::UnknownEngine {
                name: name.clone(),
                available: registry.list().join(", "),
            });
        }
    }
    Ok(())
}

pub fn execute(args: &RunArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;

    let Some(selection) = &config.engines else {
        bail!("No engine selected. Pass --engine <name|all> or set 'engines' in the run file");
    };
    let Some(data_dir) = &config.data_dir else {
        bail!("No data directory given. Pass --data-dir or set 'data_dir' in the run file");
    };
    if !data_dir.is_dir() {
        bail!("Data directory not found: {}", data_dir.display());
    }

    let registry = spatialbench_engines::default_registry()?;
    let names = selection.names(&registry.list());
    check_engines(&registry, &names)?;

    let provider = super::query_provider(args.queries_dir.as_deref())?;

    println!("SpatialBench");
    println!("Engines:      {}", names.join(", "));
    println!("Data dir:     {}", data_dir.display());
    println!("Scale factor: {}", config.scale_factor);
    println!("Iterations:   {}", config.iterations);

    let runner = BenchmarkRunner::from_config(&config, data_dir);
    let outcomes = runner.run_all(&registry, &names, provider.as_ref(), &mut ConsoleObserver);

    let mut completed = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(summary) => completed.push(summary),
            Err(e) => {
                eprintln!();
                eprintln!("✗ {} failed: {}", outcome.name, e.source);
                if e.partial.total_queries() > 0 {
                    eprintln!("  ({} queries ran before the failure)", e.partial.total_queries());
                }
            }
        }
    }

    if completed.is_empty() {
        bail!("No engine completed successfully");
    }

    for summary in &completed {
        print_summary(summary);
    }

    if completed.len() > 1 {
        println!();
        print!("{}", format_comparison_table(&completed));
    }

    if let Some(path) = &config.output.path {
        let saved = Reporter::new(path, config.output.format)
            .save(&completed)
            .inspect_err(|e| tracing::error!(category = %e.category(), error = %e, "Export failed"))
            .with_context(|| format!("Failed to export results to {}", path.display()))?;
        println!();
        println!("Results saved to: {}", saved.display());
    }

    Ok(())
}
