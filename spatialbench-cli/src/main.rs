// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! SpatialBench CLI
//!
//! Command-line interface for benchmarking spatial query engines.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// SpatialBench - spatial query benchmark across interchangeable engines
#[derive(Parser)]
#[command(name = "spatialbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the benchmark against one or more engines
    Run(commands::run::RunArgs),

    /// List registered engines
    ListEngines,

    /// List the queries available for a dialect
    ListQueries {
        /// Query dialect
        #[arg(short, long, default_value = "SedonaSpark")]
        dialect: String,

        /// Read query texts from <DIR>/<Dialect>/qN.sql instead of the built-in set
        #[arg(long)]
        queries_dir: Option<PathBuf>,
    },

    /// Validate a YAML run file
    Validate {
        /// Path to the run file
        file: PathBuf,
    },

    /// Render a saved single-engine JSON report
    Show {
        /// Path to the report
        file: PathBuf,

        /// Also list every execution
        #[arg(long)]
        raw: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch to command handlers
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::ListEngines => commands::list_engines::execute(),
        Commands::ListQueries {
            dialect,
            queries_dir,
        } => commands::list_queries::execute(dialect, queries_dir.as_deref()),
        Commands::Validate { file } => commands::validate::execute(file),
        Commands::Show { file, raw } => commands::show::execute(file, *raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "spatialbench",
            "-v",
            "run",
            "--engine",
            "all",
            "--data-dir",
            "/data",
            "--include-load-time",
            "-o",
            "results.csv",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.engine.as_deref(), Some("all"));
        assert!(args.include_load_time);
        assert!(!args.no_warmup);
        assert_eq!(args.output, Some(PathBuf::from("results.csv")));
    }

    #[test]
    fn test_parse_list_queries_default_dialect() {
        let cli = Cli::try_parse_from(["spatialbench", "list-queries"]).unwrap();
        let Commands::ListQueries { dialect, .. } = cli.command else {
            panic!("expected list-queries command");
        };
        assert_eq!(dialect, "SedonaSpark");
    }

    #[test]
    fn test_verbose_after_subcommand() {
        let cli = Cli::try_parse_from(["spatialbench", "list-engines", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
