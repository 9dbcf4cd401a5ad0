// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `spatialbench validate` command - Validate a YAML run file.

use std::path::Path;

use spatialbench_core::ConfigLoader;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    tracing::info!(file = %file.display(), "Validating run file");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Run file is valid");
            println!();
            let engines = match &config.engines {
                Some(selection) if selection.is_all() => "all".to_string(),
                Some(selection) => selection.names(&[]).join(", "),
                None => "(not set)".to_string(),
            };
            let data_dir = config
                .data_dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "(not set)".to_string());
            let queries = config
                .queries
                .as_ref()
                .map(|q| q.join(", "))
                .unwrap_or_else(|| "all".to_string());

            println!("  Engines:           {}", engines);
            println!("  Data directory:    {}", data_dir);
            println!("  Scale factor:      {}", config.scale_factor);
            println!("  Iterations:        {}", config.iterations);
            println!("  Queries:           {}", queries);
            println!("  Warmup:            {}", config.warmup);
            println!("  Include load time: {}", config.include_load_time);
            println!("  Query timeout:     {}s", config.query_timeout.as_secs());
            if let Some(path) = &config.output.path {
                println!("  Output:            {} ({})", path.display(), config.output.format);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Run file validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
