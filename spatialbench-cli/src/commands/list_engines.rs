// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `spatialbench list-engines` command - Show registered engines.

pub fn execute() -> anyhow::Result<()> {
    let registry = spatialbench_engines::default_registry()?;

    println!("Available engines:");
    for name in registry.list() {
        let engine = registry.get(&name)?;
        let kind = if engine.uses_query_text() {
            "SQL"
        } else {
            "function-based"
        };
        println!("  {:<12} dialect: {:<12} {}", name, engine.dialect(), kind);
    }
    println!();
    println!("Total: {} engine(s)", registry.len());

    Ok(())
}
