use anyhow::{Context, Result};
use symfetch_core::config::PipelineConfig;
use symfetch_core::pipeline::{run_pipeline, PipelineResult};

use crate::commands::{canonicalize_or_current, load_settings, print_list};

/// Classify modules under `dir`, download missing symbols, and report the outcome.
pub fn resolve_command(
    dir: &str,
    cache_dir: Option<String>,
    config: Option<&str>,
    timeout_secs: Option<u64>,
    json: bool,
) -> Result<PipelineResult> {
    let root = canonicalize_or_current(dir)?;
    let settings = load_settings(config, cache_dir, timeout_secs)?;
    let pipeline_config = PipelineConfig::from_settings(&root, &settings);

    let result = run_pipeline(&pipeline_config)
        .with_context(|| format!("Failed to resolve symbols under {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_human(&result);
    }
    Ok(result)
}

fn print_human(result: &PipelineResult) {
    println!("Publish dir: {}", result.root.display());
    match &result.cache_directory {
        Some(dir) => println!("Cache directory: {}", dir.display()),
        None => println!("Cache directory: (none)"),
    }
    print_list(
        "Skipped modules with existing pdbs",
        result.local_symbols.iter().map(|p| p.display()),
    );
    print_list(
        "Skipped modules with embedded symbols",
        result.embedded_symbols.iter().map(|p| p.display()),
    );
    if result.to_download.is_empty() {
        println!("No modules found to process");
    } else {
        print_list("Modules to process", result.to_download.iter().map(|p| p.display()));
    }
    print_list("Symbols written", &result.found_symbols);
    print_list("Missing symbols", &result.missing_symbols);
    println!("Finished in {}ms", result.elapsed_ms);
}
