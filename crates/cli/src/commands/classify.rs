use anyhow::{Context, Result};
use symfetch_core::classify::{classify_directory, Classification};

use crate::commands::{canonicalize_or_current, print_list};

/// Classify modules under `dir` without contacting any symbol server.
pub fn classify_command(dir: &str, json: bool) -> Result<Classification> {
    let root = canonicalize_or_current(dir)?;
    let classification = classify_directory(&root)
        .with_context(|| format!("Failed to classify modules under {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&classification)?);
        return Ok(classification);
    }

    println!("Modules ({}):", classification.len());
    if classification.is_empty() {
        println!("  (none)");
        return Ok(classification);
    }
    print_list("Existing pdbs", classification.local_symbols.iter().map(|p| p.display()));
    print_list("Embedded symbols", classification.embedded_symbols.iter().map(|p| p.display()));
    print_list("Needs download", classification.to_download.iter().map(|p| p.display()));
    Ok(classification)
}
