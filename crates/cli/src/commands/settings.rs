use anyhow::Result;
use serde::Serialize;
use symfetch_core::config::{PipelineConfig, CACHE_DIRECTORY_ENV};

use crate::commands::{canonicalize_or_current, load_settings};

/// Resolved configuration as a run would see it.
#[derive(Debug, Serialize)]
pub struct ResolvedSettings {
    pub root: String,
    pub cache_directory: Option<String>,
    pub cache_directory_env: Option<String>,
    pub timeout_secs: u64,
    pub dotnet: String,
}

/// Show the settings a `resolve` run would use, without running anything.
pub fn show_config_command(
    dir: &str,
    cache_dir: Option<String>,
    config: Option<&str>,
    timeout_secs: Option<u64>,
    json: bool,
) -> Result<ResolvedSettings> {
    let root = canonicalize_or_current(dir)?;
    let settings = load_settings(config, cache_dir, timeout_secs)?;
    let resolved = PipelineConfig::from_settings(&root, &settings);
    let info = ResolvedSettings {
        root: resolved.root.display().to_string(),
        cache_directory: resolved.cache_directory.map(|p| p.display().to_string()),
        cache_directory_env: std::env::var(CACHE_DIRECTORY_ENV).ok(),
        timeout_secs: resolved.timeout.as_secs(),
        dotnet: resolved.dotnet,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("Publish dir: {}", info.root);
        println!(
            "{CACHE_DIRECTORY_ENV} environment variable: {}",
            info.cache_directory_env.as_deref().unwrap_or("-")
        );
        println!("Resolved cache directory: {}", info.cache_directory.as_deref().unwrap_or("-"));
        println!("Timeout: {}s", info.timeout_secs);
        println!("dotnet: {}", info.dotnet);
    }
    Ok(info)
}
