//! End-to-end symbol resolution: classify, fetch, reconcile.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::classify::classify_directory;
use crate::config::PipelineConfig;
use crate::error::{SymbolError, SymbolResult};
use crate::fetch::{FetchOutcome, SymbolDownloader};
use crate::process::{CommandRunner, ProcessRunner};

/// Everything a host needs to report about one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub root: PathBuf,
    pub cache_directory: Option<PathBuf>,
    /// Modules skipped because a sibling `.pdb` exists.
    pub local_symbols: Vec<PathBuf>,
    /// Modules skipped because they embed a portable PDB.
    pub embedded_symbols: Vec<PathBuf>,
    /// Modules handed to the downloader.
    pub to_download: Vec<PathBuf>,
    /// Bare symbol names still missing after reconciliation.
    pub missing_symbols: Vec<String>,
    /// Symbol files the downloader reported writing.
    pub found_symbols: Vec<String>,
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_ms: u64,
}

/// Run the pipeline with a real process runner built from `config`.
pub fn run_pipeline(config: &PipelineConfig) -> SymbolResult<PipelineResult> {
    let mut runner = ProcessRunner::new(config.timeout);
    if let Some(token) = &config.cancellation {
        runner = runner.with_cancellation(token.clone());
    }
    run_pipeline_with(config, &runner)
}

/// Run the pipeline, delegating process execution to `runner`.
///
/// The runner is never invoked when no module needs symbols.
pub fn run_pipeline_with(
    config: &PipelineConfig,
    runner: &dyn CommandRunner,
) -> SymbolResult<PipelineResult> {
    let started_at = Utc::now().to_rfc3339();
    let clock = Instant::now();
    tracing::info!(
        root = %config.root.display(),
        cache_directory = ?config.cache_directory,
        "resolving symbols"
    );

    if let Some(dir) = &config.cache_directory {
        fs::create_dir_all(dir)
            .map_err(|source| SymbolError::CacheDirectory { path: dir.clone(), source })?;
    }

    let classification = classify_directory(&config.root)?;
    if !classification.local_symbols.is_empty() {
        tracing::info!(
            count = classification.local_symbols.len(),
            "skipped modules with existing pdbs"
        );
    }
    if !classification.embedded_symbols.is_empty() {
        tracing::info!(
            count = classification.embedded_symbols.len(),
            "skipped modules with embedded symbols"
        );
    }

    let outcome = if classification.to_download.is_empty() {
        tracing::info!("no modules found to process");
        FetchOutcome::default()
    } else {
        tracing::info!(count = classification.to_download.len(), "downloading symbols");
        SymbolDownloader::new(runner)
            .with_program(config.dotnet.clone())
            .run(config.cache_directory.as_deref(), &classification.to_download)?
    };

    let elapsed_ms = clock.elapsed().as_millis() as u64;
    tracing::info!(
        written = outcome.found_symbols.len(),
        missing = outcome.missing_symbols.len(),
        elapsed_ms,
        "finished resolving symbols"
    );

    Ok(PipelineResult {
        root: config.root.clone(),
        cache_directory: config.cache_directory.clone(),
        local_symbols: classification.local_symbols,
        embedded_symbols: classification.embedded_symbols,
        to_download: classification.to_download,
        missing_symbols: outcome.missing_symbols,
        found_symbols: outcome.found_symbols,
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        elapsed_ms,
    })
}
