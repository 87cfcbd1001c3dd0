//! Run settings and their resolution.
//!
//! Settings come from an optional JSON or YAML file; the cache directory falls back to
//! `SYMFETCH_CACHE_DIRECTORY` and everything is resolved once into a [`PipelineConfig`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SymbolError, SymbolResult};
use crate::fetch::DEFAULT_DOTNET;
use crate::process::{CancellationToken, DEFAULT_TIMEOUT};

/// Environment variable consulted when no cache directory is configured explicitly.
pub const CACHE_DIRECTORY_ENV: &str = "SYMFETCH_CACHE_DIRECTORY";

/// Environment variable overriding the `dotnet` executable.
pub const DOTNET_ENV: &str = "SYMFETCH_DOTNET";

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

/// Settings loaded from an optional JSON or YAML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Where the downloader caches symbol files between runs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_directory: Option<PathBuf>,
    /// Upper bound on the downloader's run time.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Explicit path to the `dotnet` executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dotnet_path: Option<PathBuf>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self { cache_directory: None, timeout_secs: default_timeout_secs(), dotnet_path: None }
    }
}

impl FetchSettings {
    /// Load settings, choosing the format from the file extension.
    pub fn load(path: &Path) -> SymbolResult<Self> {
        let body = fs::read_to_string(path).map_err(|e| {
            SymbolError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        match ext {
            "json" => serde_json::from_str(&body).map_err(|e| {
                SymbolError::Config(format!("failed to parse {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&body).map_err(|e| {
                SymbolError::Config(format!("failed to parse {}: {e}", path.display()))
            }),
            other => Err(SymbolError::Config(format!(
                "unsupported settings format '{other}' for {} (expected json, yaml or yml)",
                path.display()
            ))),
        }
    }
}

/// Pick the cache directory: explicit value first, then the environment, else none.
///
/// An explicit value is made absolute against the current directory; the environment
/// value is passed through untouched.
pub fn resolve_cache_directory(
    explicit: Option<&Path>,
    environment: Option<PathBuf>,
) -> Option<PathBuf> {
    match explicit {
        Some(dir) => Some(absolutize(dir)),
        None => environment.filter(|p| !p.as_os_str().is_empty()),
    }
}

/// Pick the `dotnet` program: explicit value, then `SYMFETCH_DOTNET`, then `dotnet`.
pub fn resolve_dotnet(explicit: Option<&Path>) -> String {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(DOTNET_ENV).map(PathBuf::from))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| DEFAULT_DOTNET.to_string())
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Everything a pipeline run needs, resolved once up front.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned for modules.
    pub root: PathBuf,
    pub cache_directory: Option<PathBuf>,
    pub timeout: Duration,
    /// Program hosting the downloader.
    pub dotnet: String,
    pub cancellation: Option<CancellationToken>,
}

impl PipelineConfig {
    /// Build a config from settings, reading the cache-directory environment fallback.
    pub fn from_settings(root: impl AsRef<Path>, settings: &FetchSettings) -> Self {
        let environment = env::var_os(CACHE_DIRECTORY_ENV).map(PathBuf::from);
        Self {
            root: absolutize(root.as_ref()),
            cache_directory: resolve_cache_directory(
                settings.cache_directory.as_deref(),
                environment,
            ),
            timeout: Duration::from_secs(settings.timeout_secs),
            dotnet: resolve_dotnet(settings.dotnet_path.as_deref()),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}
