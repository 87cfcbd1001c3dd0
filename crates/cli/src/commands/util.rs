use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use symfetch_core::config::FetchSettings;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Canonicalize fails for paths that do not exist yet; join with cwd instead.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Load settings from `config` (if any) and apply command-line overrides on top.
pub fn load_settings(
    config: Option<&str>,
    cache_dir: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<FetchSettings> {
    let mut settings = match config {
        Some(path) => FetchSettings::load(Path::new(path))
            .with_context(|| format!("Failed to load settings from {path}"))?,
        None => FetchSettings::default(),
    };
    if let Some(dir) = cache_dir {
        settings.cache_directory = Some(PathBuf::from(dir));
    }
    if let Some(secs) = timeout_secs {
        settings.timeout_secs = secs;
    }
    Ok(settings)
}

/// Render a list one entry per line, tab-indented, after a leading newline.
pub fn list_to_indented<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: std::fmt::Display,
{
    items.into_iter().map(|item| format!("\n\t{item}")).collect()
}

/// Print a labelled list, or nothing when it is empty.
pub fn print_list<I, S>(label: &str, items: I)
where
    I: IntoIterator<Item = S>,
    S: std::fmt::Display,
{
    let body = list_to_indented(items);
    if !body.is_empty() {
        println!("{label}:{body}");
    }
}
