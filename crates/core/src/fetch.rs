//! Symbol download via `dotnet tool run dotnet-symbol`.
//!
//! All modules go to the downloader in a single invocation; its textual report is then
//! parsed into missing names and written paths, and reconciled.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SymbolResult;
use crate::process::CommandRunner;

/// Program used to host the downloader when nothing else is configured.
pub const DEFAULT_DOTNET: &str = "dotnet";

/// Name of the downloader tool in the local tool manifest.
pub const DOWNLOADER_TOOL: &str = "dotnet-symbol";

/// Symbol stores queried, in order, during the same pass.
pub const SYMBOL_SERVERS: [&str; 2] =
    ["https://symbols.nuget.org/download/symbols", "https://msdl.microsoft.com/download/symbols/"];

/// Report prefix for a symbol no server could provide.
pub const NOT_FOUND_PREFIX: &str = "ERROR: Not Found: ";

/// Report prefix for a symbol file written to disk.
pub const WRITING_PREFIX: &str = "Writing: ";

const REASON_SEPARATOR: &str = " - ";

/// Parsed downloader output, before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchReport {
    /// Bare file names reported missing, deduplicated, in report order.
    pub missing_names: Vec<String>,
    /// Full paths reported written, in report order.
    pub found_paths: Vec<String>,
}

impl FetchReport {
    /// Parse every line of a downloader report.
    pub fn parse<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = FetchReport::default();
        for line in lines {
            report.process_line(line.as_ref());
        }
        report
    }

    /// Dispatch one report line on its prefix; anything unrecognised is ignored.
    pub fn process_line(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix(NOT_FOUND_PREFIX) {
            let missing = rest.find(REASON_SEPARATOR).map_or(rest, |idx| &rest[..idx]);
            if !self.missing_names.iter().any(|m| m == missing) {
                self.missing_names.push(missing.to_string());
            }
        } else if let Some(rest) = line.strip_prefix(WRITING_PREFIX) {
            self.found_paths.push(rest.to_string());
        }
    }
}

/// Final partition returned by a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub missing_symbols: Vec<String>,
    pub found_symbols: Vec<String>,
}

/// Drop every missing name that a written path accounts for.
///
/// Matching is by bare file name only, since "not found" lines never carry a directory.
/// Two modules sharing a file name in different directories are therefore
/// indistinguishable here.
pub fn reconcile(report: FetchReport) -> FetchOutcome {
    let FetchReport { mut missing_names, found_paths } = report;
    for found in &found_paths {
        let name = bare_name(found);
        if let Some(idx) = missing_names.iter().position(|m| m == name) {
            missing_names.remove(idx);
        }
    }
    FetchOutcome { missing_symbols: missing_names, found_symbols: found_paths }
}

/// File name component of a reported path, accepting either separator.
fn bare_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Build the downloader arguments (everything after the program name).
pub fn build_arguments(cache_directory: Option<&Path>, modules: &[PathBuf]) -> Vec<String> {
    let mut args = vec!["tool".to_string(), "run".to_string(), DOWNLOADER_TOOL.to_string()];
    for server in SYMBOL_SERVERS {
        args.push("--server-path".to_string());
        args.push(server.to_string());
    }
    if let Some(dir) = cache_directory {
        args.push("--cache-directory".to_string());
        args.push(dir.display().to_string());
    }
    args.extend(modules.iter().map(|m| m.display().to_string()));
    args
}

/// Client for the external downloader.
pub struct SymbolDownloader<'a> {
    pub runner: &'a dyn CommandRunner,
    /// Program hosting the tool, usually `dotnet`.
    pub program: String,
}

impl<'a> SymbolDownloader<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner, program: DEFAULT_DOTNET.to_string() }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Download symbols for `modules` and return the reconciled outcome.
    ///
    /// An empty module list short-circuits without spawning anything.
    pub fn run(
        &self,
        cache_directory: Option<&Path>,
        modules: &[PathBuf],
    ) -> SymbolResult<FetchOutcome> {
        if modules.is_empty() {
            return Ok(FetchOutcome::default());
        }
        let args = build_arguments(cache_directory, modules);
        let lines = self.runner.run(&self.program, &args)?;
        let report = FetchReport::parse(&lines);
        tracing::debug!(
            missing = report.missing_names.len(),
            written = report.found_paths.len(),
            "parsed downloader report"
        );
        Ok(reconcile(report))
    }
}
