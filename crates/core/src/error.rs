//! Error taxonomy for a symbol resolution run.
//!
//! Every variant is fatal for the run; nothing here is retried internally. Process
//! related variants always carry the literal command line so an operator can reproduce
//! the invocation, and the output-bearing ones carry everything captured from both
//! streams.

use std::path::PathBuf;

use thiserror::Error;

/// Steps printed when the downloader sub-tool is not registered in the tool manifest.
pub const TOOL_INSTALL_STEPS: &str = "To install, run in the root of the repository\n    \
dotnet new tool-manifest\n    dotnet tool install dotnet-symbol";

#[derive(Debug, Error)]
pub enum SymbolError {
    /// A module could not be opened or its PE headers could not be parsed.
    #[error("Failed to read module {path}: {reason}")]
    BinaryRead { path: PathBuf, reason: String },

    /// The module directory could not be enumerated.
    #[error("Failed to walk directory {root}: {reason}")]
    Walk { root: PathBuf, reason: String },

    /// The cache directory could not be created.
    #[error("Failed to create cache directory {path}: {source}")]
    CacheDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings could not be loaded or were invalid.
    #[error("Invalid settings: {0}")]
    Config(String),

    /// The external program could not be started at all.
    #[error("Failed to start process. Command line: {command_line}. Reason: {source}")]
    Spawn {
        command_line: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Process timed out. Command line: {command_line}.\nOutput: {output}\nError: {error}")]
    ProcessTimeout { command_line: String, output: String, error: String },

    #[error(
        "The dotnet tool `dotnet-symbol` was not found.\nCommand line: {command_line}.\n{}",
        TOOL_INSTALL_STEPS
    )]
    ToolMissing { command_line: String },

    #[error(
        "Could not execute process ({status}). Command line: {command_line}.\nOutput: {output}\nError: {error}"
    )]
    ProcessExecution { command_line: String, status: String, output: String, error: String },

    #[error("Process cancelled. Command line: {command_line}.\nOutput: {output}\nError: {error}")]
    Cancelled { command_line: String, output: String, error: String },
}

impl SymbolError {
    pub(crate) fn binary_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SymbolError::BinaryRead { path: path.into(), reason: reason.to_string() }
    }
}

/// Convenience result type for pipeline operations.
pub type SymbolResult<T> = Result<T, SymbolError>;
