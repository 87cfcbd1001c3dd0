//! symfetch-core
//!
//! Core library for resolving debug symbols of published .NET modules.
//!
//! A run classifies every module under a directory (sibling `.pdb`, embedded portable
//! PDB, or neither), hands the remainder to `dotnet-symbol` in one batched invocation,
//! and reconciles the tool's report into found and missing symbols.
//!
//! All substantive logic lives here so it is testable without a frontend; the CLI is a
//! thin adapter over [`pipeline::run_pipeline`].

pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod process;

pub use error::{SymbolError, SymbolResult};

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
