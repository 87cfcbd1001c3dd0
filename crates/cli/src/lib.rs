//! Command implementations for the `symfetch` binary.
//!
//! Kept in a library so integration tests can call commands directly.

pub mod commands;

pub use commands::{canonicalize_or_current, list_to_indented};
