//! Core constants shared across splitroute crates.
//!
//! This crate provides:
//! - Default routing configuration values
//! - The built-in private-network table
//! - Sentinel rule names reported in match results

pub mod defaults;

pub use defaults::*;

/// Project name.
pub const PROJECT_NAME: &str = "splitroute";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
