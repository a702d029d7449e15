//! Configuration system for par-notes.
//!
//! This crate provides configuration loading, saving, and default values
//! for the note browser. It includes:
//!
//! - The `Config` struct and its YAML persistence
//! - Shared enums used by both the config file and the core (`SortMode`, `LogLevel`)
//! - Typed `ConfigError` variants for callers that want to match on failures

pub mod config;
pub mod defaults;
pub mod error;
mod types;

// Re-export main types for convenience
pub use config::Config;
pub use error::ConfigError;
pub use types::{LogLevel, SortMode};
