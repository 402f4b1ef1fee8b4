//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - Programmatic defaults
//! - Project and local YAML files (or one explicit file)
//! - `GEMINI_MD_EXPORT_*` environment overrides
//! - Validation after extraction

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
