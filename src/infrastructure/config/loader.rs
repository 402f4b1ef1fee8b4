//! Layered configuration loading and validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project configuration.
pub const CONFIG_DIR: &str = ".gemini-md-export";

/// Prefix of environment overrides, e.g. `GEMINI_MD_EXPORT_POLLER__MAX_ATTEMPTS`.
pub const ENV_PREFIX: &str = "GEMINI_MD_EXPORT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `poller.max_attempts` is zero.
    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    /// `poller.no_change_threshold` is zero.
    #[error("Invalid no_change_threshold: {0}. Must be at least 1")]
    InvalidNoChangeThreshold(u32),

    /// `poller.progress_cap` is above 100.
    #[error("Invalid progress_cap: {0}. Must be at most 100")]
    InvalidProgressCap(u8),

    /// Unknown `logging.level`.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown `logging.format`.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// Unknown `logging.rotation`.
    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    /// A required selector is blank; carries the setting name.
    #[error("Selector `{0}` cannot be empty")]
    EmptySelector(&'static str),

    /// Catch-all for other invalid combinations.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .gemini-md-export/config.yaml (project config)
    /// 3. .gemini-md-export/local.yaml (project local overrides, optional)
    /// 4. Environment variables (GEMINI_MD_EXPORT_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let poller = &config.poller;
        if poller.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(poller.max_attempts));
        }
        if poller.no_change_threshold == 0 {
            return Err(ConfigError::InvalidNoChangeThreshold(
                poller.no_change_threshold,
            ));
        }
        if poller.progress_cap > 100 {
            return Err(ConfigError::InvalidProgressCap(poller.progress_cap));
        }
        if poller.container_selectors.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptySelector("poller.container_selectors"));
        }

        let extraction = &config.extraction;
        let required = [
            ("extraction.segment_selector", &extraction.segment_selector),
            ("extraction.query_selector", &extraction.query_selector),
            ("extraction.response_selector", &extraction.response_selector),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptySelector(name));
            }
        }
        if extraction.title_selectors.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptySelector("extraction.title_selectors"));
        }

        if config.export.extension.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "export.extension cannot be empty".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
