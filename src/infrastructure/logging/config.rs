//! Logging settings as consumed by the subscriber.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::models::LoggingConfig;

/// Resolved logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (json, pretty)
    pub format: LogFormat,

    /// Directory for log files (optional, if None logs only to stderr)
    pub log_dir: Option<PathBuf>,

    /// Log rotation policy
    pub rotation: RotationPolicy,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable.
    Pretty,
}

/// How often the log file rolls over.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file every day.
    #[default]
    Daily,
    /// New file every hour.
    Hourly,
    /// Single file, never rotated.
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from(&LoggingConfig::default())
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        let format = match config.format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
        let rotation = match config.rotation.as_str() {
            "hourly" => RotationPolicy::Hourly,
            "never" => RotationPolicy::Never,
            _ => RotationPolicy::Daily,
        };

        Self {
            level: config.level.clone(),
            format,
            log_dir: config.log_dir.as_ref().map(PathBuf::from),
            rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_domain_config() {
        let domain = LoggingConfig {
            level: "debug".to_string(),
            format: "json".to_string(),
            log_dir: Some("/var/log/gme".to_string()),
            rotation: "hourly".to_string(),
        };
        let config = LogConfig::from(&domain);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/gme")));
        assert_eq!(config.rotation, RotationPolicy::Hourly);
    }

    #[test]
    fn test_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.rotation, RotationPolicy::Daily);
        assert!(config.log_dir.is_none());
    }
}
