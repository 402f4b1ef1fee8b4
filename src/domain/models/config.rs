//! Configuration schema with defaults for every section.

use serde::{Deserialize, Serialize};

/// Main configuration structure for the exporter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Convergence poller tuning
    #[serde(default)]
    pub poller: PollerConfig,

    /// Where conversation content lives in the page
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Renderer options
    #[serde(default)]
    pub render: RenderConfig,

    /// Artifact naming and file output
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Convergence poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollerConfig {
    /// Hard cap on rewind/wait/measure cycles
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait after each rewind for the host to fetch and render
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Extra wait after a cycle that observed no growth
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Consecutive no-growth cycles that count as convergence
    #[serde(default = "default_no_change_threshold")]
    pub no_change_threshold: u32,

    /// Estimated percent gained per attempt
    #[serde(default = "default_progress_per_attempt")]
    pub progress_per_attempt: u8,

    /// Upper bound of the loading-phase percent estimate
    #[serde(default = "default_progress_cap")]
    pub progress_cap: u8,

    /// Treat attempt exhaustion as a failure instead of extracting what loaded
    #[serde(default)]
    pub fail_on_exhaustion: bool,

    /// Structural fallbacks for the scroll container, in priority order
    #[serde(default = "default_container_selectors")]
    pub container_selectors: Vec<String>,
}

const fn default_max_attempts() -> u32 {
    200
}

const fn default_settle_delay_ms() -> u64 {
    500
}

const fn default_retry_delay_ms() -> u64 {
    300
}

const fn default_no_change_threshold() -> u32 {
    5
}

const fn default_progress_per_attempt() -> u8 {
    2
}

const fn default_progress_cap() -> u8 {
    90
}

fn default_container_selectors() -> Vec<String> {
    [
        "infinite-scroller",
        ".infinite-scroller",
        "[class*=\"conversation\"]",
        "[class*=\"chat-history\"]",
        "[class*=\"message-list\"]",
        "[role=\"main\"]",
        "main",
        ".conversation-container",
        ".chat-container",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            settle_delay_ms: default_settle_delay_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            no_change_threshold: default_no_change_threshold(),
            progress_per_attempt: default_progress_per_attempt(),
            progress_cap: default_progress_cap(),
            fail_on_exhaustion: false,
            container_selectors: default_container_selectors(),
        }
    }
}

/// Structural locations of conversation content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExtractionConfig {
    /// Selector enumerating every conversation segment in document order
    #[serde(default = "default_segment_selector")]
    pub segment_selector: String,

    /// Plain-text node inside a query segment
    #[serde(default = "default_query_selector")]
    pub query_selector: String,

    /// Rich-content node inside a response segment
    #[serde(default = "default_response_selector")]
    pub response_selector: String,

    /// Title locations, first non-empty match wins
    #[serde(default = "default_title_selectors")]
    pub title_selectors: Vec<String>,

    /// Title used when no location matches
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Section heading for query blocks
    #[serde(default = "default_query_label")]
    pub query_label: String,

    /// Section heading for response blocks
    #[serde(default = "default_response_label")]
    pub response_label: String,
}

fn default_segment_selector() -> String {
    "user-query, model-response".to_string()
}

fn default_query_selector() -> String {
    ".query-text".to_string()
}

fn default_response_selector() -> String {
    ".markdown".to_string()
}

fn default_title_selectors() -> Vec<String> {
    [
        ".conversation.selected .conversation-title",
        ".conversation-title.gds-label-l",
        "[data-test-id=\"conversation-title\"]",
        "h1.title",
        ".chat-title",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_title() -> String {
    "Gemini Conversation".to_string()
}

fn default_query_label() -> String {
    "User".to_string()
}

fn default_response_label() -> String {
    "Gemini".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            segment_selector: default_segment_selector(),
            query_selector: default_query_selector(),
            response_selector: default_response_selector(),
            title_selectors: default_title_selectors(),
            default_title: default_title(),
            query_label: default_query_label(),
            response_label: default_response_label(),
        }
    }
}

/// Renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RenderConfig {
    /// Render tables as GFM pipe tables instead of flattened rows
    #[serde(default = "default_true")]
    pub table_support: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            table_support: true,
        }
    }
}

/// Artifact naming and output location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExportConfig {
    /// Leading component of every artifact name
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// Title component used when the sanitized title is blank
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,

    /// Artifact extension without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// MIME type handed to the file sink
    #[serde(default = "default_mime_type")]
    pub mime_type: String,

    /// Directory exported files are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_filename_prefix() -> String {
    "Gemini".to_string()
}

fn default_fallback_title() -> String {
    "gemini-chat".to_string()
}

fn default_extension() -> String {
    "md".to_string()
}

fn default_mime_type() -> String {
    "text/markdown;charset=utf-8".to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename_prefix: default_filename_prefix(),
            fallback_title: default_fallback_title(),
            extension: default_extension(),
            mime_type: default_mime_type(),
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
