//! Artifact naming.

use chrono::NaiveDate;

use crate::domain::models::ExportConfig;

const INVALID_FILENAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replace every filesystem-hostile character with `_`, then trim.
///
/// Falls back to `fallback` when nothing printable is left.
pub fn sanitize_title(title: &str, fallback: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if INVALID_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `{prefix}-{title}-{YYYY-MM-DD}.{ext}`
pub fn artifact_name(title: &str, date: NaiveDate, config: &ExportConfig) -> String {
    format!(
        "{}-{}-{}.{}",
        config.filename_prefix,
        sanitize_title(title, &config.fallback_title),
        date.format("%Y-%m-%d"),
        config.extension
    )
}
