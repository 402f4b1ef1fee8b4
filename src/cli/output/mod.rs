//! Output formatting utilities for the CLI.

pub mod progress;

use serde::Serialize;

use crate::domain::models::OperationResult;

/// A command result that can be printed for people or for scripts.
pub trait CommandOutput: Serialize {
    /// Plain text for terminal output
    fn to_human(&self) -> String;
    /// JSON document for `--json`
    fn to_json(&self) -> serde_json::Value;
}

/// Print `result` to stdout in the selected mode.
pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Outcome of an export or copy, as printed by the CLI.
#[derive(Debug, serde::Serialize)]
pub struct OperationOutput {
    /// `success`, `cancelled` or `failure`
    pub status: &'static str,
    /// Segments exported on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<usize>,
    /// Saved file name, for exports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&OperationResult> for OperationOutput {
    fn from(result: &OperationResult) -> Self {
        match result {
            OperationResult::Success {
                segment_count,
                artifact_name,
            } => Self {
                status: "success",
                segment_count: Some(*segment_count),
                artifact: artifact_name.clone(),
                error: None,
            },
            OperationResult::Cancelled => Self {
                status: "cancelled",
                segment_count: None,
                artifact: None,
                error: None,
            },
            OperationResult::Failure { reason } => Self {
                status: "failure",
                segment_count: None,
                artifact: None,
                error: Some(reason.clone()),
            },
        }
    }
}

impl CommandOutput for OperationOutput {
    fn to_human(&self) -> String {
        match (self.status, &self.artifact, &self.error) {
            ("success", Some(artifact), _) => format!(
                "Exported {} segment(s) to {artifact}",
                self.segment_count.unwrap_or_default()
            ),
            ("success", None, _) => format!(
                "Copied {} segment(s) to the clipboard",
                self.segment_count.unwrap_or_default()
            ),
            ("cancelled", _, _) => "Cancelled.".to_string(),
            (_, _, Some(error)) => format!("Failed: {error}"),
            (status, _, None) => status.to_string(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
