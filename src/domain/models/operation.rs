//! Operation requests, outcomes and progress events.

use serde::{Deserialize, Serialize};

/// What the caller wants done with the extracted conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Save as a downloadable file
    Export,
    /// Place on the clipboard
    Copy,
}

impl Intent {
    /// Message shown while output is being produced.
    pub const fn finishing_message(self) -> &'static str {
        match self {
            Self::Export => "Generating file...",
            Self::Copy => "Copying to clipboard...",
        }
    }

    /// Message shown once the sink accepted the content.
    pub const fn done_message(self) -> &'static str {
        match self {
            Self::Export => "Download complete!",
            Self::Copy => "Copy complete!",
        }
    }
}

/// A single export or copy invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationRequest {
    /// Where the output goes
    pub intent: Intent,
    /// Force the page to materialize its full history before extracting
    pub full_load: bool,
}

impl OperationRequest {
    /// Export request.
    pub const fn export(full_load: bool) -> Self {
        Self {
            intent: Intent::Export,
            full_load,
        }
    }

    /// Copy request.
    pub const fn copy(full_load: bool) -> Self {
        Self {
            intent: Intent::Copy,
            full_load,
        }
    }
}

/// Terminal outcome of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationResult {
    /// Output was delivered.
    Success {
        /// Segments enumerated
        segment_count: usize,
        /// File name, when a file was written
        #[serde(skip_serializing_if = "Option::is_none")]
        artifact_name: Option<String>,
    },
    /// Cancelled before extraction.
    Cancelled,
    /// Anything else that ended the operation.
    Failure {
        /// User-facing reason
        reason: String,
    },
}

impl OperationResult {
    /// Failure with a reason.
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    /// `true` for [`OperationResult::Success`].
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One-way progress notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// 0..=100
    pub percent: u8,
    /// Status line
    pub message: String,
}

impl ProgressEvent {
    /// Create an event; `percent` is clamped to 100.
    pub fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            message: message.into(),
        }
    }
}
