//! Wire types for the UI messaging channel.
//!
//! Requests arrive as `{"action": ..., "fullLoad": ...}` objects, responses
//! carry an [`OperationResult`] flattened into the legacy
//! `{success, turnCount, filename, error}` shape, and progress travels as
//! out-of-band `{"type": "progress", ...}` notifications.

use serde::{Deserialize, Serialize};

use super::operation::{OperationRequest, OperationResult, ProgressEvent};

/// A request from the UI surface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Request {
    /// Save the conversation as a file.
    #[serde(alias = "download_markdown")]
    Export {
        /// Absent or null means the router default
        #[serde(default, rename = "fullLoad")]
        full_load: Option<bool>,
    },
    /// Copy the conversation to the clipboard.
    #[serde(alias = "copy_markdown")]
    Copy {
        /// Absent or null means the router default
        #[serde(default, rename = "fullLoad")]
        full_load: Option<bool>,
    },
    /// Abort the operation in flight.
    Cancel,
    /// Liveness check; answered with the crate version.
    Ping,
}

impl Request {
    /// The operation this request starts, if any.
    ///
    /// Full load is on unless the caller explicitly sent `false`.
    pub fn operation(&self) -> Option<OperationRequest> {
        self.operation_or(true)
    }

    /// Like [`Request::operation`], with a different default for an absent
    /// or null `fullLoad`.
    pub fn operation_or(&self, default_full_load: bool) -> Option<OperationRequest> {
        match self {
            Self::Export { full_load } => Some(OperationRequest::export(
                full_load.unwrap_or(default_full_load),
            )),
            Self::Copy { full_load } => Some(OperationRequest::copy(
                full_load.unwrap_or(default_full_load),
            )),
            Self::Cancel | Self::Ping => None,
        }
    }
}

/// A request plus an optional caller-chosen correlation id.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    /// Echoed back on the response
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// The request itself, flattened alongside `id`
    #[serde(flatten)]
    pub request: Request,
}

/// Answer to exactly one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Correlation id from the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Whether the request succeeded
    pub success: bool,
    /// Segments exported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_count: Option<usize>,
    /// Saved file name, for exports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Failure reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Crate version, for `ping`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Response {
    /// Bare acknowledgement.
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    /// Answer to `ping`.
    pub fn pong(version: impl Into<String>) -> Self {
        Self {
            success: true,
            version: Some(version.into()),
            ..Self::default()
        }
    }

    /// Failed request with a reason.
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Attach the correlation id of the request being answered.
    #[must_use]
    pub fn with_id(mut self, id: Option<serde_json::Value>) -> Self {
        self.id = id;
        self
    }
}

impl From<OperationResult> for Response {
    fn from(result: OperationResult) -> Self {
        match result {
            OperationResult::Success {
                segment_count,
                artifact_name,
            } => Self {
                success: true,
                turn_count: Some(segment_count),
                filename: artifact_name,
                ..Self::default()
            },
            OperationResult::Cancelled => Self::error("cancelled"),
            OperationResult::Failure { reason } => Self::error(reason),
        }
    }
}

/// Out-of-band notification broadcast to listening surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Operation progress.
    Progress(ProgressEvent),
}
