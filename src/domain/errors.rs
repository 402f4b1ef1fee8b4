//! Domain errors for the export pipeline.

use thiserror::Error;

/// Errors that can end an export or copy operation.
///
/// None of these escape the orchestrator: each one is folded into an
/// [`OperationResult`](crate::domain::models::OperationResult).
#[derive(Debug, Error)]
pub enum ExportError {
    /// Extraction found zero segments.
    #[error("No conversation content found")]
    NoContent,

    /// Cancellation was observed by the poller.
    #[error("cancelled")]
    Cancelled,

    /// Another operation holds the single-flight slot.
    #[error("Another export is already in progress")]
    Busy,

    /// The poller ran out of attempts and strict loading is on.
    #[error("Conversation only partially loaded after {attempts} attempts ({segments} segments)")]
    PartialLoad {
        /// Attempts spent before giving up
        attempts: u32,
        /// Segments materialized at that point
        segments: usize,
    },

    /// Renderer failure.
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    /// Sink failure.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Host document failure.
    #[error("Host document error: {0}")]
    Host(#[from] HostError),
}

/// The renderer could not convert a markup fragment.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct RenderError {
    /// Human-readable cause reported by the renderer
    pub message: String,
}

impl RenderError {
    /// Create a render error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A delivery sink rejected the write.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Writing the artifact failed.
    #[error("I/O error writing {path}: {source}")]
    Io {
        /// Target that could not be written
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// No clipboard program accepted the content.
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),
}

/// The host document could not be read.
#[derive(Debug, Error)]
pub enum HostError {
    /// A configured CSS selector does not parse.
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// Selector as configured
        selector: String,
        /// Parser message
        reason: String,
    },

    /// The page could not be read.
    #[error("Document unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for pipeline operations.
pub type ExportResult<T> = Result<T, ExportError>;
