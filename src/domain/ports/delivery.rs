//! Delivery ports - where a finished document goes.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::domain::errors::DeliveryError;

/// Saves content as a downloadable file.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Write `content` under `filename`, returning where it landed.
    async fn save_as_file(
        &self,
        content: &str,
        filename: &str,
        mime_type: &str,
    ) -> Result<PathBuf, DeliveryError>;
}

/// Places content on the clipboard.
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    /// Replace the clipboard contents.
    async fn write_clipboard(&self, content: &str) -> Result<(), DeliveryError>;
}
