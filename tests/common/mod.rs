//! Common test utilities for integration tests
//!
//! Provides page fixtures, recording sinks and service wiring shared across
//! the integration test files.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use gemini_md_export::domain::models::Config;
use gemini_md_export::domain::ports::{
    ClipboardSink, FileSink, HostDocument, RenderOptions, Renderer,
};
use gemini_md_export::infrastructure::host::SnapshotPage;
use gemini_md_export::infrastructure::render::MarkdownRenderer;
use gemini_md_export::services::ExportService;
use gemini_md_export::{DeliveryError, RenderError};

pub const SEGMENTS: &str = "user-query, model-response";

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A saved conversation page with a scrollable history container.
///
/// Each turn is `(query text, response markup)`.
pub fn conversation_page(title: Option<&str>, turns: &[(&str, &str)]) -> String {
    let mut history = String::new();
    for (query, response) in turns {
        history.push_str(&format!(
            "<user-query><div class=\"query-content\"><p class=\"query-text\">{query}</p></div></user-query>\n\
             <model-response><div class=\"response-content\"><div class=\"markdown\">{response}</div></div></model-response>\n"
        ));
    }
    let title = title
        .map(|t| format!("<div class=\"conversation selected\"><span class=\"conversation-title\">{t}</span></div>"))
        .unwrap_or_default();
    format!(
        "<!DOCTYPE html><html><head><title>Gemini</title></head><body>\
         <nav>{title}</nav>\
         <main><div class=\"chat-history\" style=\"overflow-y: auto\">{history}</div></main>\
         </body></html>"
    )
}

/// `count` numbered turns, oldest first.
pub fn numbered_turns(count: usize) -> Vec<(String, String)> {
    (0..count)
        .map(|i| (format!("question {i}"), format!("<p>answer {i}</p>")))
        .collect()
}

pub fn numbered_page(count: usize) -> String {
    let turns = numbered_turns(count);
    let borrowed: Vec<(&str, &str)> = turns
        .iter()
        .map(|(q, r)| (q.as_str(), r.as_str()))
        .collect();
    conversation_page(Some("Numbered"), &borrowed)
}

/// Configuration with zero poller delays.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.poller.settle_delay_ms = 0;
    config.poller.retry_delay_ms = 0;
    config
}

pub fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 5).expect("valid date")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub content: String,
    pub filename: String,
    pub mime_type: String,
}

/// File sink that keeps everything in memory.
#[derive(Default)]
pub struct RecordingFileSink {
    saved: Mutex<Vec<SavedFile>>,
}

impl RecordingFileSink {
    pub fn saved(&self) -> Vec<SavedFile> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSink for RecordingFileSink {
    async fn save_as_file(
        &self,
        content: &str,
        filename: &str,
        mime_type: &str,
    ) -> Result<PathBuf, DeliveryError> {
        self.saved.lock().unwrap().push(SavedFile {
            content: content.to_string(),
            filename: filename.to_string(),
            mime_type: mime_type.to_string(),
        });
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

/// Clipboard that keeps every write in memory.
#[derive(Default)]
pub struct RecordingClipboard {
    writes: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClipboardSink for RecordingClipboard {
    async fn write_clipboard(&self, content: &str) -> Result<(), DeliveryError> {
        self.writes.lock().unwrap().push(content.to_string());
        Ok(())
    }
}

/// Clipboard that always refuses.
pub struct DeniedClipboard;

#[async_trait]
impl ClipboardSink for DeniedClipboard {
    async fn write_clipboard(&self, _content: &str) -> Result<(), DeliveryError> {
        Err(DeliveryError::ClipboardUnavailable("permission denied".to_string()))
    }
}

/// Renderer that rejects every fragment.
pub struct BrokenRenderer;

impl Renderer for BrokenRenderer {
    fn render(&self, _fragment: &str, _options: &RenderOptions) -> Result<String, RenderError> {
        Err(RenderError::new("malformed fragment"))
    }
}

/// A service over one host plus handles on its sinks.
pub struct Harness {
    pub service: Arc<ExportService>,
    pub files: Arc<RecordingFileSink>,
    pub clipboard: Arc<RecordingClipboard>,
}

pub fn harness(host: Arc<dyn HostDocument>, config: Config) -> Harness {
    let files = Arc::new(RecordingFileSink::default());
    let clipboard = Arc::new(RecordingClipboard::default());
    let service = ExportService::new(
        host,
        Arc::new(MarkdownRenderer::default()),
        files.clone(),
        clipboard.clone(),
        config,
    )
    .with_clock(Arc::new(fixed_date));

    Harness {
        service: Arc::new(service),
        files,
        clipboard,
    }
}

pub fn snapshot(html: &str) -> Arc<SnapshotPage> {
    Arc::new(SnapshotPage::from_html(html, SEGMENTS).expect("page indexes"))
}

pub fn paginated(html: &str, page_size: usize) -> Arc<SnapshotPage> {
    Arc::new(
        SnapshotPage::from_html(html, SEGMENTS)
            .expect("page indexes")
            .with_page_size(page_size),
    )
}
