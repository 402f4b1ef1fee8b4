//! gemini-md-export - Gemini conversation exporter
//!
//! Forces a lazily paginated conversation page to materialize its full
//! history, extracts it into a Markdown document and delivers it to a file
//! or the clipboard.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the port traits
//! - **Service Layer** (`services`): convergence poller, extractor, orchestrator, message router
//! - **Infrastructure Layer** (`infrastructure`): page host, renderer, sinks, config, logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gemini_md_export::{Config, ExportService, OperationRequest};
//!
//! # async fn run(service: Arc<ExportService>) {
//! let result = service.run(OperationRequest::export(true)).await;
//! println!("{result:?}");
//! # }
//! ```

#![deny(missing_docs)]

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DeliveryError, ExportError, HostError, RenderError};
pub use domain::models::{
    Config, ConversationDocument, Intent, OperationRequest, OperationResult, ProgressEvent,
};
pub use domain::ports::{ClipboardSink, FileSink, HostDocument, Renderer};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConversationExtractor, ConvergencePoller, ExportService, MessageRouter};
