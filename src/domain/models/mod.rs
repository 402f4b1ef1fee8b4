//! Domain data types.

pub mod config;
pub mod conversation;
pub mod message;
pub mod operation;

pub use config::{
    Config, ExportConfig, ExtractionConfig, LoggingConfig, PollerConfig, RenderConfig,
};
pub use conversation::{ConversationDocument, RenderedBlock, Role, SectionLabels};
pub use message::{Notification, Request, RequestEnvelope, Response};
pub use operation::{Intent, OperationRequest, OperationResult, ProgressEvent};
