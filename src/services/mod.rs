//! Service layer: the load-and-extract pipeline and its orchestration.

pub mod convergence_poller;
pub mod export_service;
pub mod extractor;
pub mod filename;
pub mod locator;
pub mod message_router;
pub mod progress;

pub use convergence_poller::{
    ConvergencePoller, ConvergenceRules, ConvergenceState, LoadOutcome, Measurement, PollAction,
    Sample,
};
pub use export_service::{Clock, ExportService};
pub use extractor::ConversationExtractor;
pub use filename::{artifact_name, sanitize_title};
pub use message_router::{MessageRouter, PROTOCOL_VERSION};
pub use progress::ProgressReporter;
