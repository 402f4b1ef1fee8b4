//! Operation orchestrator.
//!
//! Sequences poller, extractor and delivery for a single export or copy,
//! owns the single-flight flag and the cancellation token, and folds every
//! outcome into an [`OperationResult`].

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Local, NaiveDate};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{ExportError, ExportResult};
use crate::domain::models::{
    Config, Intent, OperationRequest, OperationResult, ProgressEvent,
};
use crate::domain::ports::{ClipboardSink, FileSink, HostDocument, RenderOptions, Renderer};
use crate::services::convergence_poller::{ConvergencePoller, LOAD_DONE_PERCENT, LOAD_START_PERCENT};
use crate::services::extractor::ConversationExtractor;
use crate::services::filename::artifact_name;
use crate::services::progress::{ProgressReporter, PROGRESS_CHANNEL_CAPACITY};

/// Source of "today" for artifact names.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Clears the in-flight flag however the operation ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

struct Completed {
    segment_count: usize,
    artifact_name: Option<String>,
}

/// Runs export and copy operations against one host document.
pub struct ExportService {
    host: Arc<dyn HostDocument>,
    renderer: Arc<dyn Renderer>,
    files: Arc<dyn FileSink>,
    clipboard: Arc<dyn ClipboardSink>,
    config: Config,
    clock: Clock,
    progress: broadcast::Sender<ProgressEvent>,
    in_progress: AtomicBool,
    cancel: Mutex<CancellationToken>,
}

impl ExportService {
    /// Wire the service to its adapters. Artifact dates come from the local clock.
    pub fn new(
        host: Arc<dyn HostDocument>,
        renderer: Arc<dyn Renderer>,
        files: Arc<dyn FileSink>,
        clipboard: Arc<dyn ClipboardSink>,
        config: Config,
    ) -> Self {
        let (progress, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            host,
            renderer,
            files,
            clipboard,
            config,
            clock: Arc::new(|| Local::now().date_naive()),
            progress,
            in_progress: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Override the date used in artifact names.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Listen to progress of every operation this service runs.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.progress.subscribe()
    }

    /// Whether an operation currently holds the single-flight slot.
    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Request cancellation of the running operation.
    ///
    /// Takes effect at the poller's next iteration boundary; extraction and
    /// delivery, once started, run to completion.
    pub fn cancel(&self) {
        info!("cancel requested");
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Run one operation to a terminal result.
    ///
    /// A second call while one is in flight is rejected, not queued.
    #[instrument(
        skip(self),
        fields(operation_id = %Uuid::new_v4(), intent = ?request.intent, full_load = request.full_load)
    )]
    pub async fn run(&self, request: OperationRequest) -> OperationResult {
        let Some(_guard) = InFlightGuard::acquire(&self.in_progress) else {
            warn!("rejecting operation: another one is in flight");
            return OperationResult::failure(ExportError::Busy.to_string());
        };

        let token = self.fresh_token();
        let progress = ProgressReporter::new(self.progress.clone());

        match self.execute(request, &token, &progress).await {
            Ok(done) => {
                info!(
                    segments = done.segment_count,
                    artifact = ?done.artifact_name,
                    "operation succeeded"
                );
                OperationResult::Success {
                    segment_count: done.segment_count,
                    artifact_name: done.artifact_name,
                }
            }
            Err(ExportError::Cancelled) => {
                info!("operation cancelled");
                OperationResult::Cancelled
            }
            Err(err) => {
                warn!(error = %err, "operation failed");
                OperationResult::failure(err.to_string())
            }
        }
    }

    fn fresh_token(&self) -> CancellationToken {
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = CancellationToken::new();
        slot.clone()
    }

    async fn execute(
        &self,
        request: OperationRequest,
        token: &CancellationToken,
        progress: &ProgressReporter,
    ) -> ExportResult<Completed> {
        if request.full_load {
            progress.emit(LOAD_START_PERCENT, "Starting full conversation load...");
            let poller = ConvergencePoller::new(
                self.host.as_ref(),
                &self.config.poller,
                &self.config.extraction.segment_selector,
            );

            let Some(loaded) = poller.run(token, progress).await? else {
                return Err(ExportError::Cancelled);
            };
            if token.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            if !loaded.converged && self.config.poller.fail_on_exhaustion {
                return Err(ExportError::PartialLoad {
                    attempts: loaded.attempts,
                    segments: loaded.segment_count,
                });
            }
        }

        progress.emit(LOAD_DONE_PERCENT, request.intent.finishing_message());

        let options = RenderOptions {
            table_support: self.config.render.table_support,
        };
        let document = ConversationExtractor::new(
            &self.config.extraction,
            self.renderer.as_ref(),
            options,
        )
        .extract_from(self.host.as_ref())?;

        let artifact_name = match request.intent {
            Intent::Export => {
                let name = artifact_name(document.title(), (self.clock)(), &self.config.export);
                let saved = self
                    .files
                    .save_as_file(document.content(), &name, &self.config.export.mime_type)
                    .await?;
                info!(path = %saved.display(), "file saved");
                Some(saved_name(&saved).unwrap_or(name))
            }
            Intent::Copy => {
                self.clipboard.write_clipboard(document.content()).await?;
                info!(bytes = document.content().len(), "copied to clipboard");
                None
            }
        };

        progress.emit(100, request.intent.done_message());
        Ok(Completed {
            segment_count: document.segment_count(),
            artifact_name,
        })
    }
}

fn saved_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}
