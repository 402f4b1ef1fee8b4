//! CLI command implementations.

pub mod copy;
pub mod export;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

use crate::cli::output::progress::{create_progress_bar, ProgressBarExt};
use crate::cli::types::PageArgs;
use crate::domain::models::{Config, OperationRequest, OperationResult};
use crate::infrastructure::delivery::{DirectoryFileSink, SystemClipboard};
use crate::infrastructure::host::SnapshotPage;
use crate::infrastructure::render::MarkdownRenderer;
use crate::services::ExportService;

/// Wire the bundled adapters around one saved page.
pub async fn build_service(
    config: &Config,
    page: &PageArgs,
    output_dir: Option<&Path>,
) -> Result<Arc<ExportService>> {
    let source = tokio::fs::read_to_string(&page.page)
        .await
        .with_context(|| format!("Failed to read page {}", page.page.display()))?;

    let mut host = SnapshotPage::from_html(source, &config.extraction.segment_selector)
        .context("Failed to index page")?;
    if let Some(page_size) = page.page_size {
        host = host.with_page_size(page_size);
    }
    info!(
        page = %page.page.display(),
        segments = host.total_segments(),
        visible = host.visible_segments(),
        "page loaded"
    );

    let output_dir = output_dir.map_or_else(
        || Path::new(&config.export.output_dir).to_path_buf(),
        Path::to_path_buf,
    );

    Ok(Arc::new(ExportService::new(
        Arc::new(host),
        Arc::new(MarkdownRenderer::new()),
        Arc::new(DirectoryFileSink::new(output_dir)),
        Arc::new(SystemClipboard::new()),
        config.clone(),
    )))
}

/// Run one operation with a progress bar; Ctrl-C requests cancellation.
pub async fn run_with_progress(
    service: &ExportService,
    request: OperationRequest,
    json_mode: bool,
) -> OperationResult {
    let bar = create_progress_bar(json_mode);
    let mut events = service.subscribe();

    let run = service.run(request);
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            Ok(event) = events.recv() => {
                bar.set_progress(u64::from(event.percent), event.message);
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "cannot listen for Ctrl-C");
                    break (&mut run).await;
                }
                warn!("interrupt received, cancelling");
                service.cancel();
            }
        }
    };

    loop {
        match events.try_recv() {
            Ok(event) => bar.set_progress(u64::from(event.percent), event.message),
            Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }

    match &result {
        OperationResult::Success { .. } => bar.finish_success(request.intent.done_message()),
        OperationResult::Cancelled => bar.finish_warning("Cancelled"),
        OperationResult::Failure { reason } => bar.finish_error(reason.clone()),
    }
    result
}
