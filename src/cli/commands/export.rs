//! `export` command: save the conversation as a Markdown file.

use anyhow::Result;

use crate::cli::output::{output, OperationOutput};
use crate::cli::types::ExportArgs;
use crate::domain::models::{Config, OperationRequest, OperationResult};

/// Run one export with a progress bar; Ctrl-C cancels.
pub async fn execute(args: ExportArgs, config: &Config, json_mode: bool) -> Result<OperationResult> {
    let service = super::build_service(config, &args.page, args.output_dir.as_deref()).await?;
    let request = OperationRequest::export(!args.page.no_full_load);

    let result = super::run_with_progress(&service, request, json_mode).await;
    output(&OperationOutput::from(&result), json_mode);
    Ok(result)
}
