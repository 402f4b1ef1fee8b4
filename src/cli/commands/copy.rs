//! `copy` command: place the conversation on the clipboard.

use anyhow::Result;

use crate::cli::output::{output, OperationOutput};
use crate::cli::types::CopyArgs;
use crate::domain::models::{Config, OperationRequest, OperationResult};

/// Run one copy with a progress bar; Ctrl-C cancels.
pub async fn execute(args: CopyArgs, config: &Config, json_mode: bool) -> Result<OperationResult> {
    let service = super::build_service(config, &args.page, None).await?;
    let request = OperationRequest::copy(!args.page.no_full_load);

    let result = super::run_with_progress(&service, request, json_mode).await;
    output(&OperationOutput::from(&result), json_mode);
    Ok(result)
}
