//! Command-line surface: argument parsing, command dispatch and output.

pub mod commands;
pub mod output;
pub mod types;

use crate::domain::models::OperationResult;

pub use types::{Cli, Commands};

/// Exit status for an interrupted operation, matching shells' SIGINT code.
pub const EXIT_CANCELLED: i32 = 130;

/// Process exit status for a terminal operation result.
pub const fn exit_code(result: &OperationResult) -> i32 {
    match result {
        OperationResult::Success { .. } => 0,
        OperationResult::Cancelled => EXIT_CANCELLED,
        OperationResult::Failure { .. } => 1,
    }
}

/// Report an error that aborted a command and exit.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "success": false, "error": format!("{err:#}") });
        eprintln!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
