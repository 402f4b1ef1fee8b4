//! Progress bar utilities using indicatif for terminal output

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Percent bar with the latest status message
const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}";

/// Progress bar characters for visual effect
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Create a percent progress bar (0..=100)
///
/// Hidden when `hidden` is set, so JSON output stays clean.
pub fn create_progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(PROGRESS_CHARS);
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Extension trait for ProgressBar to add common utility methods
pub trait ProgressBarExt {
    /// Finish with a success message (green checkmark)
    fn finish_success(&self, message: impl Into<String>);

    /// Finish with an error message (red X)
    fn finish_error(&self, message: impl Into<String>);

    /// Finish with a warning message (yellow !)
    fn finish_warning(&self, message: impl Into<String>);

    /// Update progress and message in one call
    fn set_progress(&self, position: u64, message: impl Into<String>);
}

impl ProgressBarExt for ProgressBar {
    fn finish_success(&self, message: impl Into<String>) {
        self.finish_with_message(format!("✓ {}", message.into()));
    }

    fn finish_error(&self, message: impl Into<String>) {
        self.abandon_with_message(format!("✗ {}", message.into()));
    }

    fn finish_warning(&self, message: impl Into<String>) {
        self.abandon_with_message(format!("! {}", message.into()));
    }

    fn set_progress(&self, position: u64, message: impl Into<String>) {
        self.set_position(position);
        self.set_message(message.into());
    }
}
