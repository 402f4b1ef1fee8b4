//! Fire-and-forget progress reporting.
//!
//! Progress flows one way over a `tokio::sync::broadcast` channel: there is no
//! acknowledgement, slow receivers lag instead of applying backpressure, and a
//! send with no subscribers is silently dropped.

use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::broadcast;

use crate::domain::models::ProgressEvent;

/// Default capacity of the progress broadcast channel.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Per-operation progress emitter.
///
/// Percent is clamped to a non-decreasing floor so the event stream of one
/// operation never moves backwards, even when a coarse estimate (such as the
/// poller's attempt-based one) comes in below a value already reported.
#[derive(Debug)]
pub struct ProgressReporter {
    sender: Option<broadcast::Sender<ProgressEvent>>,
    floor: AtomicU8,
}

impl ProgressReporter {
    /// Report onto an existing channel.
    pub fn new(sender: broadcast::Sender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
            floor: AtomicU8::new(0),
        }
    }

    /// A reporter with no observer.
    pub fn silent() -> Self {
        Self {
            sender: None,
            floor: AtomicU8::new(0),
        }
    }

    /// Emit a progress event. Never blocks and never fails.
    pub fn emit(&self, percent: u8, message: impl Into<String>) {
        let requested = percent.min(100);
        let previous = self.floor.fetch_max(requested, Ordering::SeqCst);
        let percent = previous.max(requested);

        let event = ProgressEvent::new(percent, message);
        tracing::debug!(percent = event.percent, message = %event.message, "progress");

        if let Some(ref sender) = self.sender {
            // No subscribers is fine: the observer may have gone away.
            let _ = sender.send(event);
        }
    }

    /// Highest percent emitted so far.
    pub fn current(&self) -> u8 {
        self.floor.load(Ordering::SeqCst)
    }
}
