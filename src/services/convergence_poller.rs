//! Convergence poller - forces a lazily paginated container to load fully.
//!
//! The host only fetches older turns when its scroll container is pushed to
//! the start boundary, and it gives no signal when history is exhausted. The
//! poller therefore rewinds, waits, and measures repeatedly, and declares
//! convergence once neither the segment count nor the scroll extent has grown
//! for several consecutive cycles.
//!
//! The decision logic lives in [`ConvergenceState::step`], a pure transition
//! function over measurements. [`ConvergencePoller`] only drives the host and
//! the timers around it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::HostError;
use crate::domain::models::PollerConfig;
use crate::domain::ports::{HostDocument, NodeId};
use crate::services::locator::{locate_first, Located, Locator};
use crate::services::progress::ProgressReporter;

/// Percent reported when loading starts.
pub const LOAD_START_PERCENT: u8 = 5;

/// Percent reported once loading has finished.
pub const LOAD_DONE_PERCENT: u8 = 95;

/// One observation of the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Measurement {
    /// Segments currently matching the segment selector
    pub segment_count: usize,
    /// Scrollable height of the container
    pub content_extent: u64,
}

/// Input to a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// The host answered a measurement.
    Measured(Measurement),
    /// Cancellation was requested before measuring.
    Cancelled,
}

/// What the driver should do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Keep polling.
    Continue {
        /// This cycle saw new content
        grew: bool,
    },
    /// Enough consecutive quiet cycles: the history is loaded.
    Converged,
    /// Attempt budget spent without converging.
    Exhausted,
    /// Cancellation observed.
    Cancelled,
}

impl PollAction {
    /// Whether polling stops here.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Continue { .. })
    }
}

/// Thresholds the transition function applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvergenceRules {
    /// Attempt budget
    pub max_attempts: u32,
    /// Quiet cycles that mean "fully loaded"
    pub no_change_threshold: u32,
    /// Estimate added per attempt
    pub progress_per_attempt: u8,
    /// Highest loading-phase estimate
    pub progress_cap: u8,
}

impl From<&PollerConfig> for ConvergenceRules {
    fn from(config: &PollerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            no_change_threshold: config.no_change_threshold,
            progress_per_attempt: config.progress_per_attempt,
            progress_cap: config.progress_cap,
        }
    }
}

impl Default for ConvergenceRules {
    fn default() -> Self {
        Self::from(&PollerConfig::default())
    }
}

/// Poller state, advanced only by [`ConvergenceState::step`].
///
/// The recorded segment count and extent are high-water marks, so the
/// reported count never decreases even if a virtualized host briefly drops
/// rendered turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvergenceState {
    attempt: u32,
    consecutive_no_change: u32,
    last_segment_count: usize,
    last_content_extent: u64,
    grew_last: bool,
    cancelled: bool,
}

impl ConvergenceState {
    /// Start from the baseline observed before the first rewind.
    pub const fn new(baseline: Measurement) -> Self {
        Self {
            attempt: 0,
            consecutive_no_change: 0,
            last_segment_count: baseline.segment_count,
            last_content_extent: baseline.content_extent,
            grew_last: false,
            cancelled: false,
        }
    }

    /// Advance by one cycle.
    #[must_use]
    pub fn step(&self, rules: &ConvergenceRules, sample: Sample) -> (Self, PollAction) {
        let mut next = self.clone();

        let measurement = match sample {
            Sample::Cancelled => {
                next.cancelled = true;
                next.grew_last = false;
                return (next, PollAction::Cancelled);
            }
            Sample::Measured(m) => m,
        };

        next.attempt = self.attempt.saturating_add(1);
        let grew = measurement.segment_count > self.last_segment_count
            || measurement.content_extent > self.last_content_extent;
        next.grew_last = grew;
        next.last_segment_count = self.last_segment_count.max(measurement.segment_count);
        next.last_content_extent = self.last_content_extent.max(measurement.content_extent);

        if grew {
            next.consecutive_no_change = 0;
        } else {
            next.consecutive_no_change = self.consecutive_no_change.saturating_add(1);
            if next.consecutive_no_change >= rules.no_change_threshold {
                return (next, PollAction::Converged);
            }
        }

        if next.attempt >= rules.max_attempts {
            return (next, PollAction::Exhausted);
        }

        (next, PollAction::Continue { grew })
    }

    /// Attempts made so far.
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Quiet cycles in a row.
    pub const fn consecutive_no_change(&self) -> u32 {
        self.consecutive_no_change
    }

    /// Last observed segment count.
    pub const fn segment_count(&self) -> usize {
        self.last_segment_count
    }

    /// Last observed content extent.
    pub const fn content_extent(&self) -> u64 {
        self.last_content_extent
    }

    /// Whether the most recent cycle saw new content.
    pub const fn grew_last(&self) -> bool {
        self.grew_last
    }

    /// Whether a cancelled sample ended the poll.
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Loading-phase estimate: grows with attempts, capped.
    pub fn estimated_percent(&self, rules: &ConvergenceRules) -> u8 {
        let raw = u64::from(self.attempt) * u64::from(rules.progress_per_attempt);
        let capped = raw.min(u64::from(rules.progress_cap));
        u8::try_from(capped).unwrap_or(rules.progress_cap)
    }
}

/// Result of a poll that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Segments present when polling stopped
    pub segment_count: usize,
    /// Attempts spent
    pub attempts: u32,
    /// `false` when the attempt budget ran out first
    pub converged: bool,
}

/// Find the scrollable container that drives pagination.
///
/// Tries, in order: the nearest scrollable, overflowing ancestor of the
/// first segment; each configured structural selector whose element
/// overflows; the document element.
pub fn locate_container(
    host: &dyn HostDocument,
    segment_selector: &str,
    container_selectors: &[String],
) -> Located<NodeId> {
    let mut locators: Vec<Locator<'_, NodeId>> = Vec::with_capacity(container_selectors.len() + 2);

    locators.push(Locator::new("ancestor-walk", move || {
        let first = first_match_or_warn(host, segment_selector)?;
        let mut candidate = host.parent(first);
        while let Some(node) = candidate {
            if host.is_body(node) {
                break;
            }
            if host.overflow(node).allows_scroll() && host.metrics(node).overflows() {
                return Some(node);
            }
            candidate = host.parent(node);
        }
        None
    }));

    for selector in container_selectors {
        let selector = selector.as_str();
        locators.push(Locator::new(selector, move || {
            first_match_or_warn(host, selector).filter(|node| host.metrics(*node).overflows())
        }));
    }

    locators.push(Locator::new("document-element", move || {
        Some(host.document_element())
    }));

    let found = locate_first(locators).unwrap_or_else(|| Located {
        value: host.document_element(),
        via: "document-element".to_string(),
    });

    info!(
        container = %host.describe(found.value),
        via = %found.via,
        "scroll container located"
    );
    found
}

fn first_match_or_warn(host: &dyn HostDocument, selector: &str) -> Option<NodeId> {
    match host.first_match(selector) {
        Ok(node) => node,
        Err(err) => {
            warn!(selector, error = %err, "skipping unusable selector");
            None
        }
    }
}

/// Drives the host through rewind/wait/measure cycles.
pub struct ConvergencePoller<'a> {
    host: &'a dyn HostDocument,
    config: &'a PollerConfig,
    segment_selector: &'a str,
}

impl<'a> ConvergencePoller<'a> {
    /// Poll `host`, counting elements that match `segment_selector`.
    pub fn new(host: &'a dyn HostDocument, config: &'a PollerConfig, segment_selector: &'a str) -> Self {
        Self {
            host,
            config,
            segment_selector,
        }
    }

    /// Poll until convergence, exhaustion, or cancellation.
    ///
    /// Returns `Ok(None)` when cancelled; in that case the scroll position is
    /// left where it is and no further progress is emitted. On normal exit
    /// the container is scrolled back to the newest content.
    #[instrument(skip_all, fields(max_attempts = self.config.max_attempts))]
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        progress: &ProgressReporter,
    ) -> Result<Option<LoadOutcome>, HostError> {
        let rules = ConvergenceRules::from(self.config);
        let container =
            locate_container(self.host, self.segment_selector, &self.config.container_selectors)
                .value;

        let baseline = self.measure(container)?;
        info!(
            segments = baseline.segment_count,
            extent = baseline.content_extent,
            "starting full conversation load"
        );
        progress.emit(
            LOAD_START_PERCENT,
            format!("Starting to load... ({} turns)", baseline.segment_count),
        );

        let settle = Duration::from_millis(self.config.settle_delay_ms);
        let retry = Duration::from_millis(self.config.retry_delay_ms);
        let mut state = ConvergenceState::new(baseline);

        let action = loop {
            if cancel.is_cancelled() {
                info!(attempt = state.attempt(), "load cancelled before rewind");
                return Ok(None);
            }

            self.rewind(container)?;
            tokio::time::sleep(settle).await;

            let sample = if cancel.is_cancelled() {
                Sample::Cancelled
            } else {
                Sample::Measured(self.measure(container)?)
            };

            let previous_count = state.segment_count();
            let (next, action) = state.step(&rules, sample);
            state = next;

            if action == PollAction::Cancelled {
                info!(attempt = state.attempt(), "load cancelled");
                return Ok(None);
            }

            if state.grew_last() {
                debug!(
                    attempt = state.attempt(),
                    from = previous_count,
                    to = state.segment_count(),
                    extent = state.content_extent(),
                    "new content loaded"
                );
                progress.emit(
                    state.estimated_percent(&rules),
                    format!("Loading conversation... ({} turns)", state.segment_count()),
                );
            } else {
                debug!(
                    attempt = state.attempt(),
                    quiet = state.consecutive_no_change(),
                    threshold = rules.no_change_threshold,
                    "no new content"
                );
            }

            match action {
                PollAction::Continue { grew: false } => tokio::time::sleep(retry).await,
                PollAction::Continue { grew: true } => {}
                terminal => break terminal,
            }
        };

        let converged = action == PollAction::Converged;
        if converged {
            info!(
                attempts = state.attempt(),
                segments = state.segment_count(),
                "conversation fully loaded"
            );
        } else {
            warn!(
                attempts = state.attempt(),
                segments = state.segment_count(),
                "attempt budget exhausted before content stopped growing"
            );
        }

        progress.emit(LOAD_DONE_PERCENT, "Extracting conversation content...");
        self.host.scroll_to_end(container);

        Ok(Some(LoadOutcome {
            segment_count: state.segment_count(),
            attempts: state.attempt(),
            converged,
        }))
    }

    /// Push every pagination trigger the host might respond to.
    fn rewind(&self, container: NodeId) -> Result<(), HostError> {
        self.host.scroll_to_start(container);
        self.host.scroll_window_to_start();
        if let Some(first) = self.host.first_match(self.segment_selector)? {
            self.host.reveal(first);
        }
        Ok(())
    }

    fn measure(&self, container: NodeId) -> Result<Measurement, HostError> {
        Ok(Measurement {
            segment_count: self.host.count_matching(self.segment_selector)?,
            content_extent: self.host.metrics(container).scroll_extent,
        })
    }
}
