//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces infrastructure adapters must implement:
//! - HostDocument: the live, lazily paginated page being exported
//! - Renderer: rich markup fragment to Markdown conversion
//! - FileSink / ClipboardSink: where the finished document goes
//!
//! These traits keep the poller, extractor and orchestrator independent of
//! any particular browser binding, renderer or delivery mechanism.

pub mod delivery;
pub mod host;
pub mod renderer;

pub use delivery::{ClipboardSink, FileSink};
pub use host::{HostDocument, NodeId, Overflow, OverflowStyle, ScrollMetrics};
pub use renderer::{RenderOptions, Renderer};
