//! Host document port - the page that holds the conversation.

use std::fmt;

use crate::domain::errors::HostError;

/// Opaque handle to an element of the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A computed `overflow` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Content spills out; never a scroll container.
    #[default]
    Visible,
    /// Clipped without scrolling.
    Hidden,
    /// Scrolls when content overflows.
    Auto,
    /// Always scrollable.
    Scroll,
}

impl Overflow {
    /// Parse a CSS keyword; unknown values are treated as `visible`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hidden" | "clip" => Self::Hidden,
            "auto" | "overlay" => Self::Auto,
            "scroll" => Self::Scroll,
            _ => Self::Visible,
        }
    }

    /// Whether this value makes the element a scroll container.
    pub const fn scrolls(self) -> bool {
        matches!(self, Self::Auto | Self::Scroll)
    }
}

/// The computed overflow style of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverflowStyle {
    /// The `overflow` shorthand
    pub overflow: Overflow,
    /// The vertical axis
    pub overflow_y: Overflow,
}

impl OverflowStyle {
    /// Whether either axis allows user scrolling.
    pub const fn allows_scroll(self) -> bool {
        self.overflow.scrolls() || self.overflow_y.scrolls()
    }
}

/// Vertical scroll geometry of an element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    /// Total content height (`scrollHeight`)
    pub scroll_extent: u64,
    /// Visible height (`clientHeight`)
    pub client_extent: u64,
}

impl ScrollMetrics {
    /// Content overflows the visible box.
    pub const fn overflows(self) -> bool {
        self.scroll_extent > self.client_extent
    }
}

/// The live document the conversation is rendered into.
///
/// Implementations are expected to use interior mutability: scroll calls take
/// `&self` so a single host can be shared between the poller and extractor.
pub trait HostDocument: Send + Sync {
    /// First element matching a CSS selector, in document order.
    fn first_match(&self, selector: &str) -> Result<Option<NodeId>, HostError>;

    /// Number of elements matching a CSS selector.
    fn count_matching(&self, selector: &str) -> Result<usize, HostError>;

    /// Parent element, `None` at the root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether the node is the `<body>` element.
    fn is_body(&self, node: NodeId) -> bool;

    /// The root `<html>` element.
    fn document_element(&self) -> NodeId;

    /// Short description for logs (`tag.class`).
    fn describe(&self, node: NodeId) -> String;

    /// Computed overflow style.
    fn overflow(&self, node: NodeId) -> OverflowStyle;

    /// Current scroll geometry.
    fn metrics(&self, node: NodeId) -> ScrollMetrics;

    /// Scroll a container to its start (the backward-pagination trigger).
    fn scroll_to_start(&self, node: NodeId);

    /// Scroll the window itself to the start.
    fn scroll_window_to_start(&self);

    /// Bring a node into view, aligned to the start.
    fn reveal(&self, node: NodeId);

    /// Smoothly scroll a container to its end (newest content).
    fn scroll_to_end(&self, node: NodeId);

    /// Serialized markup of the current tree.
    fn markup(&self) -> Result<String, HostError>;
}
