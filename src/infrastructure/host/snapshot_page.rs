//! A host document backed by a saved conversation page.
//!
//! The page is kept as its original markup and re-parsed on demand, so the
//! host stays `Send + Sync` while `scraper`'s DOM does not. Geometry is
//! synthesized: every materialized segment is a fixed number of pixels tall,
//! and elements with `overflow: auto|scroll` in their inline style get a
//! fixed viewport.
//!
//! With a page size, the snapshot behaves like a lazily paginated scroller:
//! only the newest `page_size` segments are materialized at first, and each
//! time a pagination trigger fires (scrolling a segment container or the
//! window to the start, or revealing the first segment) the next batch of
//! older segments appears at the following measurement (`count_matching`,
//! `metrics` or `markup`). Element lookups see the current tree only.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::domain::errors::HostError;
use crate::domain::ports::{HostDocument, NodeId, Overflow, OverflowStyle, ScrollMetrics};

/// Nominal rendered height of one segment.
pub const DEFAULT_SEGMENT_HEIGHT: u64 = 480;

/// Nominal height of a scroll viewport.
pub const DEFAULT_VIEWPORT_HEIGHT: u64 = 900;

#[derive(Debug, Clone)]
struct ElementInfo {
    tag: String,
    classes: Vec<String>,
    parent: Option<usize>,
    overflow: OverflowStyle,
    /// Ordinal of the segment this element is, or lives inside
    owner: Option<usize>,
    /// Ordinals of segments in this element's subtree
    segments: Option<Range<usize>>,
}

#[derive(Debug)]
struct PageState {
    visible: usize,
    pending_load: bool,
    loads: usize,
}

/// Saved page served as a live host document.
#[derive(Debug)]
pub struct SnapshotPage {
    source: String,
    elements: Vec<ElementInfo>,
    total_segments: usize,
    page_size: Option<usize>,
    segment_height: u64,
    viewport_height: u64,
    state: Mutex<PageState>,
}

impl SnapshotPage {
    /// Index a page, identifying segments with `segment_selector`.
    pub fn from_html(source: impl Into<String>, segment_selector: &str) -> Result<Self, HostError> {
        let source = source.into();
        let selector = parse_selector(segment_selector)?;
        let html = Html::parse_document(&source);
        let ordered = elements_in_order(&html);
        let index: HashMap<_, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, el)| (el.id(), i))
            .collect();

        let mut elements: Vec<ElementInfo> = ordered
            .iter()
            .map(|el| ElementInfo {
                tag: el.value().name().to_string(),
                classes: el.value().classes().map(str::to_string).collect(),
                parent: el
                    .parent()
                    .and_then(ElementRef::wrap)
                    .and_then(|p| index.get(&p.id()).copied()),
                overflow: parse_overflow(el.value().attr("style").unwrap_or_default()),
                owner: None,
                segments: None,
            })
            .collect();

        let segment_nodes: Vec<usize> = html
            .select(&selector)
            .filter_map(|el| index.get(&el.id()).copied())
            .collect();

        for (ordinal, &node) in segment_nodes.iter().enumerate() {
            let mut cursor = Some(node);
            while let Some(i) = cursor {
                let range = elements[i].segments.get_or_insert(ordinal..ordinal + 1);
                range.start = range.start.min(ordinal);
                range.end = range.end.max(ordinal + 1);
                cursor = elements[i].parent;
            }
        }

        let ordinal_of: HashMap<usize, usize> = segment_nodes
            .iter()
            .enumerate()
            .map(|(ordinal, &node)| (node, ordinal))
            .collect();
        let mut owners: Vec<Option<usize>> = Vec::with_capacity(elements.len());
        for (i, info) in elements.iter().enumerate() {
            let inherited = info.parent.and_then(|p| owners[p]);
            owners.push(ordinal_of.get(&i).copied().or(inherited));
        }
        for (info, owner) in elements.iter_mut().zip(owners) {
            info.owner = owner;
        }

        let total_segments = segment_nodes.len();
        debug!(
            elements = elements.len(),
            segments = total_segments,
            "indexed snapshot page"
        );

        Ok(Self {
            source,
            elements,
            total_segments,
            page_size: None,
            segment_height: DEFAULT_SEGMENT_HEIGHT,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            state: Mutex::new(PageState {
                visible: total_segments,
                pending_load: false,
                loads: 0,
            }),
        })
    }

    /// Materialize only the newest `page_size` segments until paginated.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        self.page_size = Some(page_size);
        self.state_mut().visible = page_size.min(self.total_segments);
        self
    }

    /// Override the synthesized geometry.
    #[must_use]
    pub fn with_geometry(mut self, segment_height: u64, viewport_height: u64) -> Self {
        self.segment_height = segment_height;
        self.viewport_height = viewport_height;
        self
    }

    /// Segments currently materialized.
    pub fn visible_segments(&self) -> usize {
        self.materialize()
    }

    /// Segments in the saved page, loaded or not.
    pub fn total_segments(&self) -> usize {
        self.total_segments
    }

    /// Number of pagination batches that have landed.
    pub fn loads(&self) -> usize {
        self.lock().loads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut PageState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a pending pagination batch and return the visible count.
    fn materialize(&self) -> usize {
        let mut state = self.lock();
        if state.pending_load {
            state.pending_load = false;
            if let Some(page_size) = self.page_size {
                let before = state.visible;
                state.visible = (state.visible + page_size).min(self.total_segments);
                if state.visible > before {
                    state.loads += 1;
                    debug!(from = before, to = state.visible, "older segments materialized");
                }
            }
        }
        state.visible
    }

    /// Visible count without applying a pending batch.
    fn current_visible(&self) -> usize {
        self.lock().visible
    }

    fn trigger_pagination(&self) {
        if self.page_size.is_some() {
            self.lock().pending_load = true;
        }
    }

    fn first_hidden(&self, visible: usize) -> usize {
        self.total_segments - visible
    }

    fn is_hidden(&self, node: usize, visible: usize) -> bool {
        self.elements[node]
            .owner
            .is_some_and(|ordinal| ordinal < self.first_hidden(visible))
    }

    fn visible_in_subtree(&self, node: usize, visible: usize) -> u64 {
        let first_visible = self.first_hidden(visible);
        self.elements[node].segments.as_ref().map_or(0, |range| {
            let start = range.start.max(first_visible);
            range.end.saturating_sub(start) as u64
        })
    }

    fn is_scroll_box(&self, node: usize) -> bool {
        node == 0 || self.elements[node].overflow.allows_scroll()
    }

    fn matches(&self, selector: &str, visible: usize) -> Result<Vec<usize>, HostError> {
        let selector = parse_selector(selector)?;
        let html = Html::parse_document(&self.source);
        let ordered = elements_in_order(&html);
        let index: HashMap<_, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, el)| (el.id(), i))
            .collect();

        Ok(html
            .select(&selector)
            .filter_map(|el| index.get(&el.id()).copied())
            .filter(|&node| !self.is_hidden(node, visible))
            .collect())
    }

    fn info(&self, node: NodeId) -> Option<&ElementInfo> {
        self.elements.get(node.0)
    }
}

impl HostDocument for SnapshotPage {
    fn first_match(&self, selector: &str) -> Result<Option<NodeId>, HostError> {
        let visible = self.current_visible();
        Ok(self.matches(selector, visible)?.first().copied().map(NodeId))
    }

    fn count_matching(&self, selector: &str) -> Result<usize, HostError> {
        let visible = self.materialize();
        Ok(self.matches(selector, visible)?.len())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.info(node)?.parent.map(NodeId)
    }

    fn is_body(&self, node: NodeId) -> bool {
        self.info(node).is_some_and(|info| info.tag == "body")
    }

    fn document_element(&self) -> NodeId {
        NodeId(0)
    }

    fn describe(&self, node: NodeId) -> String {
        self.info(node).map_or_else(
            || format!("<detached {node}>"),
            |info| {
                if info.classes.is_empty() {
                    info.tag.clone()
                } else {
                    format!("{}.{}", info.tag, info.classes.join("."))
                }
            },
        )
    }

    fn overflow(&self, node: NodeId) -> OverflowStyle {
        self.info(node).map(|info| info.overflow).unwrap_or_default()
    }

    fn metrics(&self, node: NodeId) -> ScrollMetrics {
        if self.info(node).is_none() {
            return ScrollMetrics::default();
        }
        let visible = self.materialize();
        let content = self.visible_in_subtree(node.0, visible) * self.segment_height;
        if self.is_scroll_box(node.0) {
            ScrollMetrics {
                scroll_extent: content.max(self.viewport_height),
                client_extent: self.viewport_height,
            }
        } else {
            ScrollMetrics {
                scroll_extent: content,
                client_extent: content,
            }
        }
    }

    fn scroll_to_start(&self, node: NodeId) {
        trace!(node = %node, "scroll to start");
        let contains_segments = self
            .info(node)
            .is_some_and(|info| info.segments.is_some());
        if contains_segments && self.is_scroll_box(node.0) {
            self.trigger_pagination();
        }
    }

    fn scroll_window_to_start(&self) {
        trace!("window scroll to start");
        self.trigger_pagination();
    }

    fn reveal(&self, node: NodeId) {
        trace!(node = %node, "reveal");
        if self.info(node).is_some_and(|info| info.owner.is_some()) {
            self.trigger_pagination();
        }
    }

    fn scroll_to_end(&self, node: NodeId) {
        debug!(container = %self.describe(node), "scrolled back to newest content");
    }

    fn markup(&self) -> Result<String, HostError> {
        let visible = self.materialize();
        if visible == self.total_segments {
            return Ok(self.source.clone());
        }

        let mut html = Html::parse_document(&self.source);
        let hidden: Vec<_> = elements_in_order(&html)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| {
                let info = &self.elements[*i];
                info.segments.is_some()
                    && info.owner.is_some_and(|o| o < self.first_hidden(visible))
            })
            .map(|(_, el)| el.id())
            .collect();

        for id in hidden {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }
        Ok(html.html())
    }
}

fn elements_in_order(html: &Html) -> Vec<ElementRef<'_>> {
    html.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect()
}

fn parse_selector(selector: &str) -> Result<Selector, HostError> {
    Selector::parse(selector).map_err(|err| HostError::InvalidSelector {
        selector: selector.to_string(),
        reason: err.to_string(),
    })
}

/// Read `overflow` / `overflow-y` from an inline style attribute.
fn parse_overflow(style: &str) -> OverflowStyle {
    let mut parsed = OverflowStyle::default();
    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        match property.trim().to_ascii_lowercase().as_str() {
            "overflow" => {
                let value = Overflow::parse(value);
                parsed.overflow = value;
                parsed.overflow_y = value;
            }
            "overflow-y" => parsed.overflow_y = Overflow::parse(value),
            _ => {}
        }
    }
    parsed
}
