//! Structured extractor - turns the materialized page into a document.
//!
//! Walks every conversation segment in document order, classifies it by tag,
//! pulls out the role-specific content and assembles labeled Markdown
//! sections. The page is never mutated; response markup goes through the
//! [`Renderer`] port, query text is taken verbatim.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::{ExportError, ExportResult, HostError};
use crate::domain::models::{
    ConversationDocument, ExtractionConfig, RenderedBlock, Role, SectionLabels,
};
use crate::domain::ports::{HostDocument, RenderOptions, Renderer};
use crate::services::locator::{locate_first, Locator};

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Extracts a [`ConversationDocument`] from page markup.
pub struct ConversationExtractor<'a> {
    config: &'a ExtractionConfig,
    renderer: &'a dyn Renderer,
    options: RenderOptions,
}

impl<'a> ConversationExtractor<'a> {
    /// Create an extractor that renders each fragment with `options`.
    pub fn new(
        config: &'a ExtractionConfig,
        renderer: &'a dyn Renderer,
        options: RenderOptions,
    ) -> Self {
        Self {
            config,
            renderer,
            options,
        }
    }

    /// Extract from the host's current tree.
    pub fn extract_from(&self, host: &dyn HostDocument) -> ExportResult<ConversationDocument> {
        let markup = host.markup()?;
        self.extract(&markup)
    }

    /// Extract from serialized page markup.
    #[instrument(skip_all, fields(bytes = markup.len()))]
    pub fn extract(&self, markup: &str) -> ExportResult<ConversationDocument> {
        let segment_selector = compile(&self.config.segment_selector)?;
        let query_selector = compile(&self.config.query_selector)?;
        let response_selector = compile(&self.config.response_selector)?;

        let page = Html::parse_document(markup);
        let title = self.find_title(&page);
        info!(%title, "extracting conversation");

        let segments: Vec<ElementRef<'_>> = page.select(&segment_selector).collect();
        info!(count = segments.len(), "found conversation segments");
        if segments.is_empty() {
            warn!("no conversation content found");
            return Err(ExportError::NoContent);
        }

        let mut blocks = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let tag = segment.value().name();
            let block = match Role::from_tag(tag) {
                Some(Role::Query) => segment
                    .select(&query_selector)
                    .next()
                    .map(inner_text)
                    .filter(|text| !text.is_empty())
                    .map(|text| RenderedBlock::new(Role::Query, text)),
                Some(Role::Response) => match segment.select(&response_selector).next() {
                    Some(rich) => {
                        let rendered = self.renderer.render(&rich.inner_html(), &self.options)?;
                        let rendered = rendered.trim();
                        (!rendered.is_empty())
                            .then(|| RenderedBlock::new(Role::Response, rendered))
                    }
                    None => {
                        debug!(index, "response has no rich content yet, skipping");
                        None
                    }
                },
                None => {
                    debug!(index, tag, "skipping segment with unrecognized role");
                    None
                }
            };

            if let Some(block) = block {
                blocks.push(block);
            }
        }

        let labels = SectionLabels {
            query: self.config.query_label.clone(),
            response: self.config.response_label.clone(),
        };
        Ok(ConversationDocument::assemble(
            title,
            blocks,
            segments.len(),
            &labels,
        ))
    }

    fn find_title(&self, page: &Html) -> String {
        let locators = self.config.title_selectors.iter().filter_map(|raw| {
            let selector = match Selector::parse(raw) {
                Ok(selector) => selector,
                Err(err) => {
                    warn!(selector = %raw, error = %err, "skipping unusable title selector");
                    return None;
                }
            };
            Some(Locator::new(raw.as_str(), move || {
                let text = inner_text(page.select(&selector).next()?);
                (!text.is_empty()).then_some(text)
            }))
        });

        locate_first(locators).map_or_else(
            || self.config.default_title.clone(),
            |found| {
                debug!(via = %found.via, "title located");
                found.value
            },
        )
    }
}

fn compile(selector: &str) -> Result<Selector, HostError> {
    Selector::parse(selector).map_err(|err| HostError::InvalidSelector {
        selector: selector.to_string(),
        reason: err.to_string(),
    })
}

/// Rendered text of an element, approximating the browser's `innerText`:
/// whitespace runs collapse, `<br>` and block boundaries become line breaks,
/// and surrounding blank space is trimmed.
pub fn inner_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw, false);

    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;
    for line in lines {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String, preformatted: bool) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if name == "br" {
                out.push('\n');
                continue;
            }
            if matches!(name, "script" | "style" | "template") {
                continue;
            }

            let block = BLOCK_ELEMENTS.contains(&name);
            let pre = preformatted || name == "pre" || name == "textarea";
            if block {
                break_line(out);
            }
            collect_text(child_element, out, pre);
            if block {
                break_line(out);
            }
        } else if let Some(text) = child.value().as_text() {
            if preformatted {
                out.push_str(text);
            } else {
                push_collapsed(out, text);
            }
        }
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_collapsed(out: &mut String, text: &str) {
    let mut in_space = out.is_empty() || out.ends_with([' ', '\n']);
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
}
