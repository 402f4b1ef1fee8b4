//! Renderer backed by `htmd`, a Turndown-style HTML to Markdown converter.
//!
//! Output uses atx headings, `-` bullets, fenced code blocks and inline
//! links, and GFM pipe tables when table support is on. Links are always
//! inlined so that fragments rendered independently can be concatenated
//! into one document without colliding reference definitions.

use htmd::options::{
    BulletListMarker, CodeBlockFence, CodeBlockStyle, HeadingStyle, HrStyle, LinkStyle, Options,
};
use htmd::HtmlToMarkdown;

use crate::domain::errors::RenderError;
use crate::domain::ports::{RenderOptions, Renderer};

/// Tags whose content never belongs in the exported text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "template", "button"];

/// Converts response markup into GitHub-flavoured Markdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Create a renderer.
    pub const fn new() -> Self {
        Self
    }

    fn converter() -> HtmlToMarkdown {
        HtmlToMarkdown::builder()
            .options(Options {
                heading_style: HeadingStyle::Atx,
                hr_style: HrStyle::Dashes,
                bullet_list_marker: BulletListMarker::Dash,
                code_block_style: CodeBlockStyle::Fenced,
                code_block_fence: CodeBlockFence::Backticks,
                link_style: LinkStyle::Inlined,
                ..Options::default()
            })
            .skip_tags(SKIPPED_TAGS.to_vec())
            .build()
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, fragment: &str, options: &RenderOptions) -> Result<String, RenderError> {
        let markdown = Self::converter()
            .convert(fragment)
            .map_err(|err| RenderError::new(err.to_string()))?;

        if options.table_support {
            Ok(markdown)
        } else {
            Ok(flatten_pipe_tables(&markdown))
        }
    }
}

/// Replace GFM pipe tables with one plain line per row.
///
/// Delimiter rows are dropped and the cells of every other row are joined
/// with single spaces. Fenced code is left untouched.
pub fn flatten_pipe_tables(markdown: &str) -> String {
    let mut out = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            out.push(line.to_string());
            continue;
        }
        if in_fence || !is_table_row(trimmed) {
            out.push(line.to_string());
            continue;
        }
        if is_delimiter_row(trimmed) {
            continue;
        }
        let cells: Vec<&str> = trimmed
            .trim_matches('|')
            .split('|')
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect();
        out.push(cells.join(" "));
    }
    out.join("\n")
}

fn is_table_row(line: &str) -> bool {
    line.len() > 1 && line.starts_with('|') && line.ends_with('|')
}

fn is_delimiter_row(line: &str) -> bool {
    line.contains('-')
        && line
            .chars()
            .all(|c| matches!(c, '|' | '-' | ':' | ' '))
}
