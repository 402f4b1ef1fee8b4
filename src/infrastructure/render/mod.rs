//! Markup renderers.

pub mod markdown;

pub use markdown::MarkdownRenderer;
