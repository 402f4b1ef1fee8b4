//! Renderer port - rich markup to Markdown.

use crate::domain::errors::RenderError;

/// Options passed with every fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Keep tables as tables instead of flattening them to text
    pub table_support: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            table_support: true,
        }
    }
}

/// Converts a fragment of rich markup into normalized Markdown.
///
/// Must be deterministic and must not mutate its input.
pub trait Renderer: Send + Sync {
    /// Render one fragment.
    fn render(&self, fragment: &str, options: &RenderOptions) -> Result<String, RenderError>;
}
