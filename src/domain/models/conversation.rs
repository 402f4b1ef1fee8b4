//! Conversation document model.

use serde::{Deserialize, Serialize};

/// Role of a conversation segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The user's input
    Query,
    /// The model's answer
    Response,
}

impl Role {
    /// Classify a segment by its element tag name.
    ///
    /// Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "user-query" => Some(Self::Query),
            "model-response" => Some(Self::Response),
            _ => None,
        }
    }
}

/// One labeled section of the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedBlock {
    /// Whose turn this is
    pub role: Role,
    /// Rendered Markdown, already trimmed
    pub text: String,
}

impl RenderedBlock {
    /// Create a block from rendered text.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Headings used for each role when assembling Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLabels {
    /// Heading for user turns
    pub query: String,
    /// Heading for model turns
    pub response: String,
}

impl SectionLabels {
    fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Query => &self.query,
            Role::Response => &self.response,
        }
    }
}

/// The extracted conversation, assembled once per operation.
///
/// `segment_count` counts every enumerated segment, including ones that
/// produced no block; it reflects how much of the page was materialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationDocument {
    title: String,
    segments: Vec<RenderedBlock>,
    segment_count: usize,
    content: String,
}

impl ConversationDocument {
    /// Assemble the document text: a title heading, then one labeled section
    /// per block, each followed by a horizontal rule.
    pub fn assemble(
        title: impl Into<String>,
        segments: Vec<RenderedBlock>,
        segment_count: usize,
        labels: &SectionLabels,
    ) -> Self {
        let title = title.into();
        let mut content = format!("# {title}\n\n");
        for block in &segments {
            content.push_str("## ");
            content.push_str(labels.for_role(block.role));
            content.push_str("\n\n");
            content.push_str(&block.text);
            content.push_str("\n\n---\n\n");
        }

        Self {
            title,
            segments,
            segment_count,
            content,
        }
    }

    /// Title used for the heading and the filename.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Blocks in presentation order.
    pub fn segments(&self) -> &[RenderedBlock] {
        &self.segments
    }

    /// Segments enumerated, including ones that produced no block.
    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Full Markdown text.
    pub fn content(&self) -> &str {
        &self.content
    }
}
