//! Framework-agnostic MCP types used throughout the payment flow.

use serde::{Deserialize, Serialize};

/// Named arguments of an MCP tool call.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// Parameters for calling an MCP tool.
///
/// This is a framework-agnostic representation of MCP `CallToolParams`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolParams {
    /// The tool name to invoke.
    pub name: String,
    /// Arguments to pass to the tool.
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl CallToolParams {
    /// Creates call parameters for `name` with `arguments`.
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// A single content item in a tool call result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[non_exhaustive]
pub enum ContentItem {
    /// Text content.
    Text {
        /// The text value.
        text: String,
    },
}

impl ContentItem {
    /// Creates a new text content item.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Returns the text content if this is a text item.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
        }
    }
}

/// Result of an MCP tool call.
///
/// This is a framework-agnostic representation of MCP `CallToolResult`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Content items returned by the tool.
    #[serde(default)]
    pub content: Vec<ContentItem>,
    /// Whether the tool returned an error.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
    /// Optional structured content (preferred for payment required responses).
    #[serde(
        default,
        rename = "structuredContent",
        skip_serializing_if = "Option::is_none"
    )]
    pub structured_content: Option<serde_json::Value>,
}

impl CallToolResult {
    /// Creates a successful result with a single text item.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            ..Default::default()
        }
    }

    /// Creates an error result with a single text item.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem::text(text)],
            is_error: true,
            structured_content: None,
        }
    }

    /// Returns the first text item, if any.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ContentItem::as_text)
    }
}
