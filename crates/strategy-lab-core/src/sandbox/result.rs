//! Tool result envelope returned by every sandbox call.

use serde::{Deserialize, Serialize};

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// `{ content: [{type: "text", text}], isError? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(
        rename = "isError",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful single-text result.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: false,
        }
    }

    /// A recoverable tool error, reported in-band.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(message)],
            is_error: true,
        }
    }

    /// Interpret a recorded tool output.
    ///
    /// A stored `ToolResult` document is returned as-is, a JSON string is
    /// unwrapped, anything else is returned as opaque text.
    pub fn from_recorded(output: &str) -> Self {
        if let Ok(result) = serde_json::from_str::<ToolResult>(output) {
            return result;
        }
        match serde_json::from_str::<serde_json::Value>(output) {
            Ok(serde_json::Value::String(s)) => Self::text(s),
            _ => Self::text(output),
        }
    }

    /// All text blocks joined with newlines.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
