//! Reasoning engines (LLM backends) that drive the agent loop.
//!
//! An engine sees the system instructions, the tool declarations and the
//! full transcript on every query, and answers with text and/or tool calls.

mod anthropic;
mod openai;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::{ToolDescriptor, Transcript};
use crate::config::{EngineProvider, EngineSettings};
use crate::error::Result;

pub use anthropic::AnthropicEngine;
pub use openai::OpenAiEngine;

/// One query to a reasoning engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequest<'a> {
    pub system: &'a str,
    pub tools: &'a [ToolDescriptor],
    pub transcript: &'a Transcript,
}

/// Why the engine stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    ToolUse,
    Final,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text { text: String },
    ToolUse { id: String, name: String, input: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl EngineResponse {
    /// Final answer consisting of a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::Final,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }

    /// Text blocks joined with newlines, or `None` when there is no non-empty text.
    pub fn joined_text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

/// An LLM that can decide to call tools or finish.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    async fn respond(&self, request: &EngineRequest<'_>) -> Result<EngineResponse>;

    /// Model identifier, for logs.
    fn model(&self) -> &str;
}

/// Build the engine selected in settings.
pub fn create_engine(settings: &EngineSettings) -> Result<Arc<dyn ReasoningEngine>> {
    let engine: Arc<dyn ReasoningEngine> = match settings.provider {
        EngineProvider::Anthropic => Arc::new(AnthropicEngine::from_settings(settings)?),
        EngineProvider::OpenAi => Arc::new(OpenAiEngine::from_settings(settings)?),
    };
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_joined_text_skips_blank_and_tool_blocks() {
        let response = EngineResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![
                ContentBlock::Text {
                    text: "Let me look that up.".into(),
                },
                ContentBlock::ToolUse {
                    id: "t1".into(),
                    name: "search_papers".into(),
                    input: json!({"query": "diffusion"}),
                },
                ContentBlock::Text { text: "  ".into() },
            ],
        };
        assert!(response.has_tool_use());
        assert_eq!(response.joined_text().as_deref(), Some("Let me look that up."));
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let response = EngineResponse {
            stop_reason: StopReason::Final,
            content: vec![],
        };
        assert!(!response.has_tool_use());
        assert_eq!(response.joined_text(), None);
    }
}
