//! Anthropic Messages API engine.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{ContentBlock, EngineRequest, EngineResponse, ReasoningEngine, StopReason};
use crate::agent::{ToolDescriptor, Turn};
use crate::config::{EngineSettings, ANTHROPIC_API_KEY_ENV};
use crate::error::{PodcraftError, Result};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec<'a>>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct ToolSpec<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<RequestBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestBlock<'a> {
    Text {
        text: &'a str,
    },
    ToolUse {
        id: &'a str,
        name: &'a str,
        input: &'a serde_json::Map<String, Value>,
    },
    ToolResult {
        tool_use_id: &'a str,
        content: &'a str,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    kind: String,
    message: String,
}

/// Claude via the Messages API.
pub struct AnthropicEngine {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl AnthropicEngine {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 8000,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build from settings, reading the key from `ANTHROPIC_API_KEY`.
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        let api_key = std::env::var(ANTHROPIC_API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PodcraftError::Config(format!("{ANTHROPIC_API_KEY_ENV} is not set")))?;

        let mut engine = Self::new(api_key, &settings.model, settings.timeout())?
            .with_max_tokens(settings.max_tokens);
        if let Some(base) = &settings.base_url {
            engine = engine.with_base_url(base);
        }
        Ok(engine)
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_request<'a>(&'a self, request: &EngineRequest<'a>) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: request.system,
            tools: request.tools.iter().map(tool_spec).collect(),
            messages: request.transcript.turns().iter().map(message).collect(),
        }
    }
}

fn tool_spec(tool: &ToolDescriptor) -> ToolSpec<'_> {
    ToolSpec {
        name: &tool.name,
        description: &tool.description,
        input_schema: &tool.input_schema,
    }
}

fn message(turn: &Turn) -> Message<'_> {
    match turn {
        Turn::UserGoal { text } => Message {
            role: "user",
            content: vec![RequestBlock::Text { text }],
        },
        Turn::AssistantToolRequests { text, requests } => Message {
            role: "assistant",
            content: text
                .as_deref()
                .map(|text| RequestBlock::Text { text })
                .into_iter()
                .chain(requests.iter().map(|req| RequestBlock::ToolUse {
                    id: &req.invocation_id,
                    name: &req.tool_name,
                    input: &req.arguments,
                }))
                .collect(),
        },
        Turn::ToolResults { results } => Message {
            role: "user",
            content: results
                .iter()
                .map(|res| RequestBlock::ToolResult {
                    tool_use_id: &res.invocation_id,
                    content: &res.content,
                    is_error: res.is_error,
                })
                .collect(),
        },
        Turn::AssistantFinal { text } => Message {
            role: "assistant",
            content: vec![RequestBlock::Text { text }],
        },
    }
}

fn into_engine_response(response: MessagesResponse) -> EngineResponse {
    let stop_reason = match response.stop_reason.as_deref() {
        Some("tool_use") => StopReason::ToolUse,
        Some("end_turn") | Some("stop_sequence") => StopReason::Final,
        Some(other) => StopReason::Other(other.to_string()),
        None => StopReason::Other("unknown".to_string()),
    };

    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
            ResponseBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse { id, name, input })
            }
            ResponseBlock::Other => None,
        })
        .collect();

    EngineResponse { stop_reason, content }
}

#[async_trait]
impl ReasoningEngine for AnthropicEngine {
    #[instrument(skip_all, fields(model = %self.model, turns = request.transcript.turns().len()))]
    async fn respond(&self, request: &EngineRequest<'_>) -> Result<EngineResponse> {
        let body = self.build_request(request);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| PodcraftError::Engine(format!("Anthropic request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| format!("{}: {}", env.error.kind, env.error.message))
                .unwrap_or(text);
            return Err(PodcraftError::Engine(format!(
                "Anthropic API error ({}): {}",
                status, detail
            )));
        }

        let parsed: MessagesResponse = serde_json::from_str(&text)
            .map_err(|e| PodcraftError::Engine(format!("Malformed Anthropic response: {}", e)))?;
        debug!(
            stop_reason = ?parsed.stop_reason,
            blocks = parsed.content.len(),
            "Engine responded"
        );

        Ok(into_engine_response(parsed))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
