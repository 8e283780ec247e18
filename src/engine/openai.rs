//! OpenAI chat completions engine.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    FinishReason, FunctionCall, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{ContentBlock, EngineRequest, EngineResponse, ReasoningEngine, StopReason};
use crate::agent::{ToolDescriptor, Turn};
use crate::config::{EngineSettings, OPENAI_API_KEY_ENV};
use crate::error::{PodcraftError, Result};
use crate::openai::create_client_with_timeout;

/// OpenAI models through the chat completions API.
pub struct OpenAiEngine {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAiEngine {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            max_tokens,
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        if std::env::var(OPENAI_API_KEY_ENV).map_or(true, |key| key.is_empty()) {
            return Err(PodcraftError::Config(format!("{OPENAI_API_KEY_ENV} is not set")));
        }
        let client = create_client_with_timeout(settings.timeout(), settings.base_url.as_deref())?;
        Ok(Self::new(client, &settings.model, settings.max_tokens))
    }

    fn build_request(&self, request: &EngineRequest<'_>) -> Result<CreateChatCompletionRequest> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()
                .map_err(|e| PodcraftError::Engine(e.to_string()))?
                .into(),
        ];

        for turn in request.transcript.turns() {
            append_turn(&mut messages, turn)?;
        }

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .max_completion_tokens(self.max_tokens);
        if !request.tools.is_empty() {
            args.tools(request.tools.iter().map(tool_definition).collect::<Vec<_>>());
        }

        args.build().map_err(|e| PodcraftError::Engine(e.to_string()))
    }
}

fn tool_definition(tool: &ToolDescriptor) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            parameters: Some(tool.input_schema.clone()),
            strict: None,
        },
    }
}

fn append_turn(messages: &mut Vec<ChatCompletionRequestMessage>, turn: &Turn) -> Result<()> {
    let build_err = |e: async_openai::error::OpenAIError| PodcraftError::Engine(e.to_string());

    match turn {
        Turn::UserGoal { text } => messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(text.as_str())
                .build()
                .map_err(build_err)?
                .into(),
        ),
        Turn::AssistantToolRequests { text, requests } => {
            let tool_calls: Vec<ChatCompletionMessageToolCall> = requests
                .iter()
                .map(|req| ChatCompletionMessageToolCall {
                    id: req.invocation_id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: req.tool_name.clone(),
                        arguments: Value::Object(req.arguments.clone()).to_string(),
                    },
                })
                .collect();

            let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
            assistant.tool_calls(tool_calls);
            if let Some(text) = text {
                assistant.content(text.as_str());
            }
            messages.push(assistant.build().map_err(build_err)?.into());
        }
        Turn::ToolResults { results } => {
            for result in results {
                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&result.invocation_id)
                        .content(result.content.as_str())
                        .build()
                        .map_err(build_err)?
                        .into(),
                );
            }
        }
        Turn::AssistantFinal { text } => messages.push(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(text.as_str())
                .build()
                .map_err(build_err)?
                .into(),
        ),
    }
    Ok(())
}

/// Tool-call arguments arrive as a JSON string.
fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl ReasoningEngine for OpenAiEngine {
    #[instrument(skip_all, fields(model = %self.model, turns = request.transcript.turns().len()))]
    async fn respond(&self, request: &EngineRequest<'_>) -> Result<EngineResponse> {
        let body = self.build_request(request)?;

        let response = self
            .client
            .chat()
            .create(body)
            .await
            .map_err(|e| PodcraftError::Engine(format!("OpenAI API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PodcraftError::Engine("No response from model".to_string()))?;
        debug!(finish_reason = ?choice.finish_reason, "Engine responded");

        let stop_reason = match choice.finish_reason {
            Some(FinishReason::ToolCalls) | Some(FinishReason::FunctionCall) => StopReason::ToolUse,
            Some(FinishReason::Stop) => StopReason::Final,
            Some(other) => StopReason::Other(format!("{:?}", other)),
            None => StopReason::Other("unknown".to_string()),
        };

        let mut content = Vec::new();
        if let Some(text) = choice.message.content {
            content.push(ContentBlock::Text { text });
        }
        for call in choice.message.tool_calls.unwrap_or_default() {
            content.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.function.name,
                input: parse_arguments(&call.function.arguments),
            });
        }

        Ok(EngineResponse { stop_reason, content })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
