//! Agent runner with tool calling loop.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::executor::{InvokeError, ToolExecutor};
use super::transcript::{ToolInvocationRequest, ToolInvocationResult, Transcript, Turn};
use crate::engine::{ContentBlock, EngineRequest, EngineResponse, ReasoningEngine};
use crate::error::{PodcraftError, Result};

/// Default cap on engine queries per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Characters of tool output shown in logs.
const PREVIEW_CHARS: usize = 200;

enum LoopState {
    AwaitingEngine,
    ExecutingTools {
        text: Option<String>,
        requests: Vec<ToolInvocationRequest>,
    },
    Done(String),
}

/// Agent that lets a reasoning engine call tools until it produces an answer.
pub struct Agent<X> {
    engine: Arc<dyn ReasoningEngine>,
    executor: X,
    max_iterations: usize,
}

impl<X: ToolExecutor> Agent<X> {
    pub fn new(engine: Arc<dyn ReasoningEngine>, executor: X) -> Self {
        Self {
            engine,
            executor,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run the loop for `goal` until the engine answers, fails, or `cancel` fires.
    #[instrument(
        skip_all,
        fields(model = %self.engine.model(), tools = self.executor.registry().len())
    )]
    pub async fn run(
        &self,
        goal: &str,
        system: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse> {
        let mut transcript = Transcript::new(goal);
        let mut tool_calls = Vec::new();
        let mut iterations = 0;
        let mut state = LoopState::AwaitingEngine;

        loop {
            state = match state {
                LoopState::AwaitingEngine => {
                    if iterations >= self.max_iterations {
                        return Err(PodcraftError::IterationLimit(self.max_iterations));
                    }
                    iterations += 1;
                    debug!("Agent iteration {}", iterations);

                    let request = EngineRequest {
                        system,
                        tools: self.executor.registry().declarations(),
                        transcript: &transcript,
                    };
                    let response = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(PodcraftError::Cancelled),
                        response = self.engine.respond(&request) => response?,
                    };
                    next_state(response)?
                }
                LoopState::ExecutingTools { text, requests } => {
                    let results = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(PodcraftError::Cancelled),
                        results = self.execute_all(&requests) => results?,
                    };

                    tool_calls.extend(requests.iter().zip(&results).map(|(req, res)| {
                        ToolCallRecord {
                            name: req.tool_name.clone(),
                            arguments: Value::Object(req.arguments.clone()).to_string(),
                            result: res.content.clone(),
                            is_error: res.is_error,
                        }
                    }));

                    transcript.push(Turn::AssistantToolRequests { text, requests });
                    transcript.push(Turn::ToolResults { results });
                    LoopState::AwaitingEngine
                }
                LoopState::Done(content) => {
                    info!(iterations, tool_calls = tool_calls.len(), "Agent finished");
                    transcript.push(Turn::AssistantFinal {
                        text: content.clone(),
                    });
                    return Ok(AgentResponse {
                        content,
                        tool_calls,
                        iterations,
                        transcript,
                    });
                }
            };
        }
    }

    /// Run every request concurrently; results come back in request order.
    async fn execute_all(
        &self,
        requests: &[ToolInvocationRequest],
    ) -> Result<Vec<ToolInvocationResult>> {
        join_all(requests.iter().map(|request| self.execute_one(request)))
            .await
            .into_iter()
            .collect()
    }

    async fn execute_one(&self, request: &ToolInvocationRequest) -> Result<ToolInvocationResult> {
        let name = &request.tool_name;
        let args = serde_json::Value::Object(request.arguments.clone());
        info!("Agent calling tool: {} with args: {}", name, args);

        if !self.executor.registry().contains(name) {
            warn!(tool = %name, "Engine requested an unknown tool");
            return Ok(ToolInvocationResult::error(
                &request.invocation_id,
                format!("Unknown tool: {name}"),
            ));
        }

        match self.executor.invoke(name, &request.arguments).await {
            Ok(content) => {
                debug!(tool = %name, "Tool result: {}", preview(&content));
                Ok(ToolInvocationResult::success(&request.invocation_id, content))
            }
            Err(InvokeError::Recoverable(message)) => {
                warn!(tool = %name, "Tool error: {}", preview(&message));
                Ok(ToolInvocationResult::error(&request.invocation_id, message))
            }
            Err(InvokeError::Fatal(e)) => Err(e),
        }
    }
}

/// Decide what to do with an engine response.
fn next_state(response: EngineResponse) -> Result<LoopState> {
    if !response.has_tool_use() {
        return match response.joined_text() {
            Some(text) => Ok(LoopState::Done(text)),
            None => Err(PodcraftError::EmptyResponse),
        };
    }

    let text = response.joined_text();
    let requests = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(ToolInvocationRequest {
                invocation_id: id,
                tool_name: name,
                arguments: into_arguments(input),
            }),
            ContentBlock::Text { .. } => None,
        })
        .collect();

    Ok(LoopState::ExecutingTools { text, requests })
}

fn into_arguments(input: Value) -> Map<String, Value> {
    match input {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("input".to_string(), other);
            map
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final response content from the agent.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (engine queries) used.
    pub iterations: usize,
    pub transcript: Transcript,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
    pub is_error: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
