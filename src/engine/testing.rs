//! Scripted reasoning engine for loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ContentBlock, EngineRequest, EngineResponse, ReasoningEngine, StopReason};
use crate::agent::Turn;
use crate::error::{PodcraftError, Result};

/// A scripted step: a response, an error, or a stall.
pub enum Step {
    Respond(EngineResponse),
    Fail(String),
    Hang,
}

/// Replays [`Step`]s in order and records what it was shown.
pub struct ScriptedEngine {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<Vec<Turn>>>,
    tool_names: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
            tool_names: Mutex::new(Vec::new()),
        }
    }

    /// Transcript snapshot for each query, in order.
    pub fn transcripts(&self) -> Vec<Vec<Turn>> {
        self.seen.lock().unwrap().clone()
    }

    /// Declared tool names for each query.
    pub fn declared_tools(&self) -> Vec<Vec<String>> {
        self.tool_names.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

/// Response requesting the given `(id, name, input)` tool calls.
pub fn tool_calls(calls: &[(&str, &str, Value)]) -> EngineResponse {
    EngineResponse {
        stop_reason: StopReason::ToolUse,
        content: calls
            .iter()
            .map(|(id, name, input)| ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect(),
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn respond(&self, request: &EngineRequest<'_>) -> Result<EngineResponse> {
        self.seen
            .lock()
            .unwrap()
            .push(request.transcript.turns().to_vec());
        self.tool_names
            .lock()
            .unwrap()
            .push(request.tools.iter().map(|t| t.name.clone()).collect());

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Fail(message)) => Err(PodcraftError::Engine(message)),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(PodcraftError::Engine("scripted hang elapsed".into()))
            }
            None => Err(PodcraftError::Engine("script exhausted".into())),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
