//! Conversation record exchanged with the reasoning engine.

use serde::Serialize;
use serde_json::{Map, Value};

/// One tool call requested by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocationRequest {
    /// Engine-assigned id, echoed back in the matching result.
    pub invocation_id: String,
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

/// Outcome of one tool call, fed back to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolInvocationResult {
    pub invocation_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolInvocationResult {
    pub fn success(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(invocation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    UserGoal {
        text: String,
    },
    AssistantToolRequests {
        /// Text the engine emitted alongside its tool calls.
        text: Option<String>,
        requests: Vec<ToolInvocationRequest>,
    },
    ToolResults {
        results: Vec<ToolInvocationResult>,
    },
    AssistantFinal {
        text: String,
    },
}

/// Append-only list of turns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::UserGoal { text: goal.into() }],
        }
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}
