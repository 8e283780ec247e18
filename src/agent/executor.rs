//! The seam between the agent loop and whatever actually runs tools.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use super::registry::ToolRegistry;
use crate::error::PodcraftError;
use crate::mcp::McpError;

/// Failure of a single tool invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Reported back to the engine as error content; the loop continues.
    #[error("{0}")]
    Recoverable(String),

    /// Aborts the run.
    #[error(transparent)]
    Fatal(#[from] PodcraftError),
}

impl From<McpError> for InvokeError {
    fn from(err: McpError) -> Self {
        if err.is_tool_error() {
            InvokeError::Recoverable(err.to_string())
        } else {
            InvokeError::Fatal(err.into())
        }
    }
}

/// Runs tools by name on behalf of the agent.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tools this executor can run.
    fn registry(&self) -> &ToolRegistry;

    /// Run one tool and return its text content.
    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, InvokeError>;
}
