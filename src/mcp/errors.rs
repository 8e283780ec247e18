//! MCP client error types.

use super::session::SessionState;
use thiserror::Error;

/// Errors that can occur while talking to a tool-provider process.
#[derive(Debug, Error)]
pub enum McpError {
    /// The child process could not be started.
    #[error("failed to launch '{command}': {reason}")]
    Launch { command: String, reason: String },

    /// Handshake or framing failure, or a response that does not parse.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An operation was attempted before the handshake completed (or after close).
    #[error("session not ready (state: {0})")]
    NotReady(SessionState),

    /// A specific tool invocation failed.
    #[error("tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    /// A request did not receive its response in time.
    #[error("'{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    /// The transport was stopped or the session closed while a call was pending.
    #[error("connection to tool provider closed")]
    Closed,

    /// The peer closed its output stream.
    #[error("tool provider closed its output (process may have exited)")]
    Eof,

    #[error("transport I/O error: {0}")]
    Io(String),
}

impl McpError {
    /// Whether this failure is scoped to a single invocation and can be
    /// reported back to the reasoning engine instead of aborting the run.
    pub fn is_tool_error(&self) -> bool {
        matches!(self, McpError::Tool { .. } | McpError::Timeout { .. })
    }
}
