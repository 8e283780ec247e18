//! Error types for Podcraft.

use crate::mcp::McpError;
use std::fmt;
use thiserror::Error;

/// Library-level error type for Podcraft operations.
#[derive(Error, Debug)]
pub enum PodcraftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to launch tool provider: {0}")]
    Launch(String),

    #[error("Tool provider protocol error: {0}")]
    Protocol(String),

    #[error("Reasoning engine error: {0}")]
    Engine(String),

    #[error("Reasoning engine returned neither tool calls nor text")]
    EmptyResponse,

    #[error("Agent exceeded maximum iterations ({0})")]
    IterationLimit(usize),

    #[error("Generation was cancelled")]
    Cancelled,

    #[error("Research source error: {0}")]
    Research(String),

    #[error("Speech synthesis failed: {0}")]
    Audio(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<McpError> for PodcraftError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::Launch { .. } => PodcraftError::Launch(err.to_string()),
            other => PodcraftError::Protocol(other.to_string()),
        }
    }
}

/// Result type alias for Podcraft operations.
pub type Result<T> = std::result::Result<T, PodcraftError>;

/// Category of a failed script generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Launch,
    Protocol,
    Engine,
    EmptyResponse,
    IterationLimit,
    Cancelled,
    Config,
    InvalidInput,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Launch => "launch",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Engine => "engine",
            ErrorKind::EmptyResponse => "empty_response",
            ErrorKind::IterationLimit => "iteration_limit",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "config",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// The single error surfaced by [`crate::script::ScriptGenerator::generate_script`].
///
/// Carries the kind of the underlying failure plus its message, so callers
/// (CLI, HTTP route) can report it without depending on internal error types.
#[derive(Error, Debug, Clone)]
#[error("script generation failed ({kind}): {message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GenerationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<PodcraftError> for GenerationError {
    fn from(err: PodcraftError) -> Self {
        let kind = match &err {
            PodcraftError::Launch(_) => ErrorKind::Launch,
            PodcraftError::Protocol(_) => ErrorKind::Protocol,
            PodcraftError::Engine(_) | PodcraftError::Http(_) => ErrorKind::Engine,
            PodcraftError::EmptyResponse => ErrorKind::EmptyResponse,
            PodcraftError::IterationLimit(_) => ErrorKind::IterationLimit,
            PodcraftError::Cancelled => ErrorKind::Cancelled,
            PodcraftError::Config(_) | PodcraftError::TomlParse(_) => ErrorKind::Config,
            PodcraftError::InvalidInput(_) => ErrorKind::InvalidInput,
            PodcraftError::Research(_)
            | PodcraftError::Audio(_)
            | PodcraftError::Io(_)
            | PodcraftError::Json(_) => ErrorKind::Internal,
        };
        GenerationError::new(kind, err.to_string())
    }
}
