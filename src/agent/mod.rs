//! Agentic tool-use loop.
//!
//! A reasoning engine is queried repeatedly with the conversation so far; it
//! either requests tool calls, which are executed and fed back, or answers.

mod executor;
mod registry;
mod runner;
mod tools;
mod transcript;

pub use executor::{InvokeError, ToolExecutor};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use runner::{Agent, AgentResponse, ToolCallRecord, DEFAULT_MAX_ITERATIONS};
pub use tools::{search_tool, StaticToolExecutor, DEFAULT_MAX_RESULTS_CAP, SEARCH_TOOL};
pub use transcript::{ToolInvocationRequest, ToolInvocationResult, Transcript, Turn};
