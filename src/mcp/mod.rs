//! MCP (Model Context Protocol) client.
//!
//! Launches a tool-provider process, speaks JSON-RPC 2.0 to it over stdio,
//! and exposes its tools to the agent loop for the length of one conversation.

mod errors;
mod lifecycle;
mod protocol;
mod session;
mod tools;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::McpError;
pub use lifecycle::{Launcher, McpLifecycle, StdioLauncher};
pub use protocol::{EMPTY_RESULT_TEXT, PROTOCOL_VERSION};
pub use session::{McpSession, SessionState, SessionTimeouts};
pub use tools::McpToolExecutor;
pub use transport::{ServerCommand, StdioTransport, Transport};
