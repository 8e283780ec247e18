//! Tool execution routed through an MCP session.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::session::McpSession;
use crate::agent::{InvokeError, ToolExecutor, ToolRegistry};

/// Runs the provider's tools for the agent loop.
///
/// Handed to the body of [`super::McpLifecycle::run`]; it does not outlive
/// the provider process.
pub struct McpToolExecutor {
    session: Arc<McpSession>,
    registry: ToolRegistry,
}

impl McpToolExecutor {
    pub fn new(session: Arc<McpSession>, registry: ToolRegistry) -> Self {
        Self { session, registry }
    }

    pub fn into_registry(self) -> ToolRegistry {
        self.registry
    }
}

#[async_trait]
impl ToolExecutor for McpToolExecutor {
    fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, InvokeError> {
        if !self.registry.contains(name) {
            return Err(InvokeError::Recoverable(format!("Unknown tool: {name}")));
        }
        Ok(self.session.call_tool(name, arguments).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::session::SessionTimeouts;
    use crate::mcp::testing::{FakeReply, FakeServer, FakeTool};
    use serde_json::json;

    async fn executor(server: Arc<FakeServer>) -> McpToolExecutor {
        let session = Arc::new(McpSession::new(server, SessionTimeouts::default()));
        session.handshake().await.unwrap();
        let tools = session.list_tools().await.unwrap();
        McpToolExecutor::new(session, ToolRegistry::from_descriptors(tools))
    }

    #[tokio::test]
    async fn test_unknown_tool_never_reaches_provider() {
        let server = FakeServer::builder()
            .tool("search_papers", FakeTool::text(&["ok"]))
            .build();
        let executor = executor(server.clone()).await;

        let err = executor.invoke("summarize", &Map::new()).await.unwrap_err();
        assert!(matches!(err, InvokeError::Recoverable(ref m) if m == "Unknown tool: summarize"));
        assert!(!server.methods().contains(&"tools/call".to_string()));
    }

    #[tokio::test]
    async fn test_tool_error_is_recoverable() {
        let server = FakeServer::builder()
            .tool(
                "download_paper",
                FakeTool::reply(FakeReply::ToolError("paper 9999.99999 not found".into())),
            )
            .build();
        let executor = executor(server).await;

        let args = json!({"paper_id": "9999.99999"});
        let err = executor
            .invoke("download_paper", args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Recoverable(ref m) if m.contains("not found")));
    }

    #[tokio::test]
    async fn test_closed_session_is_fatal() {
        let server = FakeServer::builder()
            .tool("search_papers", FakeTool::text(&["ok"]))
            .build();
        let executor = executor(server.clone()).await;
        executor.session.close().await.unwrap();

        let err = executor.invoke("search_papers", &Map::new()).await.unwrap_err();
        assert!(matches!(err, InvokeError::Fatal(_)));
    }
}
