//! In-memory MCP peer for exercising the session, lifecycle and agent loop
//! without spawning processes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::errors::McpError;
use super::lifecycle::Launcher;
use super::transport::Transport;

/// What the fake returns for a `tools/call`.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(Vec<String>),
    ToolError(String),
    RpcError(i32, String),
    Raw(Value),
    /// Never answer.
    Silent,
}

#[derive(Debug, Clone)]
pub struct FakeTool {
    reply: FakeReply,
    delay: Duration,
}

impl FakeTool {
    pub fn text(blocks: &[&str]) -> Self {
        Self::reply(FakeReply::Text(blocks.iter().map(|s| s.to_string()).collect()))
    }

    pub fn reply(reply: FakeReply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
pub struct FakeServerBuilder {
    tools: Vec<(String, FakeTool)>,
    reject_initialize: bool,
    failing_stop: bool,
}

impl FakeServerBuilder {
    pub fn tool(mut self, name: &str, tool: FakeTool) -> Self {
        self.tools.push((name.to_string(), tool));
        self
    }

    pub fn reject_initialize(mut self) -> Self {
        self.reject_initialize = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.failing_stop = true;
        self
    }

    pub fn build(self) -> Arc<FakeServer> {
        let (outbox, inbox) = mpsc::unbounded_channel();
        Arc::new(FakeServer {
            order: self.tools.iter().map(|(name, _)| name.clone()).collect(),
            tools: self.tools.into_iter().collect(),
            reject_initialize: self.reject_initialize,
            failing_stop: self.failing_stop,
            outbox,
            inbox: tokio::sync::Mutex::new(inbox),
            hung_up: CancellationToken::new(),
            methods: Mutex::new(Vec::new()),
            stop_calls: AtomicUsize::new(0),
        })
    }
}

fn envelope(id: Value, body: Value) -> String {
    let mut message = json!({"jsonrpc": "2.0", "id": id});
    if let (Some(target), Value::Object(fields)) = (message.as_object_mut(), body) {
        target.extend(fields);
    }
    message.to_string()
}

/// Scripted MCP server speaking JSON-RPC lines through [`Transport`].
pub struct FakeServer {
    order: Vec<String>,
    tools: HashMap<String, FakeTool>,
    reject_initialize: bool,
    failing_stop: bool,
    outbox: mpsc::UnboundedSender<String>,
    inbox: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
    hung_up: CancellationToken,
    methods: Mutex<Vec<String>>,
    stop_calls: AtomicUsize,
}

impl FakeServer {
    pub fn builder() -> FakeServerBuilder {
        FakeServerBuilder::default()
    }

    /// Methods received so far, in arrival order.
    pub fn methods(&self) -> Vec<String> {
        self.methods.lock().unwrap().clone()
    }

    /// Number of `stop` calls received.
    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Simulate the peer process exiting.
    pub fn hang_up(&self) {
        self.hung_up.cancel();
    }

    fn respond(&self, id: Value, body: Value) {
        let _ = self.outbox.send(envelope(id, body));
    }

    fn handle_call(&self, id: Value, params: &Value) {
        let name = params["name"].as_str().unwrap_or_default().to_string();
        let Some(tool) = self.tools.get(&name).cloned() else {
            self.respond(
                id,
                json!({"result": {
                    "content": [{"type": "text", "text": format!("Unknown tool: {name}")}],
                    "isError": true
                }}),
            );
            return;
        };

        let body = match tool.reply {
            FakeReply::Silent => return,
            FakeReply::Text(blocks) => json!({"result": {
                "content": blocks
                    .iter()
                    .map(|text| json!({"type": "text", "text": text}))
                    .collect::<Vec<_>>()
            }}),
            FakeReply::ToolError(message) => json!({"result": {
                "content": [{"type": "text", "text": message}],
                "isError": true
            }}),
            FakeReply::RpcError(code, message) => {
                json!({"error": {"code": code, "message": message}})
            }
            FakeReply::Raw(result) => json!({ "result": result }),
        };

        let outbox = self.outbox.clone();
        let delay = tool.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = outbox.send(envelope(id, body));
        });
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn send(&self, message: String) -> Result<(), McpError> {
        if self.hung_up.is_cancelled() {
            return Err(McpError::Closed);
        }

        let request: Value =
            serde_json::from_str(&message).map_err(|e| McpError::Protocol(e.to_string()))?;
        let method = request["method"].as_str().unwrap_or_default().to_string();
        self.methods.lock().unwrap().push(method.clone());

        let Some(id) = request.get("id").cloned() else {
            return Ok(());
        };

        match method.as_str() {
            "initialize" if self.reject_initialize => self.respond(
                id,
                json!({"error": {"code": -32603, "message": "initialization refused"}}),
            ),
            "initialize" => self.respond(
                id,
                json!({"result": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {"listChanged": false}},
                    "serverInfo": {"name": "fake-arxiv", "version": "0.0.1"}
                }}),
            ),
            "tools/list" => {
                let tools: Vec<Value> = self
                    .order
                    .iter()
                    .map(|name| {
                        json!({
                            "name": name,
                            "description": format!("Fake {name} tool"),
                            "inputSchema": {"type": "object", "properties": {}}
                        })
                    })
                    .collect();
                self.respond(id, json!({"result": {"tools": tools}}));
            }
            "tools/call" => self.handle_call(id, &request["params"]),
            other => self.respond(
                id,
                json!({"error": {"code": -32601, "message": format!("Method not found: {other}")}}),
            ),
        }
        Ok(())
    }

    async fn receive(&self) -> Result<String, McpError> {
        let mut inbox = self.inbox.lock().await;
        tokio::select! {
            _ = self.hung_up.cancelled() => Err(McpError::Eof),
            line = inbox.recv() => line.ok_or(McpError::Eof),
        }
    }

    async fn stop(&self) -> Result<(), McpError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.hung_up.cancel();
        if self.failing_stop {
            return Err(McpError::Io("kill failed: operation not permitted".to_string()));
        }
        Ok(())
    }
}

/// Launcher handing out a prepared [`FakeServer`], or failing like a missing binary.
pub struct FakeLauncher {
    server: Option<Arc<FakeServer>>,
    launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(server: Arc<FakeServer>) -> Self {
        Self {
            server: Some(server),
            launches: AtomicUsize::new(0),
        }
    }

    pub fn missing_executable() -> Self {
        Self {
            server: None,
            launches: AtomicUsize::new(0),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn Transport>, McpError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        match &self.server {
            Some(server) => {
                let transport: Arc<dyn Transport> = server.clone();
                Ok(transport)
            }
            None => Err(McpError::Launch {
                command: "arxiv-mcp-server".to_string(),
                reason: "No such file or directory (os error 2)".to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        "fake-arxiv".to_string()
    }
}
