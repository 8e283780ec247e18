//! MCP client session on top of a [`Transport`].
//!
//! A background reader task owns the receive side and routes each response to
//! the caller waiting on its request id, so concurrent `tools/call` requests
//! can be in flight at once.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::{json, Map, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::errors::McpError;
use super::protocol::{
    ClientInfo, InitializeParams, InitializeResult, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, ToolCallParams, ToolCallResult, ToolsListResult, PROTOCOL_VERSION,
};
use super::transport::Transport;
use crate::agent::ToolDescriptor;

/// Upper bound on `tools/list` pages followed through `nextCursor`.
const MAX_LIST_PAGES: usize = 64;

/// How long `close` waits for the reader task to notice cancellation.
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Unconnected = 0,
    Handshaking = 1,
    Ready = 2,
    Closed = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Unconnected,
            1 => SessionState::Handshaking,
            2 => SessionState::Ready,
            _ => SessionState::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Unconnected => write!(f, "unconnected"),
            SessionState::Handshaking => write!(f, "handshaking"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

/// Timeouts applied to session requests.
#[derive(Debug, Clone, Copy)]
pub struct SessionTimeouts {
    /// Bound on the `initialize` exchange.
    pub init: Duration,
    /// Bound on each `tools/list` and `tools/call` request.
    pub call: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            init: Duration::from_secs(30),
            call: Duration::from_secs(120),
        }
    }
}

type PendingMap = HashMap<u64, oneshot::Sender<JsonRpcResponse>>;

/// State shared with the reader task.
struct Shared {
    state: AtomicU8,
    pending: Mutex<PendingMap>,
}

impl Shared {
    fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    fn pending(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Route one inbound line to its waiting caller.
    fn dispatch(&self, line: &str) {
        let message: JsonRpcResponse = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                trace!(error = %e, "Skipping non JSON-RPC line from tool provider");
                return;
            }
        };

        let Some(id) = message.request_id() else {
            trace!(method = ?message.method, "Ignoring server-initiated message");
            return;
        };

        match self.pending().remove(&id) {
            Some(slot) => {
                // Receiver may have given up (timeout or cancellation).
                let _ = slot.send(message);
            }
            None => debug!(id, "Response for unknown or expired request"),
        }
    }

    /// Drop every pending slot; waiting callers observe [`McpError::Closed`].
    fn fail_pending(&self) {
        let drained = self.pending().drain().count();
        if drained > 0 {
            debug!(count = drained, "Failed pending requests on close");
        }
    }
}

/// Removes a pending slot when the waiting call finishes for any reason.
struct PendingSlot<'a> {
    shared: &'a Shared,
    id: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        self.shared.pending().remove(&self.id);
    }
}

/// An MCP client session bound to one tool-provider process.
pub struct McpSession {
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    timeouts: SessionTimeouts,
    shutdown: CancellationToken,
    reader: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl McpSession {
    /// Create a session and start reading from the transport.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(transport: Arc<dyn Transport>, timeouts: SessionTimeouts) -> Self {
        let shared = Arc::new(Shared {
            state: AtomicU8::new(SessionState::Unconnected as u8),
            pending: Mutex::new(HashMap::new()),
        });
        let shutdown = CancellationToken::new();

        let reader = tokio::spawn(read_loop(
            Arc::clone(&transport),
            Arc::clone(&shared),
            shutdown.clone(),
        ));

        Self {
            transport,
            shared,
            next_id: AtomicU64::new(1),
            timeouts,
            shutdown,
            reader: Mutex::new(Some(reader)),
            closed: AtomicBool::new(false),
        }
    }

    /// Current connection state.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Perform the `initialize` exchange. Must be the first call on a session.
    #[instrument(skip(self))]
    pub async fn handshake(&self) -> Result<InitializeResult, McpError> {
        if let Err(current) = self.shared.state.compare_exchange(
            SessionState::Unconnected as u8,
            SessionState::Handshaking as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            return Err(McpError::Protocol(format!(
                "handshake not allowed in state {}",
                SessionState::from_u8(current)
            )));
        }

        match self.initialize().await {
            Ok(result) => {
                // The reader may already have seen the peer exit.
                if self
                    .shared
                    .state
                    .compare_exchange(
                        SessionState::Handshaking as u8,
                        SessionState::Ready as u8,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    )
                    .is_err()
                {
                    return Err(McpError::Closed);
                }
                let server = result
                    .server_info
                    .as_ref()
                    .and_then(|info| info.name.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                info!(
                    server = %server,
                    protocol = %result.protocol_version,
                    "Connected to tool provider"
                );
                Ok(result)
            }
            Err(e) => {
                self.shared.set_state(SessionState::Closed);
                Err(match e {
                    McpError::Protocol(_) => e,
                    other => McpError::Protocol(format!("handshake failed: {other}")),
                })
            }
        }
    }

    async fn initialize(&self) -> Result<InitializeResult, McpError> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        let params = serde_json::to_value(params)
            .map_err(|e| McpError::Protocol(format!("failed to encode initialize: {e}")))?;

        let response = self
            .request("initialize", Some(params), self.timeouts.init)
            .await?;
        let value = response.into_result().map_err(|e| {
            McpError::Protocol(format!("initialize rejected [{}]: {}", e.code, e.message))
        })?;
        let result: InitializeResult = serde_json::from_value(value)
            .map_err(|e| McpError::Protocol(format!("malformed initialize result: {e}")))?;

        self.notify("notifications/initialized", None, self.timeouts.init).await?;
        Ok(result)
    }

    /// Query the tools the peer currently exposes.
    #[instrument(skip(self))]
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, McpError> {
        self.ensure_ready()?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let response = self
                .request("tools/list", params, self.timeouts.call)
                .await?;
            let value = response.into_result().map_err(|e| {
                McpError::Protocol(format!("tools/list failed [{}]: {}", e.code, e.message))
            })?;
            let page: ToolsListResult = serde_json::from_value(value)
                .map_err(|e| McpError::Protocol(format!("malformed tools/list result: {e}")))?;

            tools.extend(page.tools.into_iter().map(|tool| ToolDescriptor {
                name: tool.name,
                description: tool.description.unwrap_or_default(),
                input_schema: tool.input_schema,
            }));

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        warn!(pages = MAX_LIST_PAGES, "tools/list pagination did not terminate");
        Ok(tools)
    }

    /// Invoke a tool and return its text content.
    #[instrument(skip(self, arguments))]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<String, McpError> {
        self.ensure_ready()?;

        let params = serde_json::to_value(ToolCallParams { name, arguments })
            .map_err(|e| McpError::Protocol(format!("failed to encode arguments: {e}")))?;

        let response = self
            .request("tools/call", Some(params), self.timeouts.call)
            .await?;

        let value = response.into_result().map_err(|e| McpError::Tool {
            name: name.to_string(),
            message: format!("[{}] {}", e.code, e.message),
        })?;

        let result: ToolCallResult = serde_json::from_value(value).map_err(|e| {
            McpError::Protocol(format!("malformed tools/call result for '{name}': {e}"))
        })?;

        let text = result.joined_text();
        if result.is_error {
            return Err(McpError::Tool {
                name: name.to_string(),
                message: text,
            });
        }
        Ok(text)
    }

    /// Close the session and stop the transport. Idempotent.
    ///
    /// Returns the transport's teardown error, if any.
    pub async fn close(&self) -> Result<(), McpError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.shared.set_state(SessionState::Closed);
        self.shutdown.cancel();
        self.shared.fail_pending();

        let reader = self
            .reader
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(mut handle) = reader {
            if tokio::time::timeout(READER_JOIN_TIMEOUT, &mut handle)
                .await
                .is_err()
            {
                handle.abort();
            }
        }

        self.transport.stop().await
    }

    fn ensure_ready(&self) -> Result<(), McpError> {
        match self.state() {
            SessionState::Ready => Ok(()),
            other => Err(McpError::NotReady(other)),
        }
    }

    /// Send a request and wait for its response. `timeout` bounds the write
    /// and the wait together.
    async fn request(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<JsonRpcResponse, McpError> {
        let deadline = Instant::now() + timeout;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        self.shared.pending().insert(id, tx);
        let _slot = PendingSlot {
            shared: &self.shared,
            id,
        };

        // The reader marks the session closed before draining, so a slot
        // inserted after the drain is caught here.
        if self.state() == SessionState::Closed {
            return Err(McpError::Closed);
        }

        let line = serde_json::to_string(&JsonRpcRequest::new(id, method, params))
            .map_err(|e| McpError::Protocol(format!("failed to encode request: {e}")))?;
        self.send_before(deadline, method, timeout, line).await?;

        match tokio::time::timeout_at(deadline, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(McpError::Closed),
            Err(_) => Err(timeout_error(method, timeout)),
        }
    }

    async fn notify(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<(), McpError> {
        let line = serde_json::to_string(&JsonRpcNotification::new(method, params))
            .map_err(|e| McpError::Protocol(format!("failed to encode notification: {e}")))?;
        self.send_before(Instant::now() + timeout, method, timeout, line).await
    }

    /// Write one line before `deadline`.
    ///
    /// A write that stalls may leave half a line on the wire, so the session
    /// is closed rather than left `Ready` on a desynchronised stream.
    async fn send_before(
        &self,
        deadline: Instant,
        method: &str,
        timeout: Duration,
        line: String,
    ) -> Result<(), McpError> {
        match tokio::time::timeout_at(deadline, self.transport.send(line)).await {
            Ok(sent) => sent,
            Err(_) => {
                warn!(method, "Write to tool provider stalled, closing session");
                self.shared.set_state(SessionState::Closed);
                self.shutdown.cancel();
                self.shared.fail_pending();
                Err(timeout_error(method, timeout))
            }
        }
    }
}

fn timeout_error(method: &str, timeout: Duration) -> McpError {
    McpError::Timeout {
        method: method.to_string(),
        timeout_ms: timeout.as_millis() as u64,
    }
}

impl Drop for McpSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn read_loop(
    transport: Arc<dyn Transport>,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = transport.receive() => received,
        };

        match received {
            Ok(line) => shared.dispatch(&line),
            Err(McpError::Protocol(reason)) => {
                warn!(reason = %reason, "Skipping unreadable message from tool provider");
            }
            Err(e) => {
                debug!(error = %e, "Tool provider stream ended");
                break;
            }
        }
    }

    shared.set_state(SessionState::Closed);
    shared.fail_pending();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::testing::{FakeReply, FakeServer, FakeTool};
    use serde_json::json;

    fn timeouts(call_ms: u64) -> SessionTimeouts {
        SessionTimeouts {
            init: Duration::from_secs(2),
            call: Duration::from_millis(call_ms),
        }
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_calls_before_handshake_are_not_ready() {
        let server = FakeServer::builder().build();
        let session = McpSession::new(server.clone(), timeouts(500));

        assert_eq!(session.state(), SessionState::Unconnected);
        assert!(matches!(
            session.list_tools().await,
            Err(McpError::NotReady(SessionState::Unconnected))
        ));
        assert!(matches!(
            session.call_tool("search_papers", &Map::new()).await,
            Err(McpError::NotReady(_))
        ));
        assert!(server.methods().is_empty());
    }

    #[tokio::test]
    async fn test_handshake_then_list_tools() {
        let server = FakeServer::builder()
            .tool("search_papers", FakeTool::text(&["ok"]))
            .tool("read_paper", FakeTool::text(&["ok"]))
            .build();
        let session = McpSession::new(server.clone(), timeouts(500));

        let init = session.handshake().await.unwrap();
        assert_eq!(init.protocol_version, PROTOCOL_VERSION);
        assert_eq!(session.state(), SessionState::Ready);

        let tools = session.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["search_papers", "read_paper"]);
        assert_eq!(
            server.methods(),
            vec!["initialize", "notifications/initialized", "tools/list"]
        );
    }

    #[tokio::test]
    async fn test_handshake_only_once() {
        let server = FakeServer::builder().build();
        let session = McpSession::new(server, timeouts(500));
        session.handshake().await.unwrap();
        assert!(matches!(
            session.handshake().await,
            Err(McpError::Protocol(_))
        ));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_rejected_handshake_closes_session() {
        let server = FakeServer::builder().reject_initialize().build();
        let session = McpSession::new(server, timeouts(500));

        let err = session.handshake().await.unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_text_blocks_joined_with_newline() {
        let server = FakeServer::builder()
            .tool(
                "read_paper",
                FakeTool::reply(FakeReply::Raw(json!({
                    "content": [
                        {"type": "text", "text": "Abstract"},
                        {"type": "resource", "resource": {"uri": "file:///x.pdf"}},
                        {"type": "text", "text": "Introduction"}
                    ]
                }))),
            )
            .build();
        let session = McpSession::new(server, timeouts(500));
        session.handshake().await.unwrap();

        let text = session
            .call_tool("read_paper", &args(json!({"paper_id": "2401.00001"})))
            .await
            .unwrap();
        assert_eq!(text, "Abstract\nIntroduction");
    }

    #[tokio::test]
    async fn test_is_error_result_is_tool_error() {
        let server = FakeServer::builder()
            .tool(
                "download_paper",
                FakeTool::reply(FakeReply::ToolError("paper not found".into())),
            )
            .build();
        let session = McpSession::new(server, timeouts(500));
        session.handshake().await.unwrap();

        match session.call_tool("download_paper", &Map::new()).await {
            Err(McpError::Tool { name, message }) => {
                assert_eq!(name, "download_paper");
                assert_eq!(message, "paper not found");
            }
            other => panic!("expected tool error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rpc_error_is_tool_error() {
        let server = FakeServer::builder()
            .tool(
                "search_papers",
                FakeTool::reply(FakeReply::RpcError(-32602, "Invalid params".into())),
            )
            .build();
        let session = McpSession::new(server, timeouts(500));
        session.handshake().await.unwrap();

        let err = session
            .call_tool("search_papers", &Map::new())
            .await
            .unwrap_err();
        assert!(err.is_tool_error());
        assert!(err.to_string().contains("[-32602] Invalid params"));
    }

    #[tokio::test]
    async fn test_malformed_result_is_protocol_error() {
        let server = FakeServer::builder()
            .tool(
                "search_papers",
                FakeTool::reply(FakeReply::Raw(json!({"content": "not a list"}))),
            )
            .build();
        let session = McpSession::new(server, timeouts(500));
        session.handshake().await.unwrap();

        assert!(matches!(
            session.call_tool("search_papers", &Map::new()).await,
            Err(McpError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_leaves_session_usable() {
        let server = FakeServer::builder()
            .tool("slow", FakeTool::reply(FakeReply::Silent))
            .tool("fast", FakeTool::text(&["done"]))
            .build();
        let session = McpSession::new(server, timeouts(100));
        session.handshake().await.unwrap();

        let err = session.call_tool("slow", &Map::new()).await.unwrap_err();
        assert!(matches!(err, McpError::Timeout { .. }));
        assert!(session.shared.pending().is_empty());
        assert_eq!(session.state(), SessionState::Ready);

        assert_eq!(session.call_tool("fast", &Map::new()).await.unwrap(), "done");
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_demultiplexed() {
        let server = FakeServer::builder()
            .tool("a", FakeTool::text(&["from a"]).delayed(Duration::from_millis(80)))
            .tool("b", FakeTool::text(&["from b"]))
            .build();
        let session = McpSession::new(server, timeouts(1000));
        session.handshake().await.unwrap();

        let empty = Map::new();
        let (a, b) = tokio::join!(
            session.call_tool("a", &empty),
            session.call_tool("b", &empty)
        );
        assert_eq!(a.unwrap(), "from a");
        assert_eq!(b.unwrap(), "from b");
    }

    #[tokio::test]
    async fn test_close_fails_pending_and_stops_once() {
        let server = FakeServer::builder()
            .tool("slow", FakeTool::reply(FakeReply::Silent))
            .build();
        let session = Arc::new(McpSession::new(server.clone(), timeouts(10_000)));
        session.handshake().await.unwrap();

        let pending = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.call_tool("slow", &Map::new()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        session.close().await.unwrap();
        session.close().await.unwrap();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(McpError::Closed)));
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(server.stop_count(), 1);
    }

    /// Answers the first request it is sent, then reports end of stream.
    struct AnswerOnceThenExit {
        ids: tokio::sync::mpsc::UnboundedSender<Value>,
        incoming: tokio::sync::Mutex<tokio::sync::mpsc::UnboundedReceiver<Value>>,
        answered: AtomicBool,
    }

    impl AnswerOnceThenExit {
        fn new() -> Arc<Self> {
            let (ids, incoming) = tokio::sync::mpsc::unbounded_channel();
            Arc::new(Self {
                ids,
                incoming: tokio::sync::Mutex::new(incoming),
                answered: AtomicBool::new(false),
            })
        }
    }

    #[async_trait::async_trait]
    impl Transport for AnswerOnceThenExit {
        async fn send(&self, message: String) -> Result<(), McpError> {
            let message: Value = serde_json::from_str(&message).unwrap();
            if let Some(id) = message.get("id") {
                let _ = self.ids.send(id.clone());
            }
            Ok(())
        }

        async fn receive(&self) -> Result<String, McpError> {
            if self.answered.swap(true, Ordering::SeqCst) {
                return Err(McpError::Eof);
            }
            let id = self.incoming.lock().await.recv().await.ok_or(McpError::Eof)?;
            Ok(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": {"protocolVersion": PROTOCOL_VERSION, "capabilities": {}}
            })
            .to_string())
        }

        async fn stop(&self) -> Result<(), McpError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_peer_exit_during_handshake_is_not_ready() {
        let session = McpSession::new(AnswerOnceThenExit::new(), timeouts(500));

        assert!(matches!(session.handshake().await, Err(McpError::Closed)));
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.list_tools().await,
            Err(McpError::NotReady(SessionState::Closed))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_call_times_out_when_peer_stops_reading() {
        use crate::mcp::transport::{ServerCommand, StdioTransport};

        // Completes the handshake, then never reads stdin again.
        let init = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"protocolVersion": PROTOCOL_VERSION, "capabilities": {}}
        });
        let script = format!("read line; echo '{init}'; read line; exec sleep 30");
        let mut cmd = ServerCommand::new("sh", vec!["-c".into(), script]);
        cmd.shutdown_grace = Duration::from_millis(100);
        let transport = Arc::new(StdioTransport::start(&cmd).unwrap());
        let session = McpSession::new(transport, timeouts(200));
        session.handshake().await.unwrap();

        let blob = "x".repeat(1024 * 1024);
        let started = std::time::Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            session.call_tool("search_papers", &args(json!({ "query": blob }))),
        )
        .await
        .expect("call must respect its own timeout");

        assert!(matches!(
            outcome,
            Err(McpError::Timeout { .. }) | Err(McpError::Closed)
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(session.state(), SessionState::Closed);

        let started = std::time::Instant::now();
        let closed = tokio::time::timeout(Duration::from_secs(5), session.close()).await;
        assert!(matches!(closed, Ok(Ok(()))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_peer_exit_closes_session() {
        let server = FakeServer::builder().build();
        let session = McpSession::new(server.clone(), timeouts(500));
        session.handshake().await.unwrap();

        server.hang_up();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.list_tools().await,
            Err(McpError::NotReady(SessionState::Closed))
        ));
    }
}
