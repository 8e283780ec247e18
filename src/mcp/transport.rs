//! Line-delimited transport over a child process's stdio.
//!
//! One JSON message per line in each direction. The [`Transport`] trait is the
//! seam the session is written against, so the protocol layer can be driven
//! by an in-memory peer in tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, trace, warn};

use super::errors::McpError;

/// Upper bound for a single inbound line (full paper texts can be large).
const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// How long `stop` waits for a lock held by an in-flight send/receive.
const LOCK_WAIT: Duration = Duration::from_millis(250);

/// Duplex message channel to a tool-provider peer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write one message. The transport adds the line terminator.
    async fn send(&self, message: String) -> Result<(), McpError>;

    /// Read the next message. Fails with [`McpError::Eof`] once the peer closed.
    async fn receive(&self) -> Result<String, McpError>;

    /// Close the channel and terminate the peer. Idempotent.
    async fn stop(&self) -> Result<(), McpError>;
}

/// How to launch a tool-provider process.
#[derive(Debug, Clone)]
pub struct ServerCommand {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    /// When false the child starts from an empty environment plus `env`.
    pub inherit_env: bool,
    pub cwd: Option<PathBuf>,
    /// Time between closing stdin and force-killing the child.
    pub shutdown_grace: Duration,
}

impl ServerCommand {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            env: HashMap::new(),
            inherit_env: true,
            cwd: None,
            shutdown_grace: Duration::from_secs(2),
        }
    }

    /// Command line as a single string, for logs and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Transport backed by a spawned child process.
pub struct StdioTransport {
    command: String,
    writer: Mutex<Option<FramedWrite<ChildStdin, LinesCodec>>>,
    reader: Mutex<Option<FramedRead<ChildStdout, LinesCodec>>>,
    child: Mutex<Option<Child>>,
    stopped: AtomicBool,
    shutdown_grace: Duration,
}

impl StdioTransport {
    /// Spawn the child and connect to its stdin/stdout.
    ///
    /// A missing or non-executable program fails here, before any I/O.
    pub fn start(server: &ServerCommand) -> Result<Self, McpError> {
        let launch_error = |reason: String| McpError::Launch {
            command: server.display(),
            reason,
        };

        let mut cmd = Command::new(&server.command);
        cmd.args(&server.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if !server.inherit_env {
            cmd.env_clear();
        }
        cmd.envs(&server.env);

        if let Some(dir) = &server.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| launch_error(e.to_string()))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.start_kill();
                return Err(launch_error("failed to capture stdio".to_string()));
            }
        };

        if let Some(stderr) = child.stderr.take() {
            let name = server.command.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %name, "{}", line);
                }
            });
        }

        debug!(command = %server.display(), pid = ?child.id(), "Tool provider started");

        Ok(Self {
            command: server.command.clone(),
            writer: Mutex::new(Some(FramedWrite::new(stdin, LinesCodec::new()))),
            reader: Mutex::new(Some(FramedRead::new(
                stdout,
                LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            ))),
            child: Mutex::new(Some(child)),
            stopped: AtomicBool::new(false),
            shutdown_grace: server.shutdown_grace,
        })
    }

    /// OS process id of the child, while it is owned by this transport.
    pub async fn pid(&self) -> Option<u32> {
        self.child.lock().await.as_ref().and_then(Child::id)
    }

    /// Whether the child is still running.
    pub async fn is_running(&self) -> bool {
        match self.child.lock().await.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&self, message: String) -> Result<(), McpError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(McpError::Closed);
        }

        trace!(server = %self.command, "-> {}", message);

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(McpError::Closed)?;
        writer.send(message).await.map_err(|e| match e {
            LinesCodecError::Io(io) => McpError::Io(format!("failed to write to stdin: {io}")),
            other => McpError::Protocol(other.to_string()),
        })
    }

    async fn receive(&self) -> Result<String, McpError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(McpError::Eof);
        }

        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut().ok_or(McpError::Eof)?;
        match reader.next().await {
            Some(Ok(line)) => {
                trace!(server = %self.command, "<- {}", line);
                Ok(line)
            }
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => Err(McpError::Protocol(format!(
                "message exceeds {MAX_LINE_LENGTH} bytes"
            ))),
            Some(Err(LinesCodecError::Io(e))) => {
                Err(McpError::Io(format!("failed to read from stdout: {e}")))
            }
            None => Err(McpError::Eof),
        }
    }

    async fn stop(&self) -> Result<(), McpError> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // Closing stdin is the termination request for stdio servers. A peer
        // that stopped reading can keep the flush pending, so it shares the
        // grace period and a stuck flush goes straight to kill.
        let stdin_closed = match tokio::time::timeout(LOCK_WAIT, self.writer.lock()).await {
            Ok(mut guard) => match guard.take() {
                Some(mut writer) => {
                    let close = SinkExt::<String>::close(&mut writer);
                    match tokio::time::timeout(self.shutdown_grace, close).await {
                        Ok(_) => true,
                        Err(_) => {
                            warn!(server = %self.command, "stdin flush stalled during stop");
                            false
                        }
                    }
                }
                None => true,
            },
            Err(_) => {
                warn!(server = %self.command, "stdin busy during stop, killing without EOF");
                false
            }
        };

        if let Ok(mut guard) = tokio::time::timeout(LOCK_WAIT, self.reader.lock()).await {
            guard.take();
        }

        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };

        if !stdin_closed {
            return child
                .kill()
                .await
                .map_err(|e| McpError::Io(format!("failed to kill child: {e}")));
        }

        match tokio::time::timeout(self.shutdown_grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(server = %self.command, %status, "Tool provider exited");
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = child.kill().await;
                Err(McpError::Io(format!("failed to wait for child: {e}")))
            }
            Err(_) => {
                debug!(
                    server = %self.command,
                    grace_ms = self.shutdown_grace.as_millis() as u64,
                    "Tool provider did not exit, killing"
                );
                child
                    .kill()
                    .await
                    .map_err(|e| McpError::Io(format!("failed to kill child: {e}")))
            }
        }
    }
}
