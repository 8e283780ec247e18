//! Scoped ownership of a tool-provider process.
//!
//! [`McpLifecycle::run`] launches the provider, performs the handshake,
//! discovers its tools and hands an executor to the caller's body. The session
//! is closed exactly once afterwards, however the body ends.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::errors::McpError;
use super::session::{McpSession, SessionTimeouts};
use super::tools::McpToolExecutor;
use super::transport::{ServerCommand, StdioTransport, Transport};
use crate::agent::ToolRegistry;
use crate::error::{PodcraftError, Result};

/// Produces a connected transport to a fresh tool-provider instance.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> std::result::Result<Arc<dyn Transport>, McpError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: Launcher + ?Sized> Launcher for Arc<T> {
    async fn launch(&self) -> std::result::Result<Arc<dyn Transport>, McpError> {
        (**self).launch().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Launches the provider as a child process speaking over stdio.
pub struct StdioLauncher {
    command: ServerCommand,
}

impl StdioLauncher {
    pub fn new(command: ServerCommand) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Launcher for StdioLauncher {
    async fn launch(&self) -> std::result::Result<Arc<dyn Transport>, McpError> {
        let transport: Arc<dyn Transport> = Arc::new(StdioTransport::start(&self.command)?);
        Ok(transport)
    }

    fn describe(&self) -> String {
        self.command.display()
    }
}

/// Owns one provider process for the duration of a body.
pub struct McpLifecycle<L> {
    launcher: L,
    timeouts: SessionTimeouts,
}

impl<L: Launcher> McpLifecycle<L> {
    pub fn new(launcher: L, timeouts: SessionTimeouts) -> Self {
        Self { launcher, timeouts }
    }

    /// Acquire the provider, run `body` with its tools, then tear it down.
    ///
    /// Cancelling `cancel` aborts whichever step is in flight; teardown still
    /// runs. Teardown failures are logged and never replace the body's result.
    #[instrument(skip_all, fields(provider = %self.launcher.describe()))]
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, body: F) -> Result<T>
    where
        F: FnOnce(McpToolExecutor) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let transport = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PodcraftError::Cancelled),
            launched = self.launcher.launch() => launched?,
        };

        let session = Arc::new(McpSession::new(transport, self.timeouts));
        let outcome = Self::drive(&session, cancel, body).await;

        match session.close().await {
            Ok(()) => debug!("Tool provider stopped"),
            Err(e) => warn!(error = %e, "Tool provider teardown failed"),
        }

        outcome
    }

    /// List the provider's tools without running a conversation.
    pub async fn discover(&self, cancel: &CancellationToken) -> Result<ToolRegistry> {
        self.run(cancel, |executor| async move { Ok(executor.into_registry()) })
            .await
    }

    async fn drive<T, F, Fut>(
        session: &Arc<McpSession>,
        cancel: &CancellationToken,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(McpToolExecutor) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let connect = async {
            session.handshake().await?;
            session.list_tools().await
        };

        let tools = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PodcraftError::Cancelled),
            tools = connect => tools?,
        };

        let registry = ToolRegistry::from_descriptors(tools);
        info!(tools = ?registry.names(), "Discovered tools");

        let executor = McpToolExecutor::new(Arc::clone(session), registry);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PodcraftError::Cancelled),
            result = body(executor) => result,
        }
    }
}
