//! Tools command - show what the configured MCP server offers.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::mcp::{McpLifecycle, StdioLauncher};
use anyhow::Result;
use console::style;
use tokio_util::sync::CancellationToken;

/// Run the tools command.
pub async fn run_tools(json: bool, settings: &Settings, cancel: CancellationToken) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Tools, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'podcraft doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let command = settings.mcp.server_command();
    let lifecycle = McpLifecycle::new(
        StdioLauncher::new(command.clone()),
        settings.mcp.session_timeouts(),
    );

    let spinner = Output::spinner(&format!("Starting {}...", command.display()));
    let discovered = lifecycle.discover(&cancel).await;
    spinner.finish_and_clear();
    let registry = discovered?;

    if json {
        println!("{}", serde_json::to_string_pretty(registry.declarations())?);
        return Ok(());
    }

    if registry.is_empty() {
        Output::warning("The server exposes no tools.");
        return Ok(());
    }

    Output::header(&format!("Tools ({})", registry.len()));
    for tool in registry.declarations() {
        Output::list_item(&style(&tool.name).bold().to_string());
        if !tool.description.is_empty() {
            println!("    {}", style(tool.description.trim()).dim());
        }
    }

    Ok(())
}
