//! Podcraft CLI entry point.

use anyhow::Result;
use clap::Parser;
use podcraft::cli::commands::{self, GenerateOptions};
use podcraft::cli::{Cli, Commands};
use podcraft::config::Settings;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Logs go to stderr so stdout carries only the script
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("podcraft={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    std::fs::create_dir_all(settings.data_dir())?;

    // Ctrl-C cancels whatever is running and tears down the MCP server
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, shutting down");
            on_interrupt.cancel();
        }
    });

    // Execute command
    match cli.command {
        Commands::Generate {
            topic,
            duration,
            script_only,
            output,
            save_script,
            mode,
        } => {
            let options = GenerateOptions {
                topic,
                duration,
                script_only,
                output: output.map(expand),
                save_script: save_script.map(expand),
                mode,
            };
            commands::run_generate(options, settings, cancel).await?;
        }

        Commands::Tools { json } => {
            commands::run_tools(json, &settings, cancel).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(&host, port, settings, cancel).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}

fn expand(path: PathBuf) -> PathBuf {
    Settings::expand_path(&path.to_string_lossy())
}
