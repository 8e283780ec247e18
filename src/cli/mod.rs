//! CLI module for Podcraft.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::config::ResearchMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Podcraft - research a topic with an LLM agent and narrate it as a podcast
///
/// The agent searches and reads papers through an MCP tool server (or a
/// built-in arXiv search), writes a script, and ElevenLabs voices it.
#[derive(Parser, Debug)]
#[command(name = "podcraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a topic and produce a podcast episode
    Generate {
        /// Topic of the episode (e.g., "graph neural networks")
        topic: String,

        /// Target length in minutes (1-30)
        #[arg(short, long)]
        duration: Option<u32>,

        /// Only write the script, skip speech synthesis
        #[arg(long)]
        script_only: bool,

        /// Output MP3 path (default: <audio.output_dir>/<topic>_<timestamp>.mp3)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save the script text to this file
        #[arg(long)]
        save_script: Option<PathBuf>,

        /// Research tools to use (mcp, static)
        #[arg(long)]
        mode: Option<ResearchMode>,
    },

    /// List the tools exposed by the configured MCP server
    Tools {
        /// Print full declarations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
