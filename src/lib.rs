//! Podcraft - research-driven podcast generation
//!
//! A CLI and HTTP service that lets an LLM research a topic with tools and
//! turns the result into a narrated podcast episode.
//!
//! # Overview
//!
//! Podcraft:
//! - launches an MCP tool server (by default `arxiv-mcp-server`) over stdio
//! - discovers its tools and exposes them to a reasoning engine
//! - runs an agentic tool-use loop until the engine writes a script
//! - synthesizes the script to MP3 with ElevenLabs
//!
//! # Architecture
//!
//! - `mcp` - MCP client: transport, session, lifecycle
//! - `agent` - tool registry, transcript, and the tool-use loop
//! - `engine` - reasoning engines (Anthropic Messages, OpenAI chat)
//! - `research` - built-in arXiv search for the static tool mode
//! - `script` - script generation entry point
//! - `audio` - text-to-speech and episode files
//! - `config` - settings and prompt templates
//!
//! # Example
//!
//! ```rust,no_run
//! use podcraft::config::Settings;
//! use podcraft::script::ScriptGenerator;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let generator = ScriptGenerator::from_settings(&settings)?;
//!
//!     let script = generator
//!         .generate_script("graph neural networks", Some(5), &CancellationToken::new())
//!         .await?;
//!     println!("{script}");
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod audio;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod mcp;
pub mod openai;
pub mod research;
pub mod script;

pub use error::{GenerationError, PodcraftError, Result};
