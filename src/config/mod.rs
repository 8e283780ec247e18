//! Configuration module for Podcraft.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, ScriptPrompts};
pub use settings::{
    AudioSettings, EngineProvider, EngineSettings, GeneralSettings, McpSettings,
    PodcastSettings, PromptSettings, ResearchMode, ResearchSettings, Settings,
    ANTHROPIC_API_KEY_ENV, ELEVENLABS_API_KEY_ENV, OPENAI_API_KEY_ENV,
};
