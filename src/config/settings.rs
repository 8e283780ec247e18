//! Configuration settings for Podcraft.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::mcp::{ServerCommand, SessionTimeouts};

/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the ElevenLabs API key.
pub const ELEVENLABS_API_KEY_ENV: &str = "ELEVENLABS_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub engine: EngineSettings,
    pub mcp: McpSettings,
    pub research: ResearchSettings,
    pub podcast: PodcastSettings,
    pub audio: AudioSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.podcraft".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Reasoning engine backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EngineProvider {
    #[default]
    Anthropic,
    OpenAi,
}

impl std::str::FromStr for EngineProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(EngineProvider::Anthropic),
            "openai" => Ok(EngineProvider::OpenAi),
            _ => Err(format!("Unknown engine provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EngineProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineProvider::Anthropic => write!(f, "anthropic"),
            EngineProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Reasoning engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub provider: EngineProvider,
    /// Model identifier passed to the provider.
    pub model: String,
    /// Maximum tokens per engine response.
    pub max_tokens: u32,
    /// HTTP timeout for one engine query.
    pub timeout_secs: u64,
    /// Maximum engine queries per generation.
    pub max_iterations: usize,
    /// Override for the provider's API base URL.
    pub base_url: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider: EngineProvider::Anthropic,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 8000,
            timeout_secs: 300,
            max_iterations: 15,
            base_url: None,
        }
    }
}

impl EngineSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Environment variable the selected provider reads its key from.
    pub fn api_key_env(&self) -> &'static str {
        match self.provider {
            EngineProvider::Anthropic => ANTHROPIC_API_KEY_ENV,
            EngineProvider::OpenAi => OPENAI_API_KEY_ENV,
        }
    }
}

/// Tool-provider (MCP server) process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    /// Executable to launch.
    pub command: String,
    pub args: Vec<String>,
    /// Where the server stores downloaded papers. Passed as `--storage-path`.
    pub storage_path: Option<String>,
    /// Working directory for the server process.
    pub cwd: Option<String>,
    /// Extra environment variables for the server process.
    pub env: HashMap<String, String>,
    /// Whether the server inherits this process's environment.
    pub inherit_env: bool,
    pub init_timeout_secs: u64,
    pub call_timeout_secs: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            command: "uv".to_string(),
            args: vec![
                "tool".to_string(),
                "run".to_string(),
                "arxiv-mcp-server".to_string(),
            ],
            storage_path: Some("~/.podcraft/papers".to_string()),
            cwd: None,
            env: HashMap::new(),
            inherit_env: true,
            init_timeout_secs: 30,
            call_timeout_secs: 120,
            shutdown_grace_ms: 2000,
        }
    }
}

impl McpSettings {
    /// Launch description for the configured server.
    pub fn server_command(&self) -> ServerCommand {
        let mut args = self.args.clone();
        if let Some(storage) = &self.storage_path {
            args.push("--storage-path".to_string());
            args.push(Settings::expand_path(storage).to_string_lossy().into_owned());
        }

        let mut command = ServerCommand::new(self.command.clone(), args);
        command.env = self.env.clone();
        command.inherit_env = self.inherit_env;
        command.cwd = self.cwd.as_deref().map(Settings::expand_path);
        command.shutdown_grace = Duration::from_millis(self.shutdown_grace_ms);
        command
    }

    pub fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            init: Duration::from_secs(self.init_timeout_secs),
            call: Duration::from_secs(self.call_timeout_secs),
        }
    }
}

/// How research tools are provided to the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResearchMode {
    /// Tools discovered from the MCP server.
    #[default]
    Mcp,
    /// A single in-process `search` tool backed by arXiv.
    Static,
}

impl std::str::FromStr for ResearchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mcp" => Ok(ResearchMode::Mcp),
            "static" => Ok(ResearchMode::Static),
            _ => Err(format!("Unknown research mode: {}", s)),
        }
    }
}

impl std::fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchMode::Mcp => write!(f, "mcp"),
            ResearchMode::Static => write!(f, "static"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchSettings {
    pub mode: ResearchMode,
    /// Upper bound on `max_results` for the static search tool.
    pub max_results_cap: usize,
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            mode: ResearchMode::Mcp,
            max_results_cap: 10,
        }
    }
}

/// Episode length settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PodcastSettings {
    /// Default episode length.
    pub duration_minutes: u32,
    /// Narration pace used to derive the target word count.
    pub words_per_minute: u32,
}

impl Default for PodcastSettings {
    fn default() -> Self {
        Self {
            duration_minutes: 5,
            words_per_minute: 150,
        }
    }
}

/// Text-to-speech settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// ElevenLabs voice id.
    pub voice_id: String,
    /// ElevenLabs model id.
    pub model_id: String,
    /// Directory for generated episodes.
    pub output_dir: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_dir: "audio".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PodcraftError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podcraft")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded audio output directory.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.audio.output_dir)
    }
}
