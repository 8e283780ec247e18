//! Podcast script generation: the caller-facing entry point.
//!
//! Binds a reasoning engine to research tools (an MCP server or the static
//! arXiv search) and runs the agent loop until it produces a script.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::agent::{Agent, AgentResponse, StaticToolExecutor, ToolCallRecord};
use crate::config::{Prompts, ResearchMode, Settings};
use crate::engine::{create_engine, ReasoningEngine};
use crate::error::{GenerationError, PodcraftError, Result};
use crate::mcp::{Launcher, McpLifecycle, SessionTimeouts, StdioLauncher};
use crate::research::{ArxivSource, ResearchSource};

/// Longest episode accepted, in minutes.
pub const MAX_DURATION_MINUTES: u32 = 30;

/// Where the engine's research tools come from.
pub enum ResearchBackend {
    /// Tools discovered from a freshly launched MCP server per generation.
    Mcp {
        launcher: Arc<dyn Launcher>,
        timeouts: SessionTimeouts,
    },
    /// A single in-process `search` tool.
    Static {
        source: Arc<dyn ResearchSource>,
        max_results_cap: usize,
    },
}

/// A generated script plus how it was produced.
#[derive(Debug)]
pub struct GeneratedScript {
    pub topic: String,
    pub duration_minutes: u32,
    pub script: String,
    pub word_count: usize,
    pub tool_calls: Vec<ToolCallRecord>,
    pub iterations: usize,
}

pub struct ScriptGenerator {
    engine: Arc<dyn ReasoningEngine>,
    research: ResearchBackend,
    prompts: Prompts,
    default_duration: u32,
    words_per_minute: u32,
    max_iterations: usize,
}

impl ScriptGenerator {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        research: ResearchBackend,
        prompts: Prompts,
    ) -> Self {
        let defaults = Settings::default();
        Self {
            engine,
            research,
            prompts,
            default_duration: defaults.podcast.duration_minutes,
            words_per_minute: defaults.podcast.words_per_minute,
            max_iterations: defaults.engine.max_iterations,
        }
    }

    /// Build the engine, research backend and prompts described by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let engine = create_engine(&settings.engine)?;

        let research = match settings.research.mode {
            ResearchMode::Mcp => ResearchBackend::Mcp {
                launcher: Arc::new(StdioLauncher::new(settings.mcp.server_command())),
                timeouts: settings.mcp.session_timeouts(),
            },
            ResearchMode::Static => ResearchBackend::Static {
                source: Arc::new(ArxivSource::new()?),
                max_results_cap: settings.research.max_results_cap,
            },
        };

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self::new(engine, research, prompts).with_settings(settings))
    }

    fn with_settings(mut self, settings: &Settings) -> Self {
        self.default_duration = settings.podcast.duration_minutes;
        self.words_per_minute = settings.podcast.words_per_minute;
        self.max_iterations = settings.engine.max_iterations;
        self
    }

    /// Words needed for `duration_minutes` of narration.
    pub fn target_word_count(&self, duration_minutes: u32) -> u32 {
        duration_minutes * self.words_per_minute
    }

    /// Generate a script about `topic` and return its text.
    pub async fn generate_script(
        &self,
        topic: &str,
        duration_minutes: Option<u32>,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, GenerationError> {
        self.generate(topic, duration_minutes, cancel)
            .await
            .map(|generated| generated.script)
    }

    /// Like [`Self::generate_script`], keeping the tool-call record.
    #[instrument(skip(self, cancel), fields(run_id = %Uuid::new_v4()))]
    pub async fn generate(
        &self,
        topic: &str,
        duration_minutes: Option<u32>,
        cancel: &CancellationToken,
    ) -> std::result::Result<GeneratedScript, GenerationError> {
        let topic = topic.trim();
        let duration = duration_minutes.unwrap_or(self.default_duration);
        validate(topic, duration)?;

        let word_count = self.target_word_count(duration);
        info!(duration, word_count, "Generating script");

        let vars: HashMap<String, String> = [
            ("topic", topic.to_string()),
            ("duration_minutes", duration.to_string()),
            ("word_count", word_count.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let system_template = match self.research {
            ResearchBackend::Mcp { .. } => &self.prompts.script.system,
            ResearchBackend::Static { .. } => &self.prompts.script.static_system,
        };
        let system = self.prompts.render_with_custom(system_template, &vars);
        let goal = self.prompts.render_with_custom(&self.prompts.script.user, &vars);

        let response = self.run_agent(&goal, &system, cancel).await?;

        let script = response.content;
        let words = script.split_whitespace().count();
        info!(
            words,
            iterations = response.iterations,
            tool_calls = response.tool_calls.len(),
            "Script generated"
        );

        Ok(GeneratedScript {
            topic: topic.to_string(),
            duration_minutes: duration,
            script,
            word_count: words,
            tool_calls: response.tool_calls,
            iterations: response.iterations,
        })
    }

    async fn run_agent(
        &self,
        goal: &str,
        system: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse> {
        match &self.research {
            ResearchBackend::Mcp { launcher, timeouts } => {
                let lifecycle = McpLifecycle::new(Arc::clone(launcher), *timeouts);
                lifecycle
                    .run(cancel, |executor| async move {
                        Agent::new(Arc::clone(&self.engine), executor)
                            .with_max_iterations(self.max_iterations)
                            .run(goal, system, cancel)
                            .await
                    })
                    .await
            }
            ResearchBackend::Static {
                source,
                max_results_cap,
            } => {
                let executor = StaticToolExecutor::new(Arc::clone(source))
                    .with_max_results_cap(*max_results_cap);
                Agent::new(Arc::clone(&self.engine), executor)
                    .with_max_iterations(self.max_iterations)
                    .run(goal, system, cancel)
                    .await
            }
        }
    }
}

fn validate(topic: &str, duration: u32) -> std::result::Result<(), GenerationError> {
    if topic.is_empty() {
        return Err(PodcraftError::InvalidInput("topic must not be empty".to_string()).into());
    }
    if !(1..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(PodcraftError::InvalidInput(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}, got {duration}"
        ))
        .into());
    }
    Ok(())
}
