//! Prompt templates for Podcraft.
//!
//! Prompts can be customized by placing a `script.toml` file in the custom
//! prompts directory. Templates use `{{variable}}` placeholders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub script: ScriptPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for script generation.
///
/// Variables: `topic`, `duration_minutes`, `word_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPrompts {
    /// System instructions when tools come from the MCP server.
    pub system: String,
    /// System instructions for the single static `search` tool.
    pub static_system: String,
    /// Opening user message.
    pub user: String,
}

impl Default for ScriptPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a podcast script writer with access to arXiv research tools.

Available tools:
- search_papers: find arXiv papers on a topic
- download_paper: fetch a paper by its arXiv ID so it can be read
- read_paper: read the full text of a downloaded paper
- list_papers: see which papers are already downloaded

Work in this order:
1. Search for papers relevant to the topic
2. Download the 2-3 most interesting or relevant papers
3. Read them closely enough to explain their ideas
4. Write an engaging script that synthesizes what you learned

The script must:
- Sound conversational, as if explaining to a curious friend
- Break complex ideas into digestible steps
- Include concrete insights from the papers you read
- Run about {{duration_minutes}} minutes when read aloud (~150 words per minute)
- Contain no speaker labels, timestamps or production notes
- Read as a single flowing monologue

Target length: about {{word_count}} words.

When you are ready, write the script directly without calling any tools."#
                .to_string(),

            static_system: r#"You are a podcast script writer with a research search tool.

Use the `search` tool to find recent papers on the topic. Search more than once if
the first results are thin. Then write an engaging script that explains the most
interesting findings.

The script must:
- Sound conversational, as if explaining to a curious friend
- Refer to specific papers and their results
- Run about {{duration_minutes}} minutes when read aloud (~150 words per minute)
- Contain no speaker labels, timestamps or production notes

Target length: about {{word_count}} words.

When you are ready, write the script directly without calling any tools."#
                .to_string(),

            user: r#"Research and create a podcast script about "{{topic}}". Start by searching for relevant papers, pick the 2-3 most interesting ones, study them, then write an engaging {{duration_minutes}}-minute script (~{{word_count}} words) based on your research."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let script_path =
                PathBuf::from(shellexpand::tilde(dir).to_string()).join("script.toml");
            if script_path.exists() {
                let content = std::fs::read_to_string(&script_path)?;
                prompts.script = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
