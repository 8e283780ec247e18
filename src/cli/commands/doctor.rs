//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::find_executable;
use crate::cli::Output;
use crate::config::{ResearchMode, Settings, ELEVENLABS_API_KEY_ENV};
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Podcraft Doctor");
    println!("Checking system requirements and configuration...\n");

    let sections = [
        ("Tool Provider", vec![check_tool_provider(settings)]),
        ("API Configuration", check_api_keys(settings)),
        ("Directories", check_directories(settings)),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    let mut checks = Vec::new();
    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Podcraft.",
            errors
        ));
        anyhow::bail!("doctor found {} error(s)", errors);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Podcraft is ready to use.");
    }

    Ok(())
}

/// Check that the MCP server command can be launched.
fn check_tool_provider(settings: &Settings) -> CheckResult {
    let command = &settings.mcp.command;
    let name = format!("MCP server ({})", command);

    match find_executable(command) {
        Some(path) => CheckResult::ok(&name, &path.display().to_string()),
        None if settings.research.mode == ResearchMode::Static => CheckResult::warning(
            &name,
            "not found (research.mode = static)",
            install_hint(command),
        ),
        None => CheckResult::error(&name, "not found", install_hint(command)),
    }
}

fn install_hint(command: &str) -> &'static str {
    if command == "uv" {
        "Install with: curl -LsSf https://astral.sh/uv/install.sh | sh"
    } else {
        "Set [mcp] command in the config file to an installed MCP server"
    }
}

/// Check the engine and speech API keys.
fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let engine_var = settings.engine.api_key_env();
    let engine = match std::env::var(engine_var) {
        Ok(key) if !key.is_empty() => CheckResult::ok(
            engine_var,
            &format!("configured ({}) for {}", mask(&key), settings.engine.provider),
        ),
        _ => CheckResult::error(
            engine_var,
            "not set",
            &format!("Set with: export {}='...'", engine_var),
        ),
    };

    let speech = match std::env::var(ELEVENLABS_API_KEY_ENV) {
        Ok(key) if !key.is_empty() => {
            CheckResult::ok(ELEVENLABS_API_KEY_ENV, &format!("configured ({})", mask(&key)))
        }
        _ => CheckResult::warning(
            ELEVENLABS_API_KEY_ENV,
            "not set (only --script-only works)",
            &format!("Set with: export {}='...'", ELEVENLABS_API_KEY_ENV),
        ),
    };

    vec![engine, speech]
}

/// Show the first and last four characters of a key.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check data and output directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut dirs = vec![
        ("Data directory", settings.data_dir()),
        ("Audio output", settings.audio_dir()),
    ];
    if let Some(storage) = &settings.mcp.storage_path {
        dirs.push(("Paper storage", Settings::expand_path(storage)));
    }

    dirs.into_iter()
        .map(|(name, dir)| {
            if dir.is_dir() {
                CheckResult::ok(name, &dir.display().to_string())
            } else {
                CheckResult::warning(
                    name,
                    &format!("{} (will be created)", dir.display()),
                    "Directory will be created on first use",
                )
            }
        })
        .collect()
}

/// Check if config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: podcraft config init",
        )
    }
}
