//! Pre-flight checks before expensive operations.
//!
//! Validates that required executables and API keys are available before
//! starting a generation that would otherwise fail midway.

use crate::config::{ResearchMode, Settings, ELEVENLABS_API_KEY_ENV};
use crate::error::{PodcraftError, Result};
use std::path::{Path, PathBuf};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Script generation, optionally followed by speech synthesis.
    Generate { audio: bool },
    /// Listing tools only needs the MCP server.
    Tools,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Generate { audio } => {
            check_api_key(settings.engine.api_key_env())?;
            if settings.research.mode == ResearchMode::Mcp {
                check_executable(&settings.mcp.command)?;
            }
            if audio {
                check_api_key(ELEVENLABS_API_KEY_ENV)?;
            }
        }
        Operation::Tools => {
            check_executable(&settings.mcp.command)?;
        }
    }
    Ok(())
}

/// Check that an API key environment variable is set.
fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(PodcraftError::Config(format!(
            "{var} is empty. Set it with: export {var}='...'"
        ))),
        Err(_) => Err(PodcraftError::Config(format!(
            "{var} not set. Set it with: export {var}='...'"
        ))),
    }
}

/// Check that the tool-provider executable can be found.
fn check_executable(command: &str) -> Result<()> {
    find_executable(command).map(|_| ()).ok_or_else(|| {
        PodcraftError::Launch(format!("'{command}' not found in PATH"))
    })
}

/// Resolve `command` the way process spawning does: paths as-is, bare names via `PATH`.
pub fn find_executable(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(command))
        .find(|full| full.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_find_executable_on_path() {
        assert!(find_executable("sh").is_some());
        assert!(find_executable("/bin/sh").is_some());
    }

    #[test]
    fn test_missing_executable_is_launch_error() {
        let mut settings = Settings::default();
        settings.mcp.command = "podcraft-no-such-server".to_string();
        assert!(matches!(
            check(Operation::Tools, &settings),
            Err(PodcraftError::Launch(_))
        ));
    }
}
