//! Text-to-speech and episode files.

mod elevenlabs;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::info;

use crate::error::Result;

pub use elevenlabs::ElevenLabsSynthesizer;

/// Converts a script into encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in one request and return MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// File name for an episode about `topic` generated at `at`.
pub fn episode_filename(topic: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.mp3", topic.trim().replace(' ', "_"), at.format("%Y%m%d_%H%M%S"))
}

/// Synthesize `script` and write it to `path`, creating parent directories.
pub async fn write_episode(
    synthesizer: &dyn SpeechSynthesizer,
    script: &str,
    path: &Path,
) -> Result<PathBuf> {
    let audio = synthesizer.synthesize(script).await?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &audio).await?;

    info!(path = %path.display(), bytes = audio.len(), "Saved episode audio");
    Ok(path.to_path_buf())
}

/// Synthesize `script` into `output_dir` under a timestamped name for `topic`.
pub async fn save_episode(
    synthesizer: &dyn SpeechSynthesizer,
    script: &str,
    topic: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let path = output_dir.join(episode_filename(topic, Local::now()));
    write_episode(synthesizer, script, &path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Silence;

    #[async_trait]
    impl SpeechSynthesizer for Silence {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            Ok(text.as_bytes().to_vec())
        }
    }

    #[test]
    fn test_episode_filename() {
        let at = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            episode_filename("graph neural networks", at),
            "graph_neural_networks_20250309_140507.mp3"
        );
    }

    #[tokio::test]
    async fn test_save_episode_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("audio");

        let path = save_episode(&Silence, "hello listeners", "quantum computing", &out)
            .await
            .unwrap();

        assert!(path.starts_with(&out));
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("quantum_computing_") && n.ends_with(".mp3")));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello listeners");
    }
}
