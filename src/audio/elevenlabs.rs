//! ElevenLabs text-to-speech client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument};

use super::SpeechSynthesizer;
use crate::config::{AudioSettings, ELEVENLABS_API_KEY_ENV};
use crate::error::{PodcraftError, Result};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Synthesizes speech with an ElevenLabs voice.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    api_key: String,
    voice_id: String,
    model_id: String,
    base_url: String,
}

impl ElevenLabsSynthesizer {
    pub fn new(
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Build from settings, reading the key from `ELEVENLABS_API_KEY`.
    pub fn from_settings(settings: &AudioSettings) -> Result<Self> {
        let api_key = std::env::var(ELEVENLABS_API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PodcraftError::Config(format!("{ELEVENLABS_API_KEY_ENV} is not set")))?;
        Self::new(api_key, &settings.voice_id, &settings.model_id)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    #[instrument(skip_all, fields(voice = %self.voice_id, chars = text.chars().count()))]
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);

        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &self.model_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PodcraftError::Audio(format!("ElevenLabs returned {}: {}", status, body)));
        }

        let bytes = response.bytes().await?;
        debug!(bytes = bytes.len(), "Received audio");
        Ok(bytes.to_vec())
    }
}
