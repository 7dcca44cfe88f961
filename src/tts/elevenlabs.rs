//! ElevenLabs-compatible remote speech synthesis.
//!
//! `POST {api_url}/v1/text-to-speech/{voice_id}` with the text, model and
//! voice settings; the response body is MP3 audio.

use super::{SpeechBackend, TtsError};
use crate::config::TtsConfig;
use async_trait::async_trait;
use std::time::Duration;

/// Remote text-to-speech client.
pub struct ElevenLabsBackend {
    base_url: String,
    api_key: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
    client: reqwest::Client,
}

impl std::fmt::Debug for ElevenLabsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsBackend")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .finish()
    }
}

impl ElevenLabsBackend {
    /// Create a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &TtsConfig) -> Result<Self, TtsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| TtsError::Request(format!("HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model_id: config.model_id.clone(),
            stability: config.stability,
            similarity_boost: config.similarity_boost,
            client,
        })
    }

    fn request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": self.stability,
                "similarity_boost": self.similarity_boost,
            },
        })
    }
}

#[async_trait]
impl SpeechBackend for ElevenLabsBackend {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn extension(&self) -> &str {
        "mp3"
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, TtsError> {
        let url = format!("{}/v1/text-to-speech/{voice_id}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| TtsError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TtsError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Request(format!("reading audio body: {e}")))?;
        if bytes.is_empty() {
            return Err(TtsError::EmptyAudio);
        }
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn body_carries_voice_settings() {
        let backend = ElevenLabsBackend::new(&TtsConfig::default()).unwrap();
        let body = backend.request_body("Hello");
        assert_eq!(body["text"], "Hello");
        assert_eq!(body["model_id"], "eleven_multilingual_v2");
        let stability = body["voice_settings"]["stability"].as_f64().unwrap();
        assert!((stability - 0.5).abs() < 1e-6);
        assert!(body["voice_settings"]["similarity_boost"].is_number());
    }

    #[test]
    fn base_url_is_trimmed() {
        let config = TtsConfig {
            api_url: "http://localhost:9000/".to_owned(),
            ..TtsConfig::default()
        };
        let backend = ElevenLabsBackend::new(&config).unwrap();
        assert_eq!(backend.base_url, "http://localhost:9000");
        assert_eq!(backend.extension(), "mp3");
    }
}
