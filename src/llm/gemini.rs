//! Google Gemini `generateContent` backend.

use super::{ConversationTurn, GenerationOptions, LlmError, Role, TextGenerator};
use crate::config::LlmConfig;
use crate::persona::Persona;
use async_trait::async_trait;
use tracing::debug;

/// Gemini REST client.
pub struct GeminiGenerator {
    base_url: String,
    model: String,
    api_key: String,
    options: GenerationOptions,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiGenerator {
    /// Create a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            options: GenerationOptions::from(config),
            client: super::http_client(config.timeout_secs)?,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Build the `generateContent` request body.
///
/// Gemini names the tutor role `model`, so history maps one-to-one.
pub fn build_generate_request(
    options: &GenerationOptions,
    persona: &Persona,
    history: &[ConversationTurn],
    message: &str,
) -> serde_json::Value {
    let mut contents: Vec<serde_json::Value> = history
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "model",
            };
            serde_json::json!({ "role": role, "parts": [{ "text": turn.content }] })
        })
        .collect();
    contents.push(serde_json::json!({ "role": "user", "parts": [{ "text": message }] }));

    serde_json::json!({
        "systemInstruction": {
            "parts": [{ "text": persona.assemble_prompt(options.max_words) }]
        },
        "contents": contents,
        "generationConfig": {
            "temperature": options.temperature,
            "maxOutputTokens": options.max_tokens,
        },
    })
}

/// Concatenate the text parts of the first candidate.
fn parse_candidate(body: &serde_json::Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        persona: &Persona,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<String, LlmError> {
        let body = build_generate_request(&self.options, persona, history, message);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("Gemini request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: super::extract_error_message(&body_text),
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Request(format!("invalid Gemini JSON: {e}")))?;
        let raw = parse_candidate(&json).ok_or(LlmError::EmptyResponse)?;
        debug!(model = %self.model, chars = raw.len(), "candidate received");
        super::clean_reply(&raw, self.options.max_words)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::persona::PersonaId;

    #[test]
    fn request_uses_system_instruction_and_model_role() {
        let options = GenerationOptions {
            temperature: 0.7,
            max_tokens: 120,
            max_words: 50,
        };
        let history = vec![ConversationTurn::user("Hi"), ConversationTurn::model("Hello!")];
        let body =
            build_generate_request(&options, PersonaId::Aria.persona(), &history, "Draw a cat");
        let system = body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(system.contains("Creative Aria"));
        assert!(system.contains("50 words"));
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "Draw a cat");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 120);
    }

    #[test]
    fn endpoint_includes_model() {
        let config = LlmConfig {
            api_url: "http://127.0.0.1:9/".to_owned(),
            model: "gemini-1.5-flash".to_owned(),
            ..LlmConfig::default()
        };
        let generator = GeminiGenerator::new(&config).unwrap();
        assert_eq!(
            generator.endpoint(),
            "http://127.0.0.1:9/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn parse_candidate_joins_parts() {
        let json = serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]}}]
        });
        assert_eq!(parse_candidate(&json).as_deref(), Some("Hello"));
        assert_eq!(parse_candidate(&serde_json::json!({"candidates": []})), None);
    }
}
