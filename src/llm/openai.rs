//! OpenAI-compatible chat completions backend.
//!
//! Works with any server exposing `/v1/chat/completions` (OpenAI, Ollama,
//! vLLM, llama.cpp server, ...). Requests are non-streaming: the whole
//! reply is needed before speech synthesis can start.

use super::{ConversationTurn, GenerationOptions, LlmError, Role, TextGenerator};
use crate::config::LlmConfig;
use crate::persona::Persona;
use async_trait::async_trait;
use tracing::debug;

/// Chat completions client.
pub struct OpenAiGenerator {
    base_url: String,
    model: String,
    api_key: String,
    options: GenerationOptions,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiGenerator {
    /// Create a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let base = config.api_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        Ok(Self {
            base_url: base.to_owned(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            options: GenerationOptions::from(config),
            client: super::http_client(config.timeout_secs)?,
        })
    }

    fn build_body(
        &self,
        persona: &Persona,
        history: &[ConversationTurn],
        message: &str,
    ) -> serde_json::Value {
        build_completions_request(&self.model, &self.options, persona, history, message)
    }
}

/// Build the JSON request body for the Chat Completions API.
pub fn build_completions_request(
    model: &str,
    options: &GenerationOptions,
    persona: &Persona,
    history: &[ConversationTurn],
    message: &str,
) -> serde_json::Value {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(serde_json::json!({
        "role": "system",
        "content": persona.assemble_prompt(options.max_words),
    }));
    for turn in history {
        let role = match turn.role {
            Role::User => "user",
            Role::Model => "assistant",
        };
        messages.push(serde_json::json!({ "role": role, "content": turn.content }));
    }
    messages.push(serde_json::json!({ "role": "user", "content": message }));

    serde_json::json!({
        "model": model,
        "messages": messages,
        "stream": false,
        "temperature": options.temperature,
        "max_tokens": options.max_tokens,
    })
}

/// Pull the assistant text out of a chat completion response.
fn parse_completion(body: &serde_json::Value) -> Option<&str> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        persona: &Persona,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_body(persona, history, message);

        let mut request = self.client.post(&url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("OpenAI request failed: {e}")))?;

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
            .map_err(|e| LlmError::Request(format!("invalid completion JSON: {e}")))?;
        let raw = parse_completion(&json).ok_or(LlmError::EmptyResponse)?;
        debug!(model = %self.model, chars = raw.len(), "completion received");
        super::clean_reply(raw, self.options.max_words)
    }
}
