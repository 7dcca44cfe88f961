//! Text response generation.
//!
//! One call per chat message: the persona's prompt plus the speech directive
//! becomes the system instruction, prior turns are passed as role-tagged
//! context, and the reply is cleaned into plain speakable text.
//!
//! Two API dialects are supported:
//! - [`openai::OpenAiGenerator`]: any `/v1/chat/completions` server
//! - [`gemini::GeminiGenerator`]: Google `generateContent`
//!
//! Failures here are fatal for the request; nothing downstream runs.

pub mod gemini;
pub mod openai;

use crate::config::{LlmConfig, LlmProvider};
use crate::persona::Persona;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Errors produced while generating a reply.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Provider error message (or raw body).
        message: String,
    },

    /// The provider answered but produced no usable text.
    #[error("provider returned an empty reply")]
    EmptyResponse,

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The learner.
    User,
    /// The tutor.
    #[serde(alias = "assistant")]
    Model,
}

/// One exchange in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl ConversationTurn {
    /// A learner turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A tutor turn.
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Sampling parameters shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature.
    pub temperature: f64,
    /// Token budget for the reply.
    pub max_tokens: u32,
    /// Word cap stated in the prompt and enforced on the output.
    pub max_words: usize,
}

impl From<&LlmConfig> for GenerationOptions {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_words: config.max_words,
        }
    }
}

/// A language model backend that turns a message into a short reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Generate a reply to `message` in the voice of `persona`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, answers with a
    /// non-success status, or produces no text.
    async fn generate(
        &self,
        persona: &Persona,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<String, LlmError>;
}

/// Build the configured backend.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, LlmError> {
    let generator: Arc<dyn TextGenerator> = match config.provider {
        LlmProvider::OpenAi => Arc::new(openai::OpenAiGenerator::new(config)?),
        LlmProvider::Gemini => Arc::new(gemini::GeminiGenerator::new(config)?),
    };
    Ok(generator)
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| LlmError::Config(format!("HTTP client: {e}")))
}

/// Extract a provider error message from a JSON error body.
///
/// Both OpenAI and Gemini use `{"error": {"message": ...}}`.
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_owned())
}

/// Turn raw model output into plain speakable text.
///
/// Drops `<think>` blocks, markdown emphasis, headings and list markers,
/// collapses whitespace, and truncates to `max_words` words.
///
/// # Errors
///
/// Returns [`LlmError::EmptyResponse`] if nothing speakable remains.
pub fn clean_reply(raw: &str, max_words: usize) -> Result<String, LlmError> {
    let without_think = strip_think_blocks(raw);
    let mut words: Vec<&str> = Vec::new();
    for line in without_think.lines() {
        let line = strip_list_marker(line.trim());
        for word in line.split_whitespace() {
            let word = word.trim_matches(|c: char| matches!(c, '*' | '`' | '#' | '_'));
            if !word.is_empty() {
                words.push(word);
            }
        }
    }
    if max_words > 0 && words.len() > max_words {
        words.truncate(max_words);
    }
    let text = words.join(" ");
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim_start_matches('#').trim_start();
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        return rest;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0
        && let Some(rest) = line[digits..].strip_prefix(". ")
    {
        return rest;
    }
    line
}

/// Strip `<think>...</think>` blocks from generated text.
fn strip_think_blocks(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut remaining = text;
    while let Some(start) = remaining.find("<think>") {
        result.push_str(&remaining[..start]);
        if let Some(end) = remaining[start..].find("</think>") {
            remaining = &remaining[start + end + "</think>".len()..];
        } else {
            // Unclosed <think>: discard the rest
            return result;
        }
    }
    result.push_str(remaining);
    result
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn role_accepts_assistant_alias() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(turn.role, Role::Model);
        let json = serde_json::to_string(&ConversationTurn::model("hi")).unwrap();
        assert!(json.contains(r#""role":"model""#));
    }

    #[test]
    fn clean_reply_strips_markdown() {
        let raw = "## Fractions\n- A **half** is one of `two` parts.\n1. Try it!";
        assert_eq!(
            clean_reply(raw, 60).unwrap(),
            "Fractions A half is one of two parts. Try it!"
        );
    }

    #[test]
    fn clean_reply_truncates_to_word_cap() {
        let raw = "one two three four five six";
        assert_eq!(clean_reply(raw, 4).unwrap(), "one two three four");
    }

    #[test]
    fn clean_reply_zero_cap_keeps_everything() {
        assert_eq!(clean_reply("a b c", 0).unwrap(), "a b c");
    }

    #[test]
    fn clean_reply_removes_think_blocks() {
        assert_eq!(
            clean_reply("<think>plan the answer</think>Hello there", 10).unwrap(),
            "Hello there"
        );
        assert_eq!(clean_reply("Hi <think>never ends", 10).unwrap(), "Hi");
    }

    #[test]
    fn clean_reply_rejects_empty_output() {
        assert!(matches!(clean_reply("  **  ", 10), Err(LlmError::EmptyResponse)));
        assert!(matches!(
            clean_reply("<think>only thoughts</think>", 10),
            Err(LlmError::EmptyResponse)
        ));
    }

    #[test]
    fn extract_error_message_prefers_json_field() {
        let body = r#"{"error":{"message":"quota exceeded","code":429}}"#;
        assert_eq!(extract_error_message(body), "quota exceeded");
        assert_eq!(extract_error_message("plain failure"), "plain failure");
    }

    #[test]
    fn options_follow_config() {
        let config = LlmConfig::default();
        let options = GenerationOptions::from(&config);
        assert_eq!(options.max_tokens, config.max_tokens);
        assert_eq!(options.max_words, config.max_words);
    }

    #[test]
    fn from_config_builds_selected_backend() {
        let mut config = LlmConfig::default();
        assert_eq!(from_config(&config).unwrap().name(), "gemini");
        config.provider = LlmProvider::OpenAi;
        assert_eq!(from_config(&config).unwrap().name(), "openai");
    }
}
