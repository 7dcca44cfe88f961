//! HTTP client for the chat server and a history-keeping session on top.

use crate::error::{AcademyError, Result};
use crate::llm::ConversationTurn;
use crate::pipeline::{ChatRequest, ErrorBody, UnifiedResponse};
use crate::playback::PlaybackScheduler;
use crate::server::PersonaSummary;
use std::time::Duration;
use tracing::debug;

/// Client for the chat server's `/api` endpoints.
#[derive(Debug, Clone)]
pub struct ChatClient {
    base_url: String,
    http: reqwest::Client,
}

impl ChatClient {
    /// Create a client for the server at `base_url` (e.g. `http://127.0.0.1:3000`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AcademyError::Client(format!("HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    /// Send one chat request.
    ///
    /// # Errors
    ///
    /// Returns [`AcademyError::Client`] with the server's error message on a
    /// non-success status, or if the server cannot be reached.
    pub async fn chat(&self, request: &ChatRequest) -> Result<UnifiedResponse> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| AcademyError::Client(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(AcademyError::Client(format!(
                "server returned HTTP {}: {message}",
                status.as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AcademyError::Client(format!("invalid chat response: {e}")))
    }

    /// List the server's personas.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached or answers badly.
    pub async fn personas(&self) -> Result<Vec<PersonaSummary>> {
        self.http
            .get(format!("{}/api/personas", self.base_url))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AcademyError::Client(format!("persona request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AcademyError::Client(format!("invalid persona list: {e}")))
    }

    /// Whether the server answers its health probe.
    pub async fn is_healthy(&self) -> bool {
        match self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("health probe failed: {e}");
                false
            }
        }
    }
}

/// One learner's conversation with one persona.
///
/// History lives only here, on the client; the server is stateless.
#[derive(Debug)]
pub struct ChatSession {
    client: ChatClient,
    agent_name: Option<String>,
    history: Vec<ConversationTurn>,
}

impl ChatSession {
    /// Start an empty conversation.
    pub fn new(client: ChatClient, agent_name: Option<String>) -> Self {
        Self {
            client,
            agent_name,
            history: Vec::new(),
        }
    }

    /// Turns so far, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Send `message` with the current history.
    ///
    /// Both turns are recorded only if the server answers successfully.
    ///
    /// # Errors
    ///
    /// Propagates [`ChatClient::chat`] errors.
    pub async fn send(&mut self, message: &str) -> Result<UnifiedResponse> {
        let request = ChatRequest {
            message: Some(message.to_owned()),
            agent_name: self.agent_name.clone(),
            history: self.history.clone(),
        };
        let response = self.client.chat(&request).await?;
        self.history.push(ConversationTurn::user(message));
        self.history.push(ConversationTurn::model(response.text.clone()));
        Ok(response)
    }

    /// Send `message` and queue the reply for playback.
    ///
    /// # Errors
    ///
    /// Propagates request errors, or fails if the scheduler has stopped.
    /// Returns the reply text.
    pub async fn send_and_play(
        &mut self,
        message: &str,
        scheduler: &PlaybackScheduler,
    ) -> Result<String> {
        let response = self.send(message).await?;
        let text = response.text.clone();
        scheduler.enqueue(response)?;
        Ok(text)
    }
}
