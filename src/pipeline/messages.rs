//! Wire types for the chat endpoint.

use crate::lipsync::LipSync;
use crate::llm::ConversationTurn;
use crate::persona::Expression;
use serde::{Deserialize, Serialize};

/// `POST /api/chat` request body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The learner's message. Required and non-blank.
    #[serde(default)]
    pub message: Option<String>,
    /// Persona name or slug; unknown or absent selects the default persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// Prior turns, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ConversationTurn>,
}

impl ChatRequest {
    /// A request with no history.
    pub fn new(message: impl Into<String>, agent_name: Option<String>) -> Self {
        Self {
            message: Some(message.into()),
            agent_name,
            history: Vec::new(),
        }
    }

    /// The message with surrounding whitespace removed, if it is non-blank.
    pub fn trimmed_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Everything the client needs to voice and animate one reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedResponse {
    /// Reply text.
    pub text: String,
    /// Base64-encoded audio bytes.
    pub audio: String,
    /// Mouth cues for the audio.
    pub lipsync: LipSync,
    /// Facial expression label.
    pub facial_expression: Expression,
    /// Body animation clip name.
    pub animation: String,
}

impl UnifiedResponse {
    /// Decode the audio payload.
    ///
    /// # Errors
    ///
    /// Returns an error if `audio` is not valid base64.
    pub fn audio_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD.decode(&self.audio)
    }
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::llm::Role;

    #[test]
    fn request_fields_are_optional() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.trimmed_message(), None);
        assert!(req.history.is_empty());

        let req: ChatRequest = serde_json::from_str(
            r#"{"message": "  Hello  ", "agent_name": "Logic Leo",
                "history": [{"role": "user", "content": "Hi"}, {"role": "model", "content": "Hey"}]}"#,
        )
        .unwrap();
        assert_eq!(req.trimmed_message(), Some("Hello"));
        assert_eq!(req.agent_name.as_deref(), Some("Logic Leo"));
        assert_eq!(req.history[1].role, Role::Model);
    }

    #[test]
    fn blank_message_counts_as_missing() {
        let req = ChatRequest::new("   ", None);
        assert_eq!(req.trimmed_message(), None);
    }

    #[test]
    fn response_uses_client_field_names() {
        use base64::Engine as _;
        let response = UnifiedResponse {
            text: "Hi".to_owned(),
            audio: base64::engine::general_purpose::STANDARD.encode(b"abc"),
            lipsync: crate::lipsync::LipSync::from_cues(std::path::Path::new("a.mp3"), Vec::new()),
            facial_expression: Expression::Default,
            animation: "Talking_1".to_owned(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["facialExpression"], "default");
        assert_eq!(json["animation"], "Talking_1");
        assert!(json["lipsync"]["mouthCues"].is_array());
        assert_eq!(response.audio_bytes().unwrap(), b"abc");
    }
}
