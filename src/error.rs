//! Error types for the academy avatar pipeline.

/// Top-level error type for the avatar response pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AcademyError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Text response generation error. Fatal for a chat request.
    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm::LlmError),

    /// Speech synthesis error (only surfaced by the remote backend itself;
    /// the synthesizer absorbs it).
    #[error("TTS error: {0}")]
    Tts(#[from] crate::tts::TtsError),

    /// Lip-sync extraction error (absorbed into `metadata.error` by the
    /// extractor; only visible when a stage is driven directly).
    #[error("lip-sync error: {0}")]
    LipSync(#[from] crate::lipsync::LipSyncError),

    /// Pipeline coordination error.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// HTTP server error (bind, serve).
    #[error("server error: {0}")]
    Server(String),

    /// HTTP client error (chat client talking to the server).
    #[error("client error: {0}")]
    Client(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AcademyError>;
