//! Speech synthesis with a three-tier fallback.
//!
//! 1. The remote backend ([`elevenlabs::ElevenLabsBackend`]).
//! 2. A bundled placeholder clip read from disk.
//! 3. Generated silence ([`silence::default_silence`]).
//!
//! [`SpeechSynthesizer::synthesize`] never fails: whatever tier answers, the
//! bytes are non-empty and written to a [`ScratchFile`] for the lip-sync
//! stage.

pub mod elevenlabs;
pub mod silence;

use crate::config::TtsConfig;
use crate::persona::Persona;
use crate::scratch::ScratchFile;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Errors from the remote speech backend or the placeholder tier.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// Network or client failure.
    #[error("speech request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("speech service returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// The service answered 2xx with an empty body.
    #[error("speech service returned no audio")]
    EmptyAudio,

    /// The placeholder clip is missing, unreadable or empty.
    #[error("placeholder audio unavailable at {path}: {reason}")]
    Placeholder {
        /// Where the clip was expected.
        path: PathBuf,
        /// Why it could not be used.
        reason: String,
    },
}

/// A remote (or otherwise fallible) text-to-speech engine.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// File extension of the audio this backend returns.
    fn extension(&self) -> &str;

    /// Synthesize `text` with the given voice.
    ///
    /// # Errors
    ///
    /// Any failure; the synthesizer falls through to the next tier.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, TtsError>;
}

/// Which fallback tier produced the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSource {
    /// Remote synthesis succeeded.
    Remote,
    /// The bundled placeholder clip.
    Placeholder,
    /// Generated silence.
    Synthetic,
}

/// Audio for one reply.
#[derive(Debug)]
pub struct SynthesizedSpeech {
    /// Encoded audio bytes. Never empty.
    pub bytes: Vec<u8>,
    /// Which tier produced them.
    pub source: AudioSource,
    /// Scratch copy for the lip-sync stage; `None` if it could not be written.
    pub file: Option<ScratchFile>,
}

/// Speech synthesis stage.
pub struct SpeechSynthesizer {
    backend: Arc<dyn SpeechBackend>,
    placeholder: PathBuf,
    scratch_dir: PathBuf,
}

impl SpeechSynthesizer {
    /// Create a synthesizer over `backend`.
    pub fn new(backend: Arc<dyn SpeechBackend>, placeholder: PathBuf, scratch_dir: PathBuf) -> Self {
        Self {
            backend,
            placeholder,
            scratch_dir,
        }
    }

    /// Build the remote backend from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &TtsConfig, scratch_dir: PathBuf) -> Result<Self, TtsError> {
        let backend = Arc::new(elevenlabs::ElevenLabsBackend::new(config)?);
        Ok(Self::new(backend, config.placeholder_path(), scratch_dir))
    }

    /// Synthesize `text` in `persona`'s voice, falling back as needed, and
    /// write the result to a scratch file.
    pub async fn synthesize(&self, text: &str, persona: &Persona) -> SynthesizedSpeech {
        let start = Instant::now();
        let (bytes, source, extension) = self.audio_with_fallback(text, persona).await;
        info!(
            backend = self.backend.name(),
            source = ?source,
            bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "speech ready"
        );

        let file = match ScratchFile::write(&self.scratch_dir, "message", &extension, &bytes).await
        {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(dir = %self.scratch_dir.display(), "could not write speech scratch file: {e}");
                None
            }
        };

        SynthesizedSpeech {
            bytes,
            source,
            file,
        }
    }

    async fn audio_with_fallback(
        &self,
        text: &str,
        persona: &Persona,
    ) -> (Vec<u8>, AudioSource, String) {
        match self.backend.synthesize(text, persona.voice_id).await {
            Ok(bytes) => {
                return (bytes, AudioSource::Remote, self.backend.extension().to_owned());
            }
            Err(e) => warn!(voice = persona.voice_id, "remote speech failed, using placeholder: {e}"),
        }

        match read_placeholder(&self.placeholder).await {
            Ok(bytes) => {
                let extension = self
                    .placeholder
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("mp3")
                    .to_owned();
                return (bytes, AudioSource::Placeholder, extension);
            }
            Err(e) => warn!("{e}; generating silence"),
        }

        (silence::default_silence(), AudioSource::Synthetic, "wav".to_owned())
    }
}

async fn read_placeholder(path: &Path) -> Result<Vec<u8>, TtsError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| TtsError::Placeholder {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if bytes.is_empty() {
        return Err(TtsError::Placeholder {
            path: path.to_path_buf(),
            reason: "file is empty".to_owned(),
        });
    }
    Ok(bytes)
}
