//! The response assembler: text, speech, lip-sync and expression in order.

use super::messages::UnifiedResponse;
use crate::config::AcademyConfig;
use crate::error::{AcademyError, Result};
use crate::expression;
use crate::lipsync::LipSyncExtractor;
use crate::llm::{self, ConversationTurn, TextGenerator};
use crate::persona::PersonaId;
use crate::tts::SpeechSynthesizer;
use base64::Engine as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Turns one learner message into a [`UnifiedResponse`].
///
/// Only text generation can fail the request. Speech and lip-sync degrade
/// on their own, and their scratch files are removed before `respond`
/// returns.
pub struct ResponseAssembler {
    generator: Arc<dyn TextGenerator>,
    speech: SpeechSynthesizer,
    lipsync: LipSyncExtractor,
}

impl ResponseAssembler {
    /// Assemble from already-built stages.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        speech: SpeechSynthesizer,
        lipsync: LipSyncExtractor,
    ) -> Self {
        Self {
            generator,
            speech,
            lipsync,
        }
    }

    /// Build every stage from config, using `scratch_dir` for temp files.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &AcademyConfig, scratch_dir: PathBuf) -> Result<Self> {
        let generator = llm::from_config(&config.llm)?;
        let speech = SpeechSynthesizer::from_config(&config.tts, scratch_dir)?;
        let lipsync = LipSyncExtractor::new(&config.lipsync);
        Ok(Self::new(generator, speech, lipsync))
    }

    /// Generate, voice and annotate a reply.
    ///
    /// # Errors
    ///
    /// - [`AcademyError::Pipeline`] if `message` is blank.
    /// - [`AcademyError::Llm`] if text generation fails.
    pub async fn respond(
        &self,
        message: &str,
        history: &[ConversationTurn],
        agent_name: Option<&str>,
    ) -> Result<UnifiedResponse> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AcademyError::Pipeline("message is required".to_owned()));
        }
        let total = Instant::now();
        let persona_id = PersonaId::resolve(agent_name);
        let persona = persona_id.persona();

        let stage = Instant::now();
        let text = self
            .generator
            .generate(persona, history, message)
            .await
            .inspect_err(|e| {
                warn!(persona = %persona_id, backend = self.generator.name(), "text generation failed: {e}");
            })?;
        let text_ms = stage.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let speech = self.speech.synthesize(&text, persona).await;
        let speech_ms = stage.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let lipsync = self
            .lipsync
            .extract(speech.file.as_ref().map(|f| f.path()))
            .await;
        let lipsync_ms = stage.elapsed().as_millis() as u64;

        let choice = expression::select_random(persona);
        let audio = base64::engine::general_purpose::STANDARD.encode(&speech.bytes);
        // Removes the speech scratch file.
        drop(speech);

        info!(
            persona = %persona_id,
            words = text.split_whitespace().count(),
            cues = lipsync.mouth_cues.len(),
            text_ms,
            speech_ms,
            lipsync_ms,
            total_ms = total.elapsed().as_millis() as u64,
            "response assembled"
        );

        Ok(UnifiedResponse {
            text,
            audio,
            lipsync,
            facial_expression: choice.expression,
            animation: choice.animation.to_owned(),
        })
    }
}
