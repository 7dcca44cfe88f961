//! Lip-sync extraction from synthesized speech.
//!
//! Two external stages run per clip:
//!
//! 1. [`transcode`]: the audio decoder (`ffmpeg`) converts the clip into a
//!    PCM WAV file beside it.
//! 2. [`recognize`]: the phoneme recognizer (`rhubarb`) reads the WAV and
//!    writes a JSON file of timed mouth cues, which [`cues`] parses.
//!
//! [`LipSyncExtractor::extract`] never fails. Any stage error becomes an
//! empty cue list with the error text in `metadata.error`, so the avatar
//! keeps its mouth closed instead of the request failing.

pub mod cues;
pub mod recognize;
pub mod transcode;

mod process;

use crate::config::LipSyncConfig;
use crate::scratch::ScratchFile;
use crate::viseme::Viseme;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Errors from the lip-sync stages.
///
/// The `Display` text is what clients see in `metadata.error`.
#[derive(Debug, thiserror::Error)]
pub enum LipSyncError {
    /// The audio decoder could not be started.
    #[error("audio decoder `{program}` is not installed or not executable")]
    DecoderMissing {
        /// Program that failed to start.
        program: PathBuf,
    },

    /// The audio decoder exited with an error.
    #[error("audio decoder failed (exit code {code:?}): {stderr}")]
    DecoderFailed {
        /// Exit code, `None` if killed by a signal.
        code: Option<i32>,
        /// Tail of the decoder's stderr.
        stderr: String,
    },

    /// No phoneme recognizer was found in any candidate location.
    #[error("phoneme recognizer not found (searched: {searched})")]
    RecognizerMissing {
        /// Comma-separated list of probed paths.
        searched: String,
    },

    /// The operating system refused to run the recognizer.
    #[error(
        "phoneme recognizer was blocked by the operating system ({detail}); \
         allow the binary in the system security settings"
    )]
    RecognizerRejected {
        /// What the OS reported.
        detail: String,
    },

    /// The recognizer exited with an error.
    #[error("phoneme recognizer failed (exit code {code:?}): {stderr}")]
    RecognizerFailed {
        /// Exit code, `None` if killed by a signal.
        code: Option<i32>,
        /// Tail of the recognizer's stderr.
        stderr: String,
    },

    /// An external tool did not finish in time.
    #[error("{stage} timed out after {secs}s")]
    Timeout {
        /// Stage name (`transcode` or `recognize`).
        stage: &'static str,
        /// Limit that was exceeded.
        secs: u64,
    },

    /// The recognizer exited cleanly but wrote no output file.
    #[error("phoneme recognizer produced no output file")]
    MissingOutput,

    /// The recognizer output could not be understood.
    #[error("malformed lip-sync output: {reason}")]
    MalformedOutput {
        /// What was wrong.
        reason: String,
    },

    /// No audio file was available to analyse.
    #[error("no audio file available for lip-sync")]
    NoInput,

    /// Filesystem error around the stages.
    #[error("lip-sync I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One timed mouth shape. Times are seconds from the start of the clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds, never before `start`.
    pub end: f64,
    /// Mouth shape.
    pub value: Viseme,
}

/// Facts about a lip-sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LipSyncMetadata {
    /// Audio file the cues were computed from.
    pub sound_file: String,
    /// End of the last cue in seconds; `0` with no cues.
    pub duration: f64,
    /// When extraction finished.
    pub processed_at: DateTime<Utc>,
    /// Why the cue list is empty, if extraction failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Lip-sync result for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LipSync {
    /// Run metadata.
    pub metadata: LipSyncMetadata,
    /// Cues ordered by start time, non-overlapping. May be empty.
    pub mouth_cues: Vec<MouthCue>,
}

impl LipSync {
    /// A successful result.
    pub fn from_cues(sound_file: &Path, mouth_cues: Vec<MouthCue>) -> Self {
        Self {
            metadata: LipSyncMetadata {
                sound_file: sound_file.display().to_string(),
                duration: cues::duration(&mouth_cues),
                processed_at: Utc::now(),
                error: None,
            },
            mouth_cues,
        }
    }

    /// The degraded result: no cues and the reason.
    pub fn degraded(sound_file: Option<&Path>, error: &LipSyncError) -> Self {
        Self {
            metadata: LipSyncMetadata {
                sound_file: sound_file.map(|p| p.display().to_string()).unwrap_or_default(),
                duration: 0.0,
                processed_at: Utc::now(),
                error: Some(error.to_string()),
            },
            mouth_cues: Vec::new(),
        }
    }

    /// Whether extraction failed.
    pub fn is_degraded(&self) -> bool {
        self.metadata.error.is_some()
    }
}

/// Runs the transcode and recognize stages against a speech clip.
#[derive(Debug, Clone)]
pub struct LipSyncExtractor {
    decoder: PathBuf,
    recognizer: Option<PathBuf>,
    mode: String,
    timeout: Duration,
}

impl LipSyncExtractor {
    /// Create an extractor from config.
    pub fn new(config: &LipSyncConfig) -> Self {
        Self {
            decoder: config.ffmpeg.clone(),
            recognizer: config.rhubarb.clone(),
            mode: config.recognizer_mode.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }

    /// Extract mouth cues from `audio`. Never fails; see [`LipSync::degraded`].
    ///
    /// The intermediate WAV and JSON files are deleted before returning on
    /// every path.
    pub async fn extract(&self, audio: Option<&Path>) -> LipSync {
        let Some(audio) = audio else {
            warn!("lip-sync skipped: no audio file");
            return LipSync::degraded(None, &LipSyncError::NoInput);
        };
        let start = Instant::now();
        let result = self.try_extract(audio).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(cues) => {
                info!(cues = cues.len(), elapsed_ms, "lip-sync ready");
                LipSync::from_cues(audio, cues)
            }
            Err(e) => {
                warn!(elapsed_ms, "lip-sync degraded to closed mouth: {e}");
                LipSync::degraded(Some(audio), &e)
            }
        }
    }

    /// Run both stages, propagating the first failure.
    ///
    /// # Errors
    ///
    /// Any [`LipSyncError`] from either stage.
    pub async fn try_extract(&self, audio: &Path) -> Result<Vec<MouthCue>, LipSyncError> {
        let recognizer = recognize::resolve(self.recognizer.as_deref())?;

        // `.pcm.wav` keeps the output distinct from a `.wav` input.
        let wav = ScratchFile::from_path(audio.with_extension("pcm.wav"));
        let json = ScratchFile::from_path(audio.with_extension("json"));

        transcode::transcode(&self.decoder, audio, wav.path(), self.timeout).await?;
        recognize::recognize(&recognizer, &self.mode, wav.path(), json.path(), self.timeout)
            .await?;

        let raw = match tokio::fs::read_to_string(json.path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LipSyncError::MissingOutput);
            }
            Err(e) => return Err(e.into()),
        };
        cues::parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn metadata_serializes_camel_case_without_empty_error() {
        let cues = vec![MouthCue {
            start: 0.0,
            end: 0.4,
            value: Viseme::B,
        }];
        let lipsync = LipSync::from_cues(Path::new("/tmp/message_1.wav"), cues);
        let json = serde_json::to_value(&lipsync).unwrap();
        assert_eq!(json["metadata"]["soundFile"], "/tmp/message_1.wav");
        assert!((json["metadata"]["duration"].as_f64().unwrap() - 0.4).abs() < 1e-9);
        assert!(json["metadata"]["processedAt"].is_string());
        assert!(json["metadata"].get("error").is_none());
        assert_eq!(json["mouthCues"][0]["value"], "B");
    }

    #[test]
    fn degraded_result_carries_reason() {
        let lipsync = LipSync::degraded(None, &LipSyncError::MissingOutput);
        assert!(lipsync.is_degraded());
        assert!(lipsync.mouth_cues.is_empty());
        assert_eq!(lipsync.metadata.duration, 0.0);
        let json = serde_json::to_value(&lipsync).unwrap();
        assert_eq!(json["mouthCues"], serde_json::json!([]));
        assert!(json["metadata"]["error"].as_str().unwrap().contains("no output"));
    }

    #[test]
    fn rejection_message_is_readable() {
        let err = LipSyncError::RecognizerRejected {
            detail: "code signature invalid".to_owned(),
        };
        let text = err.to_string();
        assert!(text.contains("blocked by the operating system"));
        assert!(text.contains("code signature invalid"));
    }

    #[tokio::test]
    async fn missing_input_degrades() {
        let extractor = LipSyncExtractor::new(&LipSyncConfig::default());
        let lipsync = extractor.extract(None).await;
        assert!(lipsync.is_degraded());
        assert_eq!(lipsync.metadata.sound_file, "");
    }

    #[tokio::test]
    async fn missing_recognizer_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("message.mp3");
        std::fs::write(&audio, b"ID3").unwrap();
        let config = LipSyncConfig {
            rhubarb: Some(dir.path().join("no-such-rhubarb")),
            ..LipSyncConfig::default()
        };
        // The explicit path is probed first; if a rhubarb happens to be on
        // PATH the test still degrades because the decoder input is junk.
        let lipsync = LipSyncExtractor::new(&config).extract(Some(&audio)).await;
        assert!(lipsync.is_degraded());
        assert!(lipsync.mouth_cues.is_empty());
        assert!(!dir.path().join("message.pcm.wav").exists());
        assert!(!dir.path().join("message.json").exists());
    }
}
