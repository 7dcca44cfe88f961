//! Seams between the scheduler and whatever renders the avatar.
//!
//! A GUI or 3D front end implements [`AvatarSurface`] and [`AudioOutput`];
//! the headless chat client uses [`LogSurface`] and [`TimedAudioOutput`].

use crate::pipeline::UnifiedResponse;
use crate::viseme::Viseme;
use async_trait::async_trait;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, info};

/// One clip handed to an [`AudioOutput`].
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Encoded audio bytes (MP3 or WAV).
    pub bytes: Vec<u8>,
    /// Expected length from the lip-sync metadata, if known.
    pub duration_hint: Option<Duration>,
}

/// Plays audio; the returned future completes when playback ends.
#[async_trait]
pub trait AudioOutput: Send + Sync + 'static {
    /// Play `clip` to the end.
    ///
    /// # Errors
    ///
    /// Returns a description of the playback failure.
    async fn play(&self, clip: AudioClip) -> Result<(), String>;
}

/// Receives the visual side of playback.
pub trait AvatarSurface: Send + 'static {
    /// A response became current.
    fn begin(&mut self, response: &UnifiedResponse);

    /// The mouth shape changed.
    fn show_viseme(&mut self, viseme: Viseme);

    /// The current response finished (mouth already at rest).
    fn finish(&mut self);
}

/// "Plays" audio by waiting for its length.
///
/// WAV clips are measured from their header; other formats fall back to the
/// lip-sync duration hint.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimedAudioOutput;

impl TimedAudioOutput {
    /// Length of `clip` as this output would play it.
    pub fn clip_length(clip: &AudioClip) -> Duration {
        wav_length(&clip.bytes)
            .or(clip.duration_hint)
            .unwrap_or(Duration::ZERO)
    }
}

#[async_trait]
impl AudioOutput for TimedAudioOutput {
    async fn play(&self, clip: AudioClip) -> Result<(), String> {
        let length = Self::clip_length(&clip);
        debug!(length_ms = length.as_millis() as u64, "timed playback");
        tokio::time::sleep(length).await;
        Ok(())
    }
}

fn wav_length(bytes: &[u8]) -> Option<Duration> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    let frames = u64::from(reader.duration());
    Some(Duration::from_millis(frames * 1000 / u64::from(spec.sample_rate)))
}

/// Writes avatar changes to the log.
#[derive(Debug, Default)]
pub struct LogSurface {
    last: Option<Viseme>,
}

impl AvatarSurface for LogSurface {
    fn begin(&mut self, response: &UnifiedResponse) {
        info!(
            expression = %response.facial_expression,
            animation = %response.animation,
            cues = response.lipsync.mouth_cues.len(),
            "▶ {}",
            response.text
        );
    }

    fn show_viseme(&mut self, viseme: Viseme) {
        if self.last != Some(viseme) {
            debug!(%viseme, "mouth");
            self.last = Some(viseme);
        }
    }

    fn finish(&mut self) {
        self.last = None;
        debug!("response finished");
    }
}
