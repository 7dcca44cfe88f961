//! Async driver for the playback queue.
//!
//! A single task owns the [`PlaybackQueue`] and the avatar surface. While an
//! item is current it plays the audio, samples the viseme timeline every
//! frame, and accepts new items into the queue. The item finishes when the
//! audio output returns or when the fallback timer fires, whichever comes
//! first, so a stuck clip cannot block the queue.

use super::output::{AudioClip, AudioOutput, AvatarSurface};
use super::queue::{Enqueued, PlaybackQueue, PlaybackState};
use super::timeline::VisemeTimeline;
use crate::config::PlaybackConfig;
use crate::error::{AcademyError, Result};
use crate::pipeline::UnifiedResponse;
use crate::viseme::Viseme;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why an item stopped playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The audio output reported the end of the clip.
    AudioEnded,
    /// The audio output failed.
    AudioFailed,
    /// The fallback timer expired first.
    Fallback,
    /// The scheduler was stopped.
    Stopped,
}

/// Handle to a running scheduler.
///
/// Dropping the handle lets the scheduler finish everything already queued
/// and exit; [`stop`](Self::stop) ends it immediately.
pub struct PlaybackScheduler {
    commands: mpsc::UnboundedSender<UnifiedResponse>,
    state: watch::Receiver<PlaybackState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PlaybackScheduler {
    /// Spawn the scheduler task.
    pub fn spawn<S, A>(config: &PlaybackConfig, surface: S, audio: A) -> Self
    where
        S: AvatarSurface,
        A: AudioOutput,
    {
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(PlaybackState::Idle);
        let cancel = CancellationToken::new();
        let worker = Worker {
            queue: PlaybackQueue::new(),
            commands: rx,
            commands_open: true,
            state: state_tx,
            surface,
            audio: Arc::new(audio),
            fallback: Duration::from_secs(config.fallback_secs.max(1)),
            frame: Duration::from_millis(config.frame_ms.max(1)),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());
        Self {
            commands,
            state,
            cancel,
            task,
        }
    }

    /// Append a response to the queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler has stopped.
    pub fn enqueue(&self, response: UnifiedResponse) -> Result<()> {
        self.commands
            .send(response)
            .map_err(|_| AcademyError::Client("playback scheduler has stopped".to_owned()))
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    /// Stop immediately, abandoning anything queued.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Close the queue and wait for everything already queued to play.
    ///
    /// # Errors
    ///
    /// Returns an error if the scheduler task panicked.
    pub async fn drain(self) -> Result<()> {
        let Self { commands, task, .. } = self;
        drop(commands);
        task.await
            .map_err(|e| AcademyError::Client(format!("playback task failed: {e}")))
    }
}

struct Worker<S, A> {
    queue: PlaybackQueue<UnifiedResponse>,
    commands: mpsc::UnboundedReceiver<UnifiedResponse>,
    commands_open: bool,
    state: watch::Sender<PlaybackState>,
    surface: S,
    audio: Arc<A>,
    fallback: Duration,
    frame: Duration,
    cancel: CancellationToken,
}

impl<S: AvatarSurface, A: AudioOutput> Worker<S, A> {
    async fn run(mut self) {
        loop {
            if self.queue.current().is_none() {
                self.publish();
                if !self.commands_open {
                    break;
                }
                tokio::select! {
                    () = self.cancel.cancelled() => break,
                    next = self.commands.recv() => match next {
                        Some(response) => self.accept(response),
                        None => self.commands_open = false,
                    },
                }
                continue;
            }

            self.publish();
            let reason = self.play_current().await;
            if let Some(finished) = self.queue.advance() {
                debug!(?reason, text = %finished.text, "playback item finished");
            }
            if reason == FinishReason::Stopped {
                self.queue.clear();
                break;
            }
        }
        let _ = self.state.send(PlaybackState::Idle);
        debug!("playback scheduler exited");
    }

    fn accept(&mut self, response: UnifiedResponse) {
        match self.queue.enqueue(response) {
            Enqueued::Started => debug!("playback started"),
            Enqueued::Queued { position } => debug!(position, "response queued"),
        }
    }

    fn publish(&self) {
        let state = self.queue.state();
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    async fn play_current(&mut self) -> FinishReason {
        let Some(current) = self.queue.current() else {
            return FinishReason::AudioEnded;
        };
        let timeline = VisemeTimeline::from_lipsync(&current.lipsync);
        let bytes = current.audio_bytes().unwrap_or_else(|e| {
            warn!("response audio is not valid base64: {e}");
            Vec::new()
        });
        let hint = current.lipsync.metadata.duration;
        let clip = AudioClip {
            bytes,
            duration_hint: (hint.is_finite() && hint > 0.0)
                .then(|| Duration::from_secs_f64(hint.min(3600.0))),
        };
        self.surface.begin(current);

        let audio = Arc::clone(&self.audio);
        let playback = audio.play(clip);
        tokio::pin!(playback);
        let fallback = tokio::time::sleep(self.fallback);
        tokio::pin!(fallback);
        let mut frames = tokio::time::interval(self.frame);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let started = Instant::now();
        let mut shown: Option<Viseme> = None;

        let reason = loop {
            tokio::select! {
                () = self.cancel.cancelled() => break FinishReason::Stopped,
                result = &mut playback => match result {
                    Ok(()) => break FinishReason::AudioEnded,
                    Err(e) => {
                        warn!("audio playback failed: {e}");
                        break FinishReason::AudioFailed;
                    }
                },
                () = &mut fallback => {
                    info!(secs = self.fallback.as_secs(), "audio end not signalled, advancing");
                    break FinishReason::Fallback;
                }
                _ = frames.tick() => {
                    let viseme = timeline.viseme_at(started.elapsed().as_secs_f64());
                    if shown != Some(viseme) {
                        self.surface.show_viseme(viseme);
                        shown = Some(viseme);
                    }
                }
                next = self.commands.recv(), if self.commands_open => match next {
                    Some(response) => self.accept(response),
                    None => self.commands_open = false,
                },
            }
        };

        if shown != Some(Viseme::REST) {
            self.surface.show_viseme(Viseme::REST);
        }
        self.surface.finish();
        reason
    }
}
