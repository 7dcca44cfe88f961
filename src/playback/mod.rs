//! Client-side playback of assembled responses.
//!
//! Responses can arrive faster than they can be voiced. The queue makes sure
//! exactly one drives the avatar at a time, in arrival order.

pub mod output;
pub mod queue;
pub mod scheduler;
pub mod timeline;

pub use output::{AudioClip, AudioOutput, AvatarSurface, LogSurface, TimedAudioOutput};
pub use queue::{Enqueued, PlaybackQueue, PlaybackState};
pub use scheduler::{FinishReason, PlaybackScheduler};
pub use timeline::VisemeTimeline;
