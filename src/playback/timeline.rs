//! Mouth shape lookup by playback offset.

use crate::lipsync::{LipSync, MouthCue};
use crate::viseme::Viseme;

/// Time-indexed view over a response's mouth cues.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisemeTimeline {
    cues: Vec<MouthCue>,
}

impl VisemeTimeline {
    /// Build from cues already ordered by start time.
    pub fn new(cues: Vec<MouthCue>) -> Self {
        Self { cues }
    }

    /// Build from a lip-sync result.
    pub fn from_lipsync(lipsync: &LipSync) -> Self {
        Self::new(lipsync.mouth_cues.clone())
    }

    /// Shape to show `secs` into playback; [`Viseme::REST`] between or after cues.
    pub fn viseme_at(&self, secs: f64) -> Viseme {
        // First cue starting after `secs`; the candidate is the one before it.
        let idx = self.cues.partition_point(|cue| cue.start <= secs);
        if idx == 0 {
            return Viseme::REST;
        }
        let cue = &self.cues[idx - 1];
        if secs < cue.end {
            cue.value
        } else {
            Viseme::REST
        }
    }

    /// End of the last cue in seconds.
    pub fn duration(&self) -> f64 {
        crate::lipsync::cues::duration(&self.cues)
    }

    /// Whether there are no cues.
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
