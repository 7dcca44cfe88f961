//! Parsing and normalizing recognizer output.
//!
//! The recognizer writes
//! `{"metadata": {...}, "mouthCues": [{"start": 0.0, "end": 0.1, "value": "X"}, ...]}`.
//! Only `mouthCues` is read; the rest is regenerated by the caller.

use super::{LipSyncError, MouthCue};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognizerOutput {
    mouth_cues: Option<serde_json::Value>,
}

/// Parse recognizer JSON into validated, time-ordered cues.
///
/// # Errors
///
/// Returns [`LipSyncError::MalformedOutput`] if the document is not JSON,
/// lacks a `mouthCues` array, or contains an invalid cue.
pub fn parse(raw: &str) -> Result<Vec<MouthCue>, LipSyncError> {
    let output: RecognizerOutput =
        serde_json::from_str(raw).map_err(|e| LipSyncError::MalformedOutput {
            reason: format!("not valid JSON: {e}"),
        })?;
    let cues = match output.mouth_cues {
        Some(value @ serde_json::Value::Array(_)) => value,
        Some(_) => {
            return Err(LipSyncError::MalformedOutput {
                reason: "`mouthCues` is not an array".to_owned(),
            });
        }
        None => {
            return Err(LipSyncError::MalformedOutput {
                reason: "missing `mouthCues`".to_owned(),
            });
        }
    };
    let cues: Vec<MouthCue> =
        serde_json::from_value(cues).map_err(|e| LipSyncError::MalformedOutput {
            reason: format!("invalid cue: {e}"),
        })?;
    normalize(cues)
}

/// Validate cues, sort them by start time and trim overlaps.
///
/// An overlapping cue is cut off where the next one begins, so the result
/// satisfies `start[i] <= end[i] <= start[i + 1]`.
///
/// # Errors
///
/// Returns [`LipSyncError::MalformedOutput`] for negative, non-finite or
/// reversed cue times.
pub fn normalize(mut cues: Vec<MouthCue>) -> Result<Vec<MouthCue>, LipSyncError> {
    for cue in &cues {
        if !cue.start.is_finite() || !cue.end.is_finite() || cue.start < 0.0 {
            return Err(LipSyncError::MalformedOutput {
                reason: format!("cue has invalid times {}..{}", cue.start, cue.end),
            });
        }
        if cue.end < cue.start {
            return Err(LipSyncError::MalformedOutput {
                reason: format!("cue ends before it starts ({}..{})", cue.start, cue.end),
            });
        }
    }

    cues.sort_by(|a, b| a.start.total_cmp(&b.start));
    for i in 1..cues.len() {
        let next_start = cues[i].start;
        let prev = &mut cues[i - 1];
        if prev.end > next_start {
            prev.end = next_start;
        }
    }
    Ok(cues)
}

/// End of the last cue, or `0` with no cues.
pub fn duration(cues: &[MouthCue]) -> f64 {
    cues.last().map_or(0.0, |cue| cue.end)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::viseme::Viseme;

    fn cue(start: f64, end: f64, value: Viseme) -> MouthCue {
        MouthCue { start, end, value }
    }

    #[test]
    fn parses_recognizer_document() {
        let raw = r#"{
            "metadata": {"soundFile": "/tmp/message.pcm.wav", "duration": 0.47},
            "mouthCues": [
                {"start": 0.00, "end": 0.05, "value": "X"},
                {"start": 0.05, "end": 0.27, "value": "D"},
                {"start": 0.27, "end": 0.47, "value": "X"}
            ]
        }"#;
        let cues = parse(raw).unwrap();
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[1].value, Viseme::D);
        assert!((duration(&cues) - 0.47).abs() < 1e-9);
    }

    #[test]
    fn empty_cue_array_is_valid() {
        let cues = parse(r#"{"mouthCues": []}"#).unwrap();
        assert!(cues.is_empty());
        assert_eq!(duration(&cues), 0.0);
    }

    #[test]
    fn missing_or_wrong_cue_field_is_malformed() {
        for raw in [
            r#"{"metadata": {}}"#,
            r#"{"mouthCues": {"start": 0}}"#,
            r#"{"mouthCues": null}"#,
            "not json",
        ] {
            assert!(
                matches!(parse(raw), Err(LipSyncError::MalformedOutput { .. })),
                "accepted {raw}"
            );
        }
    }

    #[test]
    fn unknown_viseme_code_is_malformed() {
        let raw = r#"{"mouthCues": [{"start": 0.0, "end": 0.1, "value": "Q"}]}"#;
        assert!(matches!(parse(raw), Err(LipSyncError::MalformedOutput { .. })));
    }

    #[test]
    fn reversed_or_negative_times_are_rejected() {
        assert!(normalize(vec![cue(0.5, 0.2, Viseme::A)]).is_err());
        assert!(normalize(vec![cue(-0.1, 0.2, Viseme::A)]).is_err());
        assert!(normalize(vec![cue(0.0, f64::NAN, Viseme::A)]).is_err());
    }

    #[test]
    fn cues_are_sorted_and_overlaps_trimmed() {
        let cues = normalize(vec![
            cue(0.3, 0.6, Viseme::C),
            cue(0.0, 0.4, Viseme::B),
            cue(0.6, 0.6, Viseme::X),
        ])
        .unwrap();
        assert_eq!(cues[0].value, Viseme::B);
        assert_eq!(cues[0].end, 0.3);
        for pair in cues.windows(2) {
            assert!(pair[0].start <= pair[0].end);
            assert!(pair[0].end <= pair[1].start);
        }
        assert_eq!(duration(&cues), 0.6);
    }
}
