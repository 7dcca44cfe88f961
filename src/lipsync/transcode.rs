//! Audio decoding into the recognizer's input format.

use super::LipSyncError;
use super::process::{self, ToolError};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Decode `input` into a PCM WAV at `output` with the external decoder.
///
/// Runs `{decoder} -y -i {input} {output}`.
///
/// # Errors
///
/// - [`LipSyncError::DecoderMissing`] if the decoder cannot be started.
/// - [`LipSyncError::DecoderFailed`] on a non-zero exit.
/// - [`LipSyncError::Timeout`] if it runs longer than `limit`.
pub async fn transcode(
    decoder: &Path,
    input: &Path,
    output: &Path,
    limit: Duration,
) -> Result<(), LipSyncError> {
    let args: [&OsStr; 4] = [
        OsStr::new("-y"),
        OsStr::new("-i"),
        input.as_os_str(),
        output.as_os_str(),
    ];
    debug!(decoder = %decoder.display(), input = %input.display(), "transcoding");

    let out = process::run(decoder, args, limit)
        .await
        .map_err(|e| match e {
            ToolError::Spawn(_) => LipSyncError::DecoderMissing {
                program: decoder.to_path_buf(),
            },
            ToolError::TimedOut => LipSyncError::Timeout {
                stage: "transcode",
                secs: limit.as_secs(),
            },
            ToolError::Wait(e) => LipSyncError::Io(e),
        })?;

    if !out.success {
        return Err(LipSyncError::DecoderFailed {
            code: out.code,
            stderr: out.stderr,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[tokio::test]
    async fn missing_decoder_is_reported_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let err = transcode(
            &dir.path().join("ffmpeg-missing"),
            &dir.path().join("in.mp3"),
            &dir.path().join("out.wav"),
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        match err {
            LipSyncError::DecoderMissing { program } => {
                assert!(program.ends_with("ffmpeg-missing"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_decoder_failure() {
        let err = transcode(
            Path::new("false"),
            Path::new("in.mp3"),
            Path::new("out.wav"),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LipSyncError::DecoderFailed { code: Some(1), .. }));
    }
}
