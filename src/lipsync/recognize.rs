//! Phoneme recognition with Rhubarb Lip Sync.
//!
//! The recognizer ships next to the server binary in packaged builds and in
//! the working tree during development, so several locations are probed.
//! On macOS an unsigned download is refused by Gatekeeper; that refusal is
//! reported as [`LipSyncError::RecognizerRejected`] rather than a crash.

use super::LipSyncError;
use super::process::{self, ToolError, ToolOutput};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// SIGKILL, which macOS sends to binaries failing signature checks.
const SIGKILL: i32 = 9;

/// Lowercase stderr fragments that indicate an OS code-signing refusal.
const REJECTION_MARKERS: &[&str] = &[
    "code signature",
    "not verified",
    "developer cannot be verified",
    "killed: 9",
    "operation not permitted",
];

fn binary_name() -> String {
    format!("rhubarb{}", std::env::consts::EXE_SUFFIX)
}

/// Ordered candidate locations for the recognizer.
///
/// 1. `explicit` (from config)
/// 2. `<exe dir>/rhubarb/rhubarb` and `<exe dir>/bin/rhubarb` (packaged)
/// 3. `./bin/rhubarb` and `./Rhubarb-Lip-Sync/rhubarb` (development)
/// 4. `PATH` lookup via [`which::which`]
pub fn candidate_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
    let name = binary_name();
    let mut candidates = Vec::with_capacity(6);

    if let Some(p) = explicit {
        candidates.push(p.to_path_buf());
    }

    if let Some(exe_dir) = crate::academy_dirs::executable_dir() {
        candidates.push(exe_dir.join("rhubarb").join(&name));
        candidates.push(exe_dir.join("bin").join(&name));
    }

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("bin").join(&name));
        candidates.push(cwd.join("Rhubarb-Lip-Sync").join(&name));
    }

    if let Ok(found) = which::which("rhubarb") {
        candidates.push(found);
    }

    candidates
}

/// Find the first candidate that exists as a file.
///
/// # Errors
///
/// Returns [`LipSyncError::RecognizerMissing`] listing every probed path.
pub fn resolve(explicit: Option<&Path>) -> Result<PathBuf, LipSyncError> {
    let candidates = candidate_paths(explicit);
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        debug!(path = %found.display(), "phoneme recognizer resolved");
        return Ok(found.clone());
    }
    Err(LipSyncError::RecognizerMissing {
        searched: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Run the recognizer on `wav`, writing JSON cues to `output`.
///
/// Runs `{recognizer} -f json -o {output} {wav} -r {mode}`.
///
/// # Errors
///
/// - [`LipSyncError::RecognizerRejected`] on a code-signing refusal.
/// - [`LipSyncError::RecognizerFailed`] on any other non-zero exit.
/// - [`LipSyncError::Timeout`] if it runs longer than `limit`.
pub async fn recognize(
    recognizer: &Path,
    mode: &str,
    wav: &Path,
    output: &Path,
    limit: Duration,
) -> Result<(), LipSyncError> {
    let args: [&OsStr; 7] = [
        OsStr::new("-f"),
        OsStr::new("json"),
        OsStr::new("-o"),
        output.as_os_str(),
        wav.as_os_str(),
        OsStr::new("-r"),
        OsStr::new(mode),
    ];
    debug!(recognizer = %recognizer.display(), mode, "recognizing phonemes");

    let out = process::run(recognizer, args, limit)
        .await
        .map_err(|e| match e {
            ToolError::Spawn(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                LipSyncError::RecognizerRejected {
                    detail: format!("permission denied: {e}"),
                }
            }
            ToolError::Spawn(e) => LipSyncError::RecognizerMissing {
                searched: format!("{} ({e})", recognizer.display()),
            },
            ToolError::TimedOut => LipSyncError::Timeout {
                stage: "recognize",
                secs: limit.as_secs(),
            },
            ToolError::Wait(e) => LipSyncError::Io(e),
        })?;

    if out.success {
        return Ok(());
    }
    Err(classify_failure(out))
}

/// Distinguish an OS rejection from an ordinary recognizer failure.
fn classify_failure(out: ToolOutput) -> LipSyncError {
    let lowered = out.stderr.to_lowercase();
    if let Some(marker) = REJECTION_MARKERS.iter().find(|m| lowered.contains(**m)) {
        let detail = if out.stderr.is_empty() {
            (*marker).to_owned()
        } else {
            out.stderr
        };
        return LipSyncError::RecognizerRejected { detail };
    }
    if out.signal == Some(SIGKILL) {
        return LipSyncError::RecognizerRejected {
            detail: "killed by the system (SIGKILL) on launch".to_owned(),
        };
    }
    LipSyncError::RecognizerFailed {
        code: out.code,
        stderr: out.stderr,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn failed(stderr: &str, code: Option<i32>, signal: Option<i32>) -> ToolOutput {
        ToolOutput {
            success: false,
            code,
            signal,
            stderr: stderr.to_owned(),
        }
    }

    #[test]
    fn explicit_path_is_probed_first() {
        let explicit = PathBuf::from("/opt/tools/rhubarb");
        let candidates = candidate_paths(Some(&explicit));
        assert_eq!(candidates[0], explicit);
        assert!(candidates.len() >= 3);
    }

    #[test]
    fn resolve_lists_searched_locations() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        match resolve(Some(&missing)) {
            Err(LipSyncError::RecognizerMissing { searched }) => {
                assert!(searched.contains("nope"));
            }
            // A developer machine may have rhubarb installed.
            Ok(found) => assert_ne!(found, missing),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolve_accepts_existing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("rhubarb");
        std::fs::write(&tool, b"#!/bin/sh\n").unwrap();
        assert_eq!(resolve(Some(&tool)).unwrap(), tool);
    }

    #[test]
    fn code_signature_stderr_is_rejection() {
        let err = classify_failure(failed(
            "rhubarb: Code Signature Invalid",
            Some(1),
            None,
        ));
        assert!(matches!(err, LipSyncError::RecognizerRejected { .. }));
        let err = classify_failure(failed(
            "\"rhubarb\" cannot be opened because the developer cannot be verified.",
            Some(126),
            None,
        ));
        assert!(matches!(err, LipSyncError::RecognizerRejected { .. }));
    }

    #[test]
    fn sigkill_is_rejection() {
        let err = classify_failure(failed("", None, Some(SIGKILL)));
        assert!(matches!(err, LipSyncError::RecognizerRejected { .. }));
    }

    #[test]
    fn other_failures_keep_exit_code() {
        let err = classify_failure(failed("Error: unsupported sample format", Some(1), None));
        match err {
            LipSyncError::RecognizerFailed { code, stderr } => {
                assert_eq!(code, Some(1));
                assert!(stderr.contains("unsupported"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
