//! Per-request scratch files.
//!
//! Speech audio, the transcoded waveform and the recognizer output pass
//! between pipeline stages as files. Every such file is wrapped in a
//! [`ScratchFile`], which deletes it on drop, so no exit path leaks one.
//! Names combine a millisecond timestamp with a random suffix, so
//! concurrent requests never collide.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Owned path to a scratch file; the file is removed when this is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Reserve a fresh unique path in `dir` without creating the file.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created.
    pub fn reserve(dir: &Path, prefix: &str, extension: &str) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(unique_name(prefix, extension)),
        })
    }

    /// Create a scratch file in `dir` holding `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn write(dir: &Path, prefix: &str, extension: &str, bytes: &[u8]) -> io::Result<Self> {
        let file = Self::reserve(dir, prefix, extension)?;
        tokio::fs::write(&file.path, bytes).await?;
        Ok(file)
    }

    /// Take ownership of an existing (or future) file at `path`.
    pub fn from_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "scratch file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), "scratch cleanup failed: {e}"),
        }
    }
}

/// `{prefix}_{unix_millis}_{8 hex}.{extension}`
pub fn unique_name(prefix: &str, extension: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{millis}_{}.{extension}", &suffix[..8])
}
