//! Centralized filesystem paths.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Config | `~/Library/Application Support/academy/` | `~/.config/academy/` |
//! | Data (logs) | `~/Library/Application Support/academy/` | `~/.local/share/academy/` |
//! | Scratch | `$TMPDIR/academy/` | `/tmp/academy/` |
//!
//! # Environment Overrides
//!
//! - `ACADEMY_CONFIG_DIR`: overrides [`config_dir`]
//! - `ACADEMY_DATA_DIR`: overrides [`data_dir`]
//! - `ACADEMY_SCRATCH_DIR`: overrides [`scratch_dir`]
//! - `ACADEMY_ASSETS_DIR`: overrides [`assets_dir`]

use std::path::PathBuf;

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ACADEMY_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("academy"))
        .unwrap_or_else(|| PathBuf::from("/tmp/academy-config"))
}

/// Application data root directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ACADEMY_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("academy"))
        .unwrap_or_else(|| PathBuf::from("/tmp/academy-data"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Process-local scratch directory for per-request audio files.
///
/// Every file placed here is owned by exactly one request and removed
/// before that request completes (see [`crate::scratch::ScratchFile`]).
#[must_use]
pub fn scratch_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ACADEMY_SCRATCH_DIR") {
        return PathBuf::from(override_dir);
    }
    std::env::temp_dir().join("academy")
}

/// Bundled assets directory (placeholder audio, tool binaries).
///
/// Packaged builds ship `assets/` next to the executable; development
/// checkouts keep it in the working directory. The first that exists wins.
#[must_use]
pub fn assets_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ACADEMY_ASSETS_DIR") {
        return PathBuf::from(override_dir);
    }
    let packaged = executable_dir().map(|d| d.join("assets"));
    if let Some(dir) = packaged.as_ref().filter(|d| d.is_dir()) {
        return dir.clone();
    }
    std::env::current_dir()
        .map(|d| d.join("assets"))
        .unwrap_or_else(|_| PathBuf::from("assets"))
}

/// Default placeholder clip used when remote speech synthesis fails.
#[must_use]
pub fn placeholder_audio_file() -> PathBuf {
    assets_dir().join("audio").join("placeholder.mp3")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Directory containing the running executable, if it can be determined.
#[must_use]
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn logs_dir_is_under_data_dir() {
        assert!(logs_dir().starts_with(data_dir()));
        assert!(logs_dir().ends_with("logs"));
    }

    #[test]
    fn config_file_is_toml() {
        let path = config_file();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("config.toml"));
    }

    #[test]
    fn placeholder_lives_in_assets_audio() {
        let path = placeholder_audio_file();
        assert!(path.ends_with("audio/placeholder.mp3"));
    }

    #[test]
    fn scratch_dir_is_absolute_or_overridden() {
        let dir = scratch_dir();
        assert!(!dir.as_os_str().is_empty());
    }
}
