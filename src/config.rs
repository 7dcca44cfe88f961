//! Configuration types for the avatar response pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcademyConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Language model settings.
    pub llm: LlmConfig,
    /// Text-to-speech settings.
    pub tts: TtsConfig,
    /// External lip-sync tooling settings.
    pub lipsync: LipSyncConfig,
    /// Client-side playback settings.
    pub playback: PlaybackConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` = auto-assign).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
        }
    }
}

/// Which language model API to talk to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Google Gemini `generateContent` API.
    #[default]
    Gemini,
    /// Any OpenAI-compatible `/v1/chat/completions` server.
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

/// Language model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which API dialect to use.
    pub provider: LlmProvider,
    /// Base URL of the API (without the `/v1...` suffix).
    pub api_url: String,
    /// Model name to request.
    pub model: String,
    /// API key. Usually supplied through `ACADEMY_LLM_API_KEY`.
    pub api_key: String,
    /// Sampling temperature. Kept moderate so replies stay short.
    pub temperature: f64,
    /// Maximum tokens to generate per reply.
    pub max_tokens: u32,
    /// Hard cap on reply length in words, stated in the prompt and enforced
    /// on the generated text.
    pub max_words: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            api_url: "https://generativelanguage.googleapis.com".to_owned(),
            model: "gemini-1.5-flash".to_owned(),
            api_key: String::new(),
            temperature: 0.65,
            max_tokens: 150,
            max_words: 60,
            timeout_secs: 30,
        }
    }
}

/// Text-to-speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Base URL of the speech synthesis API.
    pub api_url: String,
    /// Synthesis model identifier.
    pub model_id: String,
    /// API key. Usually supplied through `ACADEMY_TTS_API_KEY`.
    pub api_key: String,
    /// Voice stability (0.0–1.0).
    pub stability: f32,
    /// Voice similarity boost (0.0–1.0).
    pub similarity_boost: f32,
    /// Placeholder clip played when remote synthesis fails.
    /// `None` uses the bundled `assets/audio/placeholder.mp3`.
    pub placeholder_audio: Option<PathBuf>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.elevenlabs.io".to_owned(),
            model_id: "eleven_multilingual_v2".to_owned(),
            api_key: String::new(),
            stability: 0.5,
            similarity_boost: 0.75,
            placeholder_audio: None,
            timeout_secs: 30,
        }
    }
}

impl TtsConfig {
    /// Resolved placeholder clip path.
    pub fn placeholder_path(&self) -> PathBuf {
        self.placeholder_audio
            .clone()
            .unwrap_or_else(crate::academy_dirs::placeholder_audio_file)
    }
}

/// External lip-sync tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LipSyncConfig {
    /// Audio decoder executable (name on `PATH` or absolute path).
    pub ffmpeg: PathBuf,
    /// Explicit phoneme recognizer path. `None` probes the packaged and
    /// development layouts, then `PATH`.
    pub rhubarb: Option<PathBuf>,
    /// Recognizer mode flag. `phonetic` is the fast, language-independent mode.
    pub recognizer_mode: String,
    /// Upper bound for each external tool invocation, in seconds.
    pub timeout_secs: u64,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            rhubarb: None,
            recognizer_mode: "phonetic".to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Client playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Upper bound on a single item's playback before the queue advances
    /// regardless of the audio end signal.
    pub fallback_secs: u64,
    /// Viseme sampling interval in milliseconds.
    pub frame_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fallback_secs: 10,
            frame_ms: 16,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for daily-rotated log files. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "academy=info,reqwest=warn".to_owned(),
            directory: None,
        }
    }
}

impl AcademyConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AcademyError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AcademyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::academy_dirs::config_file()
    }

    /// Apply environment variable overrides on top of the loaded file.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `ACADEMY_LLM_API_KEY` | `llm.api_key` |
    /// | `ACADEMY_TTS_API_KEY` | `tts.api_key` |
    /// | `ACADEMY_HOST` | `server.host` |
    /// | `ACADEMY_PORT` | `server.port` |
    ///
    /// # Errors
    ///
    /// Returns an error if `ACADEMY_PORT` is not a valid port number.
    pub fn apply_env_overrides(&mut self) -> crate::error::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> crate::error::Result<()> {
        if let Some(key) = lookup("ACADEMY_LLM_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(key) = lookup("ACADEMY_TTS_API_KEY") {
            self.tts.api_key = key;
        }
        if let Some(host) = lookup("ACADEMY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ACADEMY_PORT") {
            self.server.port = port.trim().parse().map_err(|_| {
                crate::error::AcademyError::Config(format!("invalid ACADEMY_PORT: {port}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AcademyConfig::default();
        assert!(config.llm.max_tokens > 0);
        assert!(config.llm.max_words > 0);
        assert!(config.llm.temperature >= 0.6 && config.llm.temperature <= 0.7);
        assert!(config.lipsync.timeout_secs > 0);
        assert_eq!(config.lipsync.recognizer_mode, "phonetic");
        assert_eq!(config.playback.fallback_secs, 10);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AcademyConfig::default();
        config.server.port = 8123;
        config.llm.provider = LlmProvider::OpenAi;
        config.lipsync.rhubarb = Some(PathBuf::from("/opt/rhubarb/rhubarb"));

        config.save_to_file(&path).unwrap();
        let loaded = AcademyConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 8123);
        assert_eq!(loaded.llm.provider, LlmProvider::OpenAi);
        assert_eq!(
            loaded.lipsync.rhubarb.as_deref(),
            Some(std::path::Path::new("/opt/rhubarb/rhubarb"))
        );
    }

    #[test]
    fn partial_file_uses_defaults() {
        let config: AcademyConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.tts.model_id, "eleven_multilingual_v2");
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = AcademyConfig::from_file(std::path::Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(AcademyConfig::from_file(&path).is_err());
    }

    #[test]
    fn provider_accepts_alias() {
        #[derive(Deserialize)]
        struct Wrapper {
            provider: LlmProvider,
        }
        let w: Wrapper = toml::from_str("provider = \"openai-compatible\"").unwrap();
        assert_eq!(w.provider, LlmProvider::OpenAi);
    }

    #[test]
    fn env_overrides_replace_secrets_and_port() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ACADEMY_LLM_API_KEY", "llm-secret"),
            ("ACADEMY_TTS_API_KEY", "tts-secret"),
            ("ACADEMY_PORT", "4100"),
        ]);
        let mut config = AcademyConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| (*v).to_owned()))
            .unwrap();
        assert_eq!(config.llm.api_key, "llm-secret");
        assert_eq!(config.tts.api_key, "tts-secret");
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn invalid_port_override_is_rejected() {
        let mut config = AcademyConfig::default();
        let result = config.apply_overrides(|k| (k == "ACADEMY_PORT").then(|| "nope".to_owned()));
        assert!(result.is_err());
    }

    #[test]
    fn placeholder_path_prefers_configured_value() {
        let config = TtsConfig {
            placeholder_audio: Some(PathBuf::from("/srv/clip.mp3")),
            ..TtsConfig::default()
        };
        assert_eq!(config.placeholder_path(), PathBuf::from("/srv/clip.mp3"));
    }
}
