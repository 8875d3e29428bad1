//! Configuration for speakerkeep, loaded entirely from the environment.
//!
//! Unlike a desktop app layering a TOML file under CLI flags, a headless
//! service reads its configuration once at startup from the process
//! environment. There is no config file here: every setting has a
//! documented default and an `env::var` override.

use std::time::Duration;

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Transcriber HTTP collaborator.
    pub transcriber_url: String,
    /// Path to the diarization worker executable.
    pub diarizer_command: String,
    /// Diarization model identifier forwarded to the worker.
    pub diarizer_model: String,
    /// Base URL of the Embedder HTTP collaborator, if configured.
    pub embedder_url: Option<String>,
    /// Bearer credential for the Embedder, if required.
    pub embedder_api_key: Option<String>,
    /// Root directory for session speaker snapshots. `None` disables
    /// persistence entirely (sessions live in memory only).
    pub speaker_persist_dir: Option<std::path::PathBuf>,
    /// Transcriber request timeout.
    pub transcribe_timeout: Duration,
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// Maximum multipart upload size in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcriber_url: "http://127.0.0.1:8178".to_string(),
            diarizer_command: "diarize-worker".to_string(),
            diarizer_model: "pyannote/speaker-diarization-3.1".to_string(),
            embedder_url: None,
            embedder_api_key: None,
            speaker_persist_dir: None,
            transcribe_timeout: Duration::from_secs(300),
            host: "0.0.0.0".to_string(),
            port: 8179,
            max_upload_bytes: 50_000_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            transcriber_url: env_string("TRANSCRIBER_URL", defaults.transcriber_url),
            diarizer_command: env_string("DIARIZER_COMMAND", defaults.diarizer_command),
            diarizer_model: env_string("DIARIZER_MODEL", defaults.diarizer_model),
            embedder_url: std::env::var("EMBEDDER_URL").ok().filter(|s| !s.is_empty()),
            embedder_api_key: std::env::var("EMBEDDER_API_KEY")
                .ok()
                .filter(|s| !s.is_empty()),
            speaker_persist_dir: std::env::var("SPEAKER_PERSIST_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(std::path::PathBuf::from),
            transcribe_timeout: Duration::from_secs(env_parse(
                "TRANSCRIBE_TIMEOUT_SECS",
                defaults.transcribe_timeout.as_secs(),
            )),
            host: env_string("SERVICE_HOST", defaults.host),
            port: env_parse("SERVICE_PORT", defaults.port),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        };

        tracing::info!(
            transcriber_url = %config.transcriber_url,
            diarizer_command = %config.diarizer_command,
            diarizer_model = %config.diarizer_model,
            embedder_configured = config.embedder_url.is_some(),
            persistence_enabled = config.speaker_persist_dir.is_some(),
            host = %config.host,
            port = config.port,
            "resolved configuration"
        );

        config
    }

    /// Whether embedding-based speaker tracking is configured.
    pub fn embedder_configured(&self) -> bool {
        self.embedder_url.is_some()
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
