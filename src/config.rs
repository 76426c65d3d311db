use crate::processing::{PipelineConfig, Style};
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_SUMMARY_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_MAX_CHARS_PER_CHUNK: usize = 6000;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The generation-service credential is absent; nothing can be summarized without it.
    #[error("Missing credential: set {0} before running")]
    MissingCredential(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration shared by the batch job and the upload server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer credential for the OpenAI-compatible generation service.
    pub openai_api_key: String,
    /// Base URL of the generation service (without the `/chat/completions` suffix).
    pub openai_base_url: String,
    /// Default model identifier for summaries.
    pub summary_model: String,
    /// Default tone preset.
    pub summary_style: Style,
    /// Default chunk size, in characters.
    pub max_chars_per_chunk: usize,
    /// Default number of chunk requests allowed in flight per document.
    pub chunk_concurrency: usize,
    /// Optional process-wide cap on in-flight generation requests.
    pub max_concurrent_requests: Option<usize>,
    /// Per-request timeout applied by the HTTP client.
    pub generation_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Largest multipart body accepted by `POST /summarize`.
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key = load_env_optional("OPENAI_API_KEY")
            .ok_or_else(|| ConfigError::MissingCredential("OPENAI_API_KEY".into()))?;

        Ok(Self {
            openai_api_key,
            openai_base_url: load_env_optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            summary_model: load_env_optional("SUMMARY_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            summary_style: load_env_optional("SUMMARY_STYLE")
                .map(|value| Style::parse_lossy(&value))
                .unwrap_or_default(),
            max_chars_per_chunk: parse_env_optional("SUMMARY_MAX_CHARS_PER_CHUNK")?
                .unwrap_or(DEFAULT_MAX_CHARS_PER_CHUNK),
            chunk_concurrency: parse_env_optional("SUMMARY_CHUNK_CONCURRENCY")?
                .unwrap_or(1usize)
                .max(1),
            max_concurrent_requests: parse_env_optional::<usize>(
                "GENERATION_MAX_CONCURRENT_REQUESTS",
            )?
            .filter(|value| *value > 0),
            generation_timeout_secs: parse_env_optional("GENERATION_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_GENERATION_TIMEOUT_SECS),
            server_port: parse_env_optional("SERVER_PORT")?,
            max_upload_bytes: parse_env_optional("SERVER_MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }

    /// Pipeline settings derived from the environment defaults.
    pub fn pipeline_defaults(&self) -> PipelineConfig {
        PipelineConfig {
            model: self.summary_model.clone(),
            style: self.summary_style,
            max_chars_per_chunk: self.max_chars_per_chunk,
            chunk_concurrency: self.chunk_concurrency,
            ..PipelineConfig::default()
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
///
/// Returns the error instead of panicking so binaries can exit with a clear message when the
/// credential is absent.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        base_url = %config.openai_base_url,
        model = %config.summary_model,
        style = %config.summary_style,
        max_chars_per_chunk = config.max_chars_per_chunk,
        chunk_concurrency = config.chunk_concurrency,
        max_concurrent_requests = ?config.max_concurrent_requests,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
