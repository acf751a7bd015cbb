use crate::pipeline::SummaryLength;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Doc Digest server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the summarization service that turns extracted text into documents.
    pub summarizer_url: String,
    /// Optional override for the Ollama runtime used for image transcription.
    pub ocr_url: Option<String>,
    /// Vision model identifier passed to the OCR runtime.
    pub ocr_model: String,
    /// Default summary length applied when an upload does not request one.
    pub default_summary_length: Option<SummaryLength>,
    /// Optional cap on accepted upload sizes, in bytes.
    pub max_upload_bytes: Option<usize>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Optional log file override; defaults to `logs/docdigest.log`.
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            summarizer_url: load_env("SUMMARIZER_URL")?,
            ocr_url: load_env_optional("OCR_URL"),
            ocr_model: load_env("OCR_MODEL")?,
            default_summary_length: load_env_optional("DEFAULT_SUMMARY_LENGTH")
                .map(|value| {
                    value.parse().map_err(|()| {
                        ConfigError::InvalidValue("DEFAULT_SUMMARY_LENGTH".to_string())
                    })
                })
                .transpose()?,
            max_upload_bytes: load_env_optional("MAX_UPLOAD_BYTES")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("MAX_UPLOAD_BYTES".into()))
                })
                .transpose()?,
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            log_file: load_env_optional("DOCDIGEST_LOG_FILE"),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        summarizer_url = %config.summarizer_url,
        ocr_url = ?config.ocr_url,
        ocr_model = %config.ocr_model,
        default_summary_length = ?config.default_summary_length,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
