//! Runtime configuration from the environment

use std::path::PathBuf;
use std::time::Duration;

use crate::ai::ClientConfig;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Sopwright runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Flat directory rendered documents are written to
    pub storage_dir: PathBuf,
    /// Seconds between keep-alive events on a push stream
    pub heartbeat_secs: u64,
    /// Chat-completions endpoint
    pub api_base_url: String,
    /// OpenRouter API key
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            storage_dir: PathBuf::from("storage/temp"),
            heartbeat_secs: 5,
            api_base_url: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_address: var("SOPWRIGHT_BIND").unwrap_or(defaults.bind_address),
            port: var("SOPWRIGHT_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            storage_dir: var("SOPWRIGHT_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            heartbeat_secs: var("SOPWRIGHT_HEARTBEAT_SECS")
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.heartbeat_secs),
            api_base_url: var("CHATBOT_BASE_URL").unwrap_or(defaults.api_base_url),
            api_key: var("OPENROUTER_API_KEY").filter(|k| !k.is_empty()),
            model: var("CHATBOT_MODEL").unwrap_or(defaults.model),
            temperature: var("CHATBOT_TEMPERATURE")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.temperature),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    /// Upstream client settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}
