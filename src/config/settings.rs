use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub push: PushConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Backend selector: "http" or "memory"
    #[serde(default = "default_api_backend")]
    pub backend: String,
    /// Base URL of the notification REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Session bearer token, if the session is authenticated
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Backend selector: "redis" or "memory"
    #[serde(default = "default_push_backend")]
    pub backend: String,
    /// Push channel URL
    #[serde(default = "default_push_url")]
    pub url: String,
    /// Channel name prefix
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
    /// Maximum consecutive failed connection attempts before the channel goes silent
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    /// Fixed delay between connection attempts in seconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_seconds: u64,
}

fn default_api_backend() -> String {
    "http".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_push_backend() -> String {
    "redis".to_string()
}

fn default_push_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_channel_prefix() -> String {
    "notification".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_delay() -> u64 {
    1
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            // Start with default values
            .set_default("api.backend", "http")?
            .set_default("api.base_url", "http://localhost:8080/api")?
            .set_default("api.timeout_seconds", 30)?
            .set_default("push.backend", "redis")?
            .set_default("push.url", "redis://localhost:6379")?
            .set_default("push.channel_prefix", "notification")?
            .set_default("push.max_reconnect_attempts", 5)?
            .set_default("push.reconnect_delay_seconds", 1)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables
            // API_BASE_URL, API_TOKEN, PUSH_URL, etc.
            .add_source(
                Environment::default()
                    .separator("_")
                    .try_parsing(true)
                    .list_separator(","),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            backend: default_api_backend(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            token: None,
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            backend: default_push_backend(),
            url: default_push_url(),
            channel_prefix: default_channel_prefix(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_delay_seconds: default_reconnect_delay(),
        }
    }
}
