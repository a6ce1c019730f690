//! Centralized server configuration.
//!
//! Strongly-typed configuration loaded via the `config` crate from
//! environment variables, with `__` as the nesting separator
//! (e.g. `LLM__API_KEY`, `SESSION__DURATION_MINUTES`).

use serde::Deserialize;

/// Server configuration composed from per-concern sections.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Address the HTTP listener binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Model gateway configuration.
    pub llm: LlmConfig,

    /// Web search configuration.
    pub search: SearchConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Overrides the compiled-in system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Model gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key.
    pub api_key: String,

    /// Deadline for each gateway call, in seconds.
    #[serde(default = "default_llm_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Web search configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint URL.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Search API key.
    pub api_key: String,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Interval between session cleanup runs, in seconds.
    #[serde(default = "default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout_seconds() -> u64 {
    60
}

fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".to_string()
}

fn default_session_duration_minutes() -> i64 {
    // 7 days
    10_080
}

fn default_cleanup_interval_seconds() -> u64 {
    3_600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cleanup_interval_seconds: default_cleanup_interval_seconds(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
