//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::core::invoker::RetryPolicy;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-opus-4-1";
const FAST_MODEL: &str = "claude-sonnet-4-5";

/// Configuration for translator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Messages API key (`ANTHROPIC_API_KEY`)
    pub api_key: String,
    /// Messages endpoint URL
    pub api_endpoint: String,
    /// Value of the `anthropic-version` header
    pub api_version: String,
    /// Model id for [`ModelHint::Default`](crate::core::models::ModelHint::Default)
    pub default_model: String,
    /// Model id for [`ModelHint::Fast`](crate::core::models::ModelHint::Fast)
    pub fast_model: String,
    /// Output token limit per exchange
    pub max_tokens: u32,
    /// Attempts per invocation
    pub max_attempts: u32,
    /// Per-attempt timeout
    pub attempt_timeout_ms: u64,
    /// First backoff
    pub backoff_base_ms: u64,
    /// Backoff cap
    pub backoff_cap_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            fast_model: FAST_MODEL.to_string(),
            max_tokens: 8192,
            max_attempts: 3,
            attempt_timeout_ms: 30000,
            backoff_base_ms: 1000,
            backoff_cap_ms: 5000,
        }
    }
}

/// Read an env var, falling back to `default` when unset
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl TranslatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_env_with_key(None)
    }

    /// Load configuration from environment variables, taking `api_key` in
    /// place of `ANTHROPIC_API_KEY` when given
    pub fn from_env_with_key(api_key: Option<String>) -> anyhow::Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => std::env::var("ANTHROPIC_API_KEY")
                .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY environment variable is required"))?,
        };

        let api_endpoint = env_or("API_ENDPOINT", DEFAULT_ENDPOINT);
        let api_version = env_or("API_VERSION", DEFAULT_API_VERSION);
        let default_model = env_or("DEFAULT_MODEL", DEFAULT_MODEL);
        let fast_model = env_or("FAST_MODEL", FAST_MODEL);

        let max_tokens = env_or("MAX_TOKENS", "8192").parse::<u32>()?;
        let max_attempts = env_or("MAX_ATTEMPTS", "3")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("Invalid MAX_ATTEMPTS: {}", e))?;
        let attempt_timeout_ms = env_or("ATTEMPT_TIMEOUT_MS", "30000").parse::<u64>()?;
        let backoff_base_ms = env_or("BACKOFF_BASE_MS", "1000").parse::<u64>()?;
        let backoff_cap_ms = env_or("BACKOFF_CAP_MS", "5000").parse::<u64>()?;

        Ok(Self {
            api_key,
            api_endpoint,
            api_version,
            default_model,
            fast_model,
            max_tokens,
            max_attempts,
            attempt_timeout_ms,
            backoff_base_ms,
            backoff_cap_ms,
        })
    }

    /// Load from JSON file; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            return Err(anyhow::anyhow!("API key is required"));
        }

        if self.api_endpoint.is_empty() {
            return Err(anyhow::anyhow!("API endpoint is required"));
        }

        if self.default_model.is_empty() || self.fast_model.is_empty() {
            return Err(anyhow::anyhow!("Model names must not be empty"));
        }

        if self.max_attempts == 0 {
            return Err(anyhow::anyhow!("max_attempts must be greater than 0"));
        }

        if self.attempt_timeout_ms == 0 {
            return Err(anyhow::anyhow!("attempt_timeout_ms must be greater than 0"));
        }

        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(anyhow::anyhow!("backoff_cap_ms must not be below backoff_base_ms"));
        }

        Ok(())
    }

    /// Retry policy for the generation invoker
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            attempt_timeout: Duration::from_millis(self.attempt_timeout_ms),
            base_backoff: Duration::from_millis(self.backoff_base_ms),
            max_backoff: Duration::from_millis(self.backoff_cap_ms),
        }
    }
}
