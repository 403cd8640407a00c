//! Configuration for the completion provider connection

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Connection and model settings for an OpenAI-compatible provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
#[builder(setter(into))]
pub struct OpenAiConfig {
    /// Base URL of the API (e.g., "https://api.openai.com/v1")
    #[serde(default = "default_base_url")]
    #[builder(default = "default_base_url()")]
    pub base_url: String,
    /// API key; a per-request override takes precedence
    #[serde(default)]
    #[builder(default)]
    pub api_key: Option<String>,
    /// Model used for text-only conversations
    #[serde(default = "default_model")]
    #[builder(default = "default_model()")]
    pub default_model: String,
    /// Model used when the request carries an image attachment
    #[serde(default = "default_vision_model")]
    #[builder(default = "default_vision_model()")]
    pub vision_model: String,
    /// Upper bound on generated tokens, when the provider should be told one
    #[serde(default)]
    #[builder(default)]
    pub max_tokens: Option<u32>,
    /// Seconds allowed for establishing the connection
    #[serde(default = "default_connect_timeout_secs")]
    #[builder(default = "default_connect_timeout_secs()")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_vision_model() -> String {
    "gpt-4-vision-preview".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            default_model: default_model(),
            vision_model: default_vision_model(),
            max_tokens: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl OpenAiConfig {
    /// Overlay the conventional provider environment variables.
    ///
    /// Reads:
    /// - `OPENAI_API_KEY`
    /// - `OPENAI_MODEL` (replaces the default model)
    /// - `OPENAI_BASE_URL`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay the provider variables as resolved by `lookup`. Blank values are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_models::OpenAiConfig;
    ///
    /// let config = OpenAiConfig::default().with_overrides_from(|key| match key {
    ///     "OPENAI_MODEL" => Some("gpt-4o-mini".to_string()),
    ///     "OPENAI_API_KEY" => Some("  ".to_string()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.default_model, "gpt-4o-mini");
    /// assert!(config.api_key.is_none());
    /// ```
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = value("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = value("OPENAI_MODEL") {
            self.default_model = model;
        }
        if let Some(url) = value("OPENAI_BASE_URL") {
            self.base_url = url;
        }
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}
