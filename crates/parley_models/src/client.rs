//! Streaming chat completions over an OpenAI-compatible HTTP API.

use crate::{ApiErrorEnvelope, OpenAiConfig, convert, sse};
use async_trait::async_trait;
use parley_error::{ConfigError, ParleyResult, UpstreamError, UpstreamErrorKind};
use parley_interface::{CompletionProvider, CompletionRequest, TokenStream};
use std::time::Duration;
use tracing::instrument;

/// Streaming client for an OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// Only the connect phase is bounded; replies may stream for as long as
    /// the provider keeps sending.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.default_model))]
    pub fn new(config: OpenAiConfig) -> ParleyResult<Self> {
        tracing::debug!("Creating provider client");
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                UpstreamError::new(UpstreamErrorKind::Transport(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        Ok(Self { config, client })
    }

    /// Get the provider configuration
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    #[instrument(skip(self, req), fields(model = %req.model, messages = req.messages.len()))]
    async fn stream_completion(&self, req: &CompletionRequest) -> ParleyResult<TokenStream> {
        let api_key = req
            .api_key
            .as_deref()
            .or(self.config.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::missing("provider.api_key"))?;

        let body = convert::to_chat_request(req, self.config.max_tokens);
        let url = self.endpoint();
        tracing::debug!("Sending streaming chat completion request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request failed: {}", e);
                UpstreamError::new(UpstreamErrorKind::Transport(format!(
                    "Request failed: {}",
                    e
                )))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
                .map(|envelope| envelope.error.message)
                .ok()
                .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "Provider request failed".to_string());
            tracing::error!(status = status.as_u16(), %message, "Provider rejected request");
            return Err(UpstreamError::new(UpstreamErrorKind::Rejected {
                status: status.as_u16(),
                message,
            })
            .into());
        }

        tracing::debug!("Streaming request accepted, decoding SSE stream");
        Ok(sse::token_stream(response.bytes_stream()))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
