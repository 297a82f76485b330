//! Generic HTTP-based LLM provider for OpenAI-compatible APIs.
//!
//! Talks directly to any `/chat/completions` endpoint, in both blocking and
//! SSE streaming mode. Covers OpenAI, Groq, OpenRouter and local servers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, warn};

use neno_core::config::ProviderConfig;
use neno_core::types::{ChatCompletionRequest, ChatCompletionResponse, Message, ProviderResponse};

use crate::error::ProviderError;
use crate::spec::ProviderSpec;
use crate::stream::{sse_deltas, ChatStream};
use crate::traits::{GenerateOptions, LlmProvider};

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// An LLM provider that talks to an OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled). Its read timeout bounds the
    /// gap between stream chunks, not the whole body.
    client: reqwest::Client,
    /// Whole-call limit for blocking requests.
    timeout: Duration,
    /// API base URL (e.g. `"https://api.groq.com/openai/v1"`).
    api_base: String,
    /// API key for Bearer authentication. Empty for unauthenticated local servers.
    api_key: String,
    /// Default model for this provider instance.
    default_model: String,
    /// Spec headers plus user-configured extra headers.
    headers: HeaderMap,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("default_model", &self.default_model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl HttpProvider {
    /// Create a new HttpProvider from a provider config and spec.
    ///
    /// # Arguments
    /// * `config`  — User's config (api_key, api_base, model, extra_headers)
    /// * `spec`    — Static vendor spec
    /// * `timeout` — Whole-call limit for blocking requests; idle limit
    ///   between chunks for streams
    pub fn new(
        config: &ProviderConfig,
        spec: &'static ProviderSpec,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());

        let default_model = config
            .model
            .clone()
            .unwrap_or_else(|| spec.default_model.to_string());

        let mut pairs: Vec<(&str, &str)> = spec.static_headers.to_vec();
        if let Some(extra) = &config.extra_headers {
            pairs.extend(extra.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let mut headers = HeaderMap::new();
        for (key, value) in pairs {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(val)) => {
                    headers.insert(name, val);
                }
                _ => warn!("Invalid header: {}={}", key, value),
            }
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(HttpProvider {
            client,
            timeout,
            api_base,
            api_key: config.api_key.clone(),
            default_model,
            headers,
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    /// POST the request and turn non-2xx statuses into errors.
    async fn send(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        debug!(
            provider = self.spec.display_name,
            model = %model,
            messages = messages.len(),
            stream,
            "Calling LLM"
        );

        let body = ChatCompletionRequest {
            model,
            messages: messages.to_vec(),
            max_tokens: Some(options.max_tokens),
            temperature: Some(options.temperature),
            stream,
        };

        let mut request = self
            .client
            .post(self.completions_url())
            .headers(self.headers.clone())
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }
        if !stream {
            request = request.timeout(self.timeout);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
            ProviderError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %body,
                "API error"
            );
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmProvider for HttpProvider {
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ProviderResponse, ProviderError> {
        let response = self.send(messages, options, false).await?;

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(
                provider = self.spec.display_name,
                error = %e,
                "Failed to parse LLM response"
            );
            ProviderError::Parse(e.to_string())
        })?;

        let model = parsed.model.unwrap_or_else(|| {
            options
                .model
                .clone()
                .unwrap_or_else(|| self.default_model.clone())
        });
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;
        let content = choice.message.content.ok_or(ProviderError::EmptyResponse)?;

        debug!(
            provider = self.spec.display_name,
            chars = content.len(),
            finish_reason = choice.finish_reason.as_deref().unwrap_or("?"),
            "LLM response received"
        );

        Ok(ProviderResponse::new(content, model, self.spec.name).with_usage(parsed.usage))
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ChatStream, ProviderError> {
        let response = self.send(messages, options, true).await?;
        Ok(sse_deltas(response.bytes_stream(), self.spec.name))
    }

    fn name(&self) -> &str {
        self.spec.name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an HttpProvider for `spec` if `config` enables it.
///
/// Returns `Ok(None)` when the vendor simply isn't configured.
pub fn create_provider(
    spec: &'static ProviderSpec,
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Option<HttpProvider>, ProviderError> {
    if !spec.is_enabled(config) {
        return Ok(None);
    }

    debug!(
        provider = spec.display_name,
        api_base = config.api_base.as_deref().unwrap_or(spec.default_api_base),
        "Creating LLM provider"
    );

    HttpProvider::new(config, spec, timeout).map(Some)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
