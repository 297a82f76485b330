//! LLM provider trait — the capability contract every vendor adapter meets.
//!
//! The `HttpProvider` in `http_provider.rs` covers all OpenAI-compatible APIs;
//! tests inject in-process fakes through the same trait.

use async_trait::async_trait;
use neno_core::config::RequestConfig;
use neno_core::types::{Message, ProviderResponse};

use crate::error::ProviderError;
use crate::stream::ChatStream;

/// Parameters for a single provider call.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateOptions {
    /// Model identifier; `None` uses the adapter's default model.
    pub model: Option<String>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

impl GenerateOptions {
    /// Options seeded from the configured request defaults.
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            model: None,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Trait that all LLM providers must implement.
///
/// Errors are returned as values, never folded into the response text, so
/// the registry can tell a failed call from an answer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the whole answer.
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Send a streaming chat completion request.
    ///
    /// Returns once the upstream accepted the request; the stream then
    /// yields text fragments until the vendor's end-of-stream marker.
    async fn generate_stream(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ChatStream, ProviderError>;

    /// Registry name (e.g. `"groq"`).
    fn name(&self) -> &str;

    /// The model used when a request does not name one.
    fn default_model(&self) -> &str;
}
