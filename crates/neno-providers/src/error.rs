//! Error types for provider calls and the fallback registry.

use thiserror::Error;

/// A single adapter call failed.
///
/// The registry recovers from these by trying the next adapter; the
/// cooperative executor records them as a failed subtask.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("response contained no content")]
    EmptyResponse,

    #[error("stream interrupted: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Parse(e.to_string())
        } else {
            ProviderError::Http(e.to_string())
        }
    }
}

/// One adapter's reason for failing inside an `auto` attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

/// Failure of a whole registry request.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An explicitly named provider is not registered. Never falls back.
    #[error("provider '{0}' is not registered")]
    UnknownProvider(String),

    /// An explicitly named provider failed. Never falls back.
    #[error("provider '{name}' failed: {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },

    /// Every adapter in the priority list failed.
    #[error("all providers failed:\n{}", format_failures(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),

    #[error("no LLM providers configured (set OPENAI_API_KEY, GROQ_API_KEY, OPENROUTER_API_KEY or LOCAL_LLM_URL)")]
    NoProviders,
}

fn format_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}
