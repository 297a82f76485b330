//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `RequestConfig`,
//! `CooperativeConfig`, `TranscriptionConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! We use `#[serde(rename_all = "camelCase")]` to handle the conversion.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.neno/config.json` + env vars.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    /// Fallback order for `provider = "auto"`. Names not registered at
    /// startup are dropped.
    pub provider_priority: Vec<String>,
    pub request: RequestConfig,
    pub cooperative: CooperativeConfig,
    pub transcription: TranscriptionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            provider_priority: default_priority(),
            request: RequestConfig::default(),
            cooperative: CooperativeConfig::default(),
            transcription: TranscriptionConfig::default(),
        }
    }
}

/// Quality first, then flexibility, then speed, then the local fallback.
pub fn default_priority() -> Vec<String> {
    ["openai", "openrouter", "groq", "local"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single LLM provider (API key, base URL, model, headers).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for Bearer authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model to use when the request does not name one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Extra HTTP headers to send with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl ProviderConfig {
    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderConfig,
    #[serde(default)]
    pub groq: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
    /// Self-hosted OpenAI-compatible server (Ollama, vLLM, …). Enabled by
    /// `apiBase` alone; the key is optional.
    #[serde(default)]
    pub local: ProviderConfig,
}

impl ProvidersConfig {
    /// Get a provider config by name (e.g. `"groq"`).
    pub fn get_by_name(&self, name: &str) -> Option<&ProviderConfig> {
        match name {
            "openai" => Some(&self.openai),
            "groq" => Some(&self.groq),
            "openrouter" => Some(&self.openrouter),
            "local" => Some(&self.local),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────
// Request defaults
// ─────────────────────────────────────────────

/// Defaults applied to every provider call.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestConfig {
    /// Maximum tokens to generate per response.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Per-call HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

// ─────────────────────────────────────────────
// Cooperative orchestration
// ─────────────────────────────────────────────

/// Tunable policy for the cooperative (multi-call) execution path.
///
/// The scoring weights and lexicon were tuned by trial on long-form
/// generation requests; they are kept here rather than in code.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CooperativeConfig {
    /// Upper bound on subtasks (and concurrent calls) per request.
    pub max_workers: usize,
    /// Prompts scoring strictly above this are split.
    pub complexity_threshold: f64,
    /// One worker is recommended per this many score points.
    pub worker_score_divisor: f64,
    pub word_weight: f64,
    pub char_weight: f64,
    pub sentence_weight: f64,
    /// Flat bonus when any keyword is present.
    pub keyword_bonus: f64,
    /// Case-insensitive substrings that mark long-form requests.
    pub keywords: Vec<String>,
    pub subtask_temperature: f64,
    pub division_temperature: f64,
    pub combine_temperature: f64,
    /// Budget for one subtask, including fallback across providers.
    pub subtask_timeout_secs: u64,
}

impl Default for CooperativeConfig {
    fn default() -> Self {
        Self {
            max_workers: 3,
            complexity_threshold: 500.0,
            worker_score_divisor: 300.0,
            word_weight: 0.3,
            char_weight: 0.1,
            sentence_weight: 0.5,
            keyword_bonus: 100.0,
            keywords: default_keywords(),
            subtask_temperature: 0.7,
            division_temperature: 0.3,
            combine_temperature: 0.3,
            subtask_timeout_secs: 120,
        }
    }
}

/// Default complexity lexicon (Portuguese long-form requests).
pub fn default_keywords() -> Vec<String> {
    [
        "ebook",
        "livro",
        "100 páginas",
        "longo",
        "extenso",
        "completo",
        "detalhado",
        "profundo",
        "pesado",
        "complexo",
        "capítulos",
        "seções",
        "tópicos múltiplos",
        "tutorial completo",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ─────────────────────────────────────────────
// Transcription
// ─────────────────────────────────────────────

/// Speech-to-text settings (Whisper-compatible endpoint).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionConfig {
    /// Falls back to `GROQ_API_KEY` when empty.
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: "https://api.groq.com/openai/v1/audio/transcriptions".to_string(),
            model: "whisper-large-v3".to_string(),
            timeout_secs: 30,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cooperative.max_workers, 3);
        assert_eq!(config.cooperative.complexity_threshold, 500.0);
        assert_eq!(config.request.timeout_secs, 60);
        assert_eq!(config.transcription.timeout_secs, 30);
        assert_eq!(
            config.provider_priority,
            vec!["openai", "openrouter", "groq", "local"]
        );
        assert!(config
            .cooperative
            .keywords
            .iter()
            .any(|k| k == "tutorial completo"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"cooperative": {"maxWorkers": 5, "keywords": ["novel"]}}"#,
        )
        .unwrap();
        assert_eq!(config.cooperative.max_workers, 5);
        assert_eq!(config.cooperative.keywords, vec!["novel"]);
        assert_eq!(config.cooperative.worker_score_divisor, 300.0);
        assert_eq!(config.request.max_tokens, 1000);
    }

    #[test]
    fn test_provider_lookup() {
        let mut providers = ProvidersConfig::default();
        providers.groq.api_key = "gsk_123".to_string();

        assert!(providers.get_by_name("groq").unwrap().is_configured());
        assert!(!providers.get_by_name("openai").unwrap().is_configured());
        assert!(providers.get_by_name("anthropic").is_none());
    }

    #[test]
    fn test_camel_case_serialization() {
        let raw = serde_json::to_value(Config::default()).unwrap();
        assert!(raw["cooperative"].get("complexityThreshold").is_some());
        assert!(raw.get("providerPriority").is_some());
        assert!(raw["request"].get("timeout_secs").is_none());
    }
}
