//! Provider specs — static metadata for the supported vendors.
//!
//! Each vendor is a tagged [`ProviderKind`] with one [`ProviderSpec`]
//! describing how to reach it. All of them speak the OpenAI chat
//! completions protocol, so a single HTTP adapter serves every kind.

use neno_core::config::ProviderConfig;

/// Closed set of vendor integrations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Groq,
    OpenRouter,
    /// Self-hosted OpenAI-compatible server (Ollama, vLLM, LM Studio…).
    Local,
}

impl ProviderKind {
    /// Every kind, in lookup order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Groq,
        ProviderKind::OpenRouter,
        ProviderKind::Local,
    ];

    /// The static spec for this kind.
    pub fn spec(self) -> &'static ProviderSpec {
        match self {
            ProviderKind::OpenAi => &PROVIDERS[0],
            ProviderKind::Groq => &PROVIDERS[1],
            ProviderKind::OpenRouter => &PROVIDERS[2],
            ProviderKind::Local => &PROVIDERS[3],
        }
    }
}

/// Static specification describing one LLM vendor.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    /// Registry name (e.g. `"openrouter"`).
    pub name: &'static str,
    /// Human-readable name for logs. E.g. `"OpenRouter"`.
    pub display_name: &'static str,
    /// Environment variable for the API key. E.g. `"OPENROUTER_API_KEY"`.
    pub env_key: &'static str,
    /// Default API base URL.
    pub default_api_base: &'static str,
    /// Model used when neither the config nor the request names one.
    pub default_model: &'static str,
    /// Hosted vendors need a key; a local server only needs a base URL.
    pub requires_key: bool,
    /// Headers always sent to this vendor.
    pub static_headers: &'static [(&'static str, &'static str)],
}

impl ProviderSpec {
    /// Whether `config` carries enough to register this provider.
    pub fn is_enabled(&self, config: &ProviderConfig) -> bool {
        if self.requires_key {
            config.is_configured()
        } else {
            config.is_configured() || config.api_base.is_some()
        }
    }
}

/// Supported vendors. Order here is lookup order only; fallback priority
/// lives in the configuration.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        kind: ProviderKind::OpenAi,
        name: "openai",
        display_name: "OpenAI",
        env_key: "OPENAI_API_KEY",
        default_api_base: "https://api.openai.com/v1",
        default_model: "gpt-4o-mini",
        requires_key: true,
        static_headers: &[],
    },
    ProviderSpec {
        kind: ProviderKind::Groq,
        name: "groq",
        display_name: "Groq",
        env_key: "GROQ_API_KEY",
        default_api_base: "https://api.groq.com/openai/v1",
        default_model: "llama-3.1-70b-versatile",
        requires_key: true,
        static_headers: &[],
    },
    // OpenRouter ranks apps by these two headers.
    ProviderSpec {
        kind: ProviderKind::OpenRouter,
        name: "openrouter",
        display_name: "OpenRouter",
        env_key: "OPENROUTER_API_KEY",
        default_api_base: "https://openrouter.ai/api/v1",
        default_model: "openai/gpt-4o-mini",
        requires_key: true,
        static_headers: &[
            ("HTTP-Referer", "https://github.com/neno-ia"),
            ("X-Title", "NENO IA"),
        ],
    },
    ProviderSpec {
        kind: ProviderKind::Local,
        name: "local",
        display_name: "Local",
        env_key: "LOCAL_LLM_URL",
        default_api_base: "http://localhost:11434/v1",
        default_model: "llama3",
        requires_key: false,
        static_headers: &[],
    },
];

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
