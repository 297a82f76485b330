//! Config loader — reads `~/.neno/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.neno/config.json`
//! 3. Vendor variables (`OPENAI_API_KEY`, `GROQ_API_KEY`, `LOCAL_LLM_URL`, …)
//! 4. `NENO_<SECTION>__<FIELD>` variables (override everything above)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given (or default) path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    apply_env_overrides(load_config_from_path(&config_path))
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> anyhow::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Vendor variables fill in provider settings first, so a deployment that
/// only exports `GROQ_API_KEY` works without a config file. Then
/// `NENO_*` variables (double underscore as delimiter) override:
/// - `NENO_PROVIDERS__<NAME>__API_KEY` / `__API_BASE` / `__MODEL`
/// - `NENO_PROVIDER_PRIORITY` (comma separated)
/// - `NENO_REQUEST__MAX_TOKENS`, `NENO_REQUEST__TEMPERATURE`, `NENO_REQUEST__TIMEOUT_SECS`
/// - `NENO_COOPERATIVE__MAX_WORKERS`, `NENO_COOPERATIVE__COMPLEXITY_THRESHOLD`,
///   `NENO_COOPERATIVE__SUBTASK_TIMEOUT_SECS`, `NENO_COOPERATIVE__KEYWORDS` (comma separated)
/// - `NENO_TRANSCRIPTION__API_KEY`
fn apply_env_overrides(mut config: Config) -> Config {
    apply_vendor_env(&mut config.providers.openai, "OPENAI", true);
    apply_vendor_env(&mut config.providers.groq, "GROQ", false);
    apply_vendor_env(&mut config.providers.openrouter, "OPENROUTER", true);
    if let Some(url) = env_nonempty("LOCAL_LLM_URL") {
        config.providers.local.api_base = Some(url);
    }
    if let Some(model) = env_nonempty("LOCAL_LLM_MODEL") {
        config.providers.local.model = Some(model);
    }

    apply_provider_env(&mut config.providers.openai, "OPENAI");
    apply_provider_env(&mut config.providers.groq, "GROQ");
    apply_provider_env(&mut config.providers.openrouter, "OPENROUTER");
    apply_provider_env(&mut config.providers.local, "LOCAL");

    if let Some(val) = env_nonempty("NENO_PROVIDER_PRIORITY") {
        config.provider_priority = split_list(&val);
    }

    // Request defaults
    if let Some(n) = env_parse::<u32>("NENO_REQUEST__MAX_TOKENS") {
        config.request.max_tokens = n;
    }
    if let Some(t) = env_parse::<f64>("NENO_REQUEST__TEMPERATURE") {
        config.request.temperature = t;
    }
    if let Some(s) = env_parse::<u64>("NENO_REQUEST__TIMEOUT_SECS") {
        config.request.timeout_secs = s;
    }

    // Cooperative policy
    if let Some(n) = env_parse::<usize>("NENO_COOPERATIVE__MAX_WORKERS") {
        config.cooperative.max_workers = n;
    }
    if let Some(t) = env_parse::<f64>("NENO_COOPERATIVE__COMPLEXITY_THRESHOLD") {
        config.cooperative.complexity_threshold = t;
    }
    if let Some(s) = env_parse::<u64>("NENO_COOPERATIVE__SUBTASK_TIMEOUT_SECS") {
        config.cooperative.subtask_timeout_secs = s;
    }
    if let Some(val) = env_nonempty("NENO_COOPERATIVE__KEYWORDS") {
        config.cooperative.keywords = split_list(&val);
    }

    if let Some(key) = env_nonempty("NENO_TRANSCRIPTION__API_KEY") {
        config.transcription.api_key = key;
    }

    config
}

/// `<VENDOR>_API_KEY`, `<VENDOR>_MODEL` and optionally `<VENDOR>_BASE_URL`.
fn apply_vendor_env(provider: &mut ProviderConfig, vendor: &str, has_base_url: bool) {
    if provider.api_key.is_empty() {
        if let Some(key) = env_nonempty(&format!("{vendor}_API_KEY")) {
            provider.api_key = key;
        }
    }
    if let Some(model) = env_nonempty(&format!("{vendor}_MODEL")) {
        provider.model = Some(model);
    }
    if has_base_url {
        if let Some(base) = env_nonempty(&format!("{vendor}_BASE_URL")) {
            provider.api_base = Some(base);
        }
    }
}

/// Apply `NENO_PROVIDERS__<NAME>__*` overrides for a single provider.
fn apply_provider_env(provider: &mut ProviderConfig, name: &str) {
    if let Some(val) = env_nonempty(&format!("NENO_PROVIDERS__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Some(val) = env_nonempty(&format!("NENO_PROVIDERS__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
    if let Some(val) = env_nonempty(&format!("NENO_PROVIDERS__{name}__MODEL")) {
        provider.model = Some(val);
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env_nonempty(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable env override");
            None
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
