//! Provider registry — configured adapters, priority order, fallback.
//!
//! `auto` requests walk the priority list and return the first success.
//! An explicitly named provider is tried alone and never falls back.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use neno_core::config::Config;
use neno_core::types::Message;
use neno_core::utils::timestamp;

use crate::error::{ProviderError, ProviderFailure, RegistryError};
use crate::http_provider::create_provider;
use crate::spec::{ProviderKind, PROVIDERS};
use crate::stream::Reply;
use crate::traits::{GenerateOptions, LlmProvider};

// ─────────────────────────────────────────────
// Request types
// ─────────────────────────────────────────────

/// Which adapter should serve a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProviderSelection {
    /// Walk the priority list until one succeeds.
    #[default]
    Auto,
    /// Only this adapter.
    Named(String),
}

impl From<&str> for ProviderSelection {
    fn from(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("auto") {
            ProviderSelection::Auto
        } else {
            ProviderSelection::Named(name.to_string())
        }
    }
}

impl From<Option<&str>> for ProviderSelection {
    fn from(name: Option<&str>) -> Self {
        name.map(ProviderSelection::from).unwrap_or_default()
    }
}

/// One registry call: provider choice, streaming flag and generation options.
#[derive(Clone, Debug, Default)]
pub struct ChatRequest {
    pub provider: ProviderSelection,
    pub stream: bool,
    pub options: GenerateOptions,
}

impl ChatRequest {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<ProviderSelection>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}

// ─────────────────────────────────────────────
// Introspection
// ─────────────────────────────────────────────

/// Snapshot of the registry for status displays.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderStats {
    pub total_providers: usize,
    pub available_providers: Vec<String>,
    pub priority_order: Vec<String>,
    pub timestamp: String,
}

/// One registered adapter and its default model.
#[derive(Clone, Debug, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
}

// ─────────────────────────────────────────────
// ProviderRegistry
// ─────────────────────────────────────────────

/// Registered adapters keyed by name, plus the fallback priority.
///
/// The priority only ever names registered adapters.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    priority: RwLock<Vec<String>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_names())
            .field("priority", &self.priority())
            .finish()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            priority: RwLock::new(Vec::new()),
        }
    }

    /// Register every vendor that `config` enables, then apply the
    /// configured priority.
    ///
    /// Vendors missing from the configured priority are appended in
    /// lookup order so they still serve as a last resort.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let timeout = Duration::from_secs(config.request.timeout_secs);
        let mut registry = Self::new();

        for kind in ProviderKind::ALL {
            let spec = kind.spec();
            let Some(provider_config) = config.providers.get_by_name(spec.name) else {
                continue;
            };
            match create_provider(spec, provider_config, timeout)? {
                Some(provider) => {
                    info!(provider = spec.name, model = provider.default_model(), "Provider registered");
                    registry.register(Arc::new(provider));
                }
                None => debug!(provider = spec.name, "Provider not configured, skipping"),
            }
        }

        let mut order: Vec<String> = config
            .provider_priority
            .iter()
            .filter(|name| registry.providers.contains_key(name.as_str()))
            .cloned()
            .collect();
        for spec in PROVIDERS {
            if registry.providers.contains_key(spec.name) && !order.iter().any(|n| n == spec.name) {
                order.push(spec.name.to_string());
            }
        }
        order.dedup();
        registry.write_priority(order);

        Ok(registry)
    }

    /// Add (or replace) an adapter under its own name.
    ///
    /// A new name is appended to the end of the priority list.
    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        let name = provider.name().to_string();
        let is_new = self.providers.insert(name.clone(), provider).is_none();
        if is_new {
            let mut order = self.priority();
            order.push(name);
            self.write_priority(order);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered names, sorted.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Current fallback order.
    pub fn priority(&self) -> Vec<String> {
        match self.priority.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn write_priority(&self, order: Vec<String>) {
        match self.priority.write() {
            Ok(mut guard) => *guard = order,
            Err(poisoned) => *poisoned.into_inner() = order,
        }
    }

    /// Replace the fallback order.
    ///
    /// Unregistered names are dropped and duplicates collapsed. Returns
    /// `false` (leaving the order untouched) when nothing registered remains.
    pub fn set_provider_priority<S: AsRef<str>>(&self, names: &[S]) -> bool {
        let mut order: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if self.providers.contains_key(name) && !order.iter().any(|n| n == name) {
                order.push(name.to_string());
            }
        }

        if order.is_empty() {
            warn!("Priority update rejected: no registered provider named");
            return false;
        }

        info!(priority = ?order, "Provider priority updated");
        self.write_priority(order);
        true
    }

    /// Registered adapters with their default model, in priority order.
    pub fn available_providers(&self) -> Vec<ProviderInfo> {
        self.priority()
            .into_iter()
            .filter_map(|name| {
                self.providers.get(&name).map(|p| ProviderInfo {
                    model: p.default_model().to_string(),
                    name,
                })
            })
            .collect()
    }

    pub fn provider_stats(&self) -> ProviderStats {
        ProviderStats {
            total_providers: self.providers.len(),
            available_providers: self.provider_names(),
            priority_order: self.priority(),
            timestamp: timestamp(),
        }
    }

    /// Serve one chat request.
    ///
    /// With [`ProviderSelection::Auto`], adapters are tried in priority
    /// order and the first success wins; the error lists every failure.
    /// A streaming request counts as a success once the upstream accepted
    /// it; failures later in the stream surface to the consumer.
    pub async fn get_response(
        &self,
        messages: &[Message],
        request: &ChatRequest,
    ) -> Result<Reply, RegistryError> {
        match &request.provider {
            ProviderSelection::Named(name) => {
                let provider = self
                    .providers
                    .get(name)
                    .ok_or_else(|| RegistryError::UnknownProvider(name.clone()))?;
                self.attempt(name, provider.as_ref(), messages, request)
                    .await
                    .map_err(|source| RegistryError::Provider {
                        name: name.clone(),
                        source,
                    })
            }
            ProviderSelection::Auto => {
                let order = self.priority();
                if order.is_empty() {
                    return Err(RegistryError::NoProviders);
                }

                let mut failures = Vec::new();
                for name in order {
                    let Some(provider) = self.providers.get(&name) else {
                        continue;
                    };
                    match self.attempt(&name, provider.as_ref(), messages, request).await {
                        Ok(reply) => return Ok(reply),
                        Err(e) => failures.push(ProviderFailure {
                            provider: name,
                            reason: e.to_string(),
                        }),
                    }
                }

                Err(RegistryError::AllProvidersFailed(failures))
            }
        }
    }

    async fn attempt(
        &self,
        name: &str,
        provider: &dyn LlmProvider,
        messages: &[Message],
        request: &ChatRequest,
    ) -> Result<Reply, ProviderError> {
        debug!(provider = name, stream = request.stream, "Trying provider");

        let result = if request.stream {
            provider
                .generate_stream(messages, &request.options)
                .await
                .map(|stream| Reply::Stream {
                    provider: name.to_string(),
                    stream,
                })
        } else {
            provider
                .generate(messages, &request.options)
                .await
                .map(|mut resp| {
                    resp.provider = name.to_string();
                    Reply::Complete(resp)
                })
        };

        match &result {
            Ok(_) => info!(provider = name, success = true, "Provider answered"),
            Err(e) => warn!(provider = name, success = false, error = %e, "Provider failed"),
        }

        result
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ChatStream;
    use async_trait::async_trait;
    use neno_core::config::ProviderConfig;
    use neno_core::types::{ProviderResponse, StreamDelta};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        name: String,
        fail: bool,
        /// Stream without any fragment.
        silent: bool,
        calls: AtomicUsize,
    }

    impl FakeProvider {
        fn ok(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                fail: false,
                silent: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn silent(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                fail: false,
                silent: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.into(),
                fail: true,
                silent: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: &GenerateOptions,
        ) -> Result<ProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Status {
                    status: 500,
                    body: format!("{} down", self.name),
                });
            }
            Ok(ProviderResponse::new(
                format!("answer from {}", self.name),
                "fake-model",
                "adapter",
            ))
        }

        async fn generate_stream(
            &self,
            _messages: &[Message],
            _options: &GenerateOptions,
        ) -> Result<ChatStream, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Timeout);
            }
            let name = self.name.clone();
            let fragments: &[&str] = if self.silent { &[] } else { &["a", "b"] };
            let deltas: Vec<Result<StreamDelta, ProviderError>> = fragments
                .iter()
                .map(|d| {
                    Ok(StreamDelta {
                        delta: d.to_string(),
                        model: None,
                        provider: name.clone(),
                    })
                })
                .collect();
            let stream: ChatStream = Box::pin(futures_util::stream::iter(deltas));
            Ok(stream)
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn default_model(&self) -> &str {
            "fake-model"
        }
    }

    fn registry(providers: &[Arc<FakeProvider>]) -> ProviderRegistry {
        let mut reg = ProviderRegistry::new();
        for p in providers {
            reg.register(p.clone());
        }
        reg
    }

    fn user() -> Vec<Message> {
        vec![Message::user("Olá")]
    }

    #[test]
    fn test_selection_from_str() {
        assert_eq!(ProviderSelection::from("auto"), ProviderSelection::Auto);
        assert_eq!(ProviderSelection::from(""), ProviderSelection::Auto);
        assert_eq!(ProviderSelection::from(None), ProviderSelection::Auto);
        assert_eq!(
            ProviderSelection::from("groq"),
            ProviderSelection::Named("groq".into())
        );
    }

    #[test]
    fn test_register_appends_to_priority() {
        let reg = registry(&[FakeProvider::ok("openai"), FakeProvider::ok("groq")]);
        assert_eq!(reg.priority(), vec!["openai", "groq"]);
        assert_eq!(reg.provider_names(), vec!["groq", "openai"]);
        assert_eq!(reg.len(), 2);
    }

    #[tokio::test]
    async fn test_auto_falls_back_in_priority_order() {
        let openai = FakeProvider::failing("openai");
        let openrouter = FakeProvider::ok("openrouter");
        let groq = FakeProvider::ok("groq");
        let reg = registry(&[openai.clone(), openrouter.clone(), groq.clone()]);

        let reply = reg
            .get_response(&user(), &ChatRequest::default())
            .await
            .unwrap();
        let resp = reply.into_response().await.unwrap();

        assert_eq!(resp.content, "answer from openrouter");
        assert_eq!(resp.provider, "openrouter");
        assert_eq!(openai.calls(), 1);
        assert_eq!(openrouter.calls(), 1);
        assert_eq!(groq.calls(), 0);
    }

    #[tokio::test]
    async fn test_auto_all_failed_lists_each_provider() {
        let reg = registry(&[FakeProvider::failing("openai"), FakeProvider::failing("groq")]);
        let err = reg
            .get_response(&user(), &ChatRequest::default())
            .await
            .unwrap_err();

        match err {
            RegistryError::AllProvidersFailed(failures) => {
                let names: Vec<_> = failures.iter().map(|f| f.provider.as_str()).collect();
                assert_eq!(names, vec!["openai", "groq"]);
                assert!(failures[1].reason.contains("groq down"));
            }
            other => panic!("expected AllProvidersFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auto_with_no_providers() {
        let reg = ProviderRegistry::new();
        let err = reg
            .get_response(&user(), &ChatRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NoProviders));
    }

    #[tokio::test]
    async fn test_named_unknown_provider() {
        let openai = FakeProvider::ok("openai");
        let reg = registry(&[openai.clone()]);
        let request = ChatRequest::default().with_provider("nonexistent");

        let err = reg.get_response(&user(), &request).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownProvider(ref n) if n == "nonexistent"));
        assert_eq!(openai.calls(), 0);
    }

    #[tokio::test]
    async fn test_named_failure_does_not_fall_back() {
        let groq = FakeProvider::failing("groq");
        let openai = FakeProvider::ok("openai");
        let reg = registry(&[openai.clone(), groq.clone()]);
        let request = ChatRequest::default().with_provider("groq");

        let err = reg.get_response(&user(), &request).await.unwrap_err();
        assert!(matches!(err, RegistryError::Provider { ref name, .. } if name == "groq"));
        assert_eq!(groq.calls(), 1);
        assert_eq!(openai.calls(), 0);
    }

    #[tokio::test]
    async fn test_stream_request_returns_stream() {
        let reg = registry(&[FakeProvider::failing("openai"), FakeProvider::ok("groq")]);
        let request = ChatRequest::default().with_stream(true);

        let reply = reg.get_response(&user(), &request).await.unwrap();
        assert!(reply.is_stream());
        assert_eq!(reply.provider(), "groq");
        let resp = reply.into_response().await.unwrap();
        assert_eq!(resp.content, "ab");
        assert_eq!(resp.provider, "groq");
    }

    #[tokio::test]
    async fn test_empty_stream_keeps_answering_provider() {
        let reg = registry(&[FakeProvider::failing("openai"), FakeProvider::silent("openrouter")]);
        let request = ChatRequest::default().with_stream(true);

        let resp = reg
            .get_response(&user(), &request)
            .await
            .unwrap()
            .into_response()
            .await
            .unwrap();
        assert!(resp.content.is_empty());
        assert_eq!(resp.provider, "openrouter");
    }

    #[tokio::test]
    async fn test_set_priority_changes_fallback_order() {
        let openai = FakeProvider::ok("openai");
        let groq = FakeProvider::ok("groq");
        let reg = registry(&[openai.clone(), groq.clone()]);

        assert!(reg.set_provider_priority(&["groq", "bogus", "groq", "openai"]));
        assert_eq!(reg.priority(), vec!["groq", "openai"]);

        let resp = reg
            .get_response(&user(), &ChatRequest::default())
            .await
            .unwrap()
            .into_response()
            .await
            .unwrap();
        assert_eq!(resp.provider, "groq");
        assert_eq!(openai.calls(), 0);
    }

    #[test]
    fn test_set_priority_rejects_unknown_only() {
        let reg = registry(&[FakeProvider::ok("openai")]);
        assert!(!reg.set_provider_priority(&["bogus"]));
        assert!(!reg.set_provider_priority::<&str>(&[]));
        assert_eq!(reg.priority(), vec!["openai"]);
    }

    #[test]
    fn test_stats_and_available() {
        let reg = registry(&[FakeProvider::ok("openai"), FakeProvider::ok("groq")]);
        let stats = reg.provider_stats();
        assert_eq!(stats.total_providers, 2);
        assert_eq!(stats.priority_order, vec!["openai", "groq"]);
        assert!(!stats.timestamp.is_empty());

        let available = reg.available_providers();
        assert_eq!(available[1].name, "groq");
        assert_eq!(available[1].model, "fake-model");
    }

    #[test]
    fn test_from_config_registers_configured_only() {
        let mut config = Config::default();
        config.providers.groq = ProviderConfig {
            api_key: "gsk-test".into(),
            ..Default::default()
        };
        config.providers.openai = ProviderConfig {
            api_key: "sk-test".into(),
            ..Default::default()
        };
        config.provider_priority = vec!["groq".into(), "openrouter".into()];

        let reg = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(reg.provider_names(), vec!["groq", "openai"]);
        // Configured order first, then remaining registered vendors.
        assert_eq!(reg.priority(), vec!["groq", "openai"]);
        assert!(reg.get("openrouter").is_none());
    }

    #[test]
    fn test_from_config_empty() {
        let reg = ProviderRegistry::from_config(&Config::default()).unwrap();
        assert!(reg.is_empty());
        assert!(reg.priority().is_empty());
    }
}
