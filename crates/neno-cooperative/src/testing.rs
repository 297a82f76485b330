//! In-process provider fakes shared by the unit tests of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use neno_core::types::{Message, ProviderResponse, StreamDelta};
use neno_providers::{ChatStream, GenerateOptions, LlmProvider, ProviderError, ProviderRegistry};

type Responder = dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync;

/// Provider that answers from a closure over the last user message.
pub(crate) struct ScriptedProvider {
    name: String,
    responder: Box<Responder>,
    delay: Option<(String, Duration)>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    conversations: Mutex<Vec<Vec<Message>>>,
    temperatures: Mutex<Vec<f64>>,
}

impl ScriptedProvider {
    pub fn new(
        name: &str,
        responder: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            responder: Box::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            conversations: Mutex::new(Vec::new()),
            temperatures: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering any prompt that contains `marker`.
    pub fn with_delay(mut self, marker: &str, delay: Duration) -> Self {
        self.delay = Some((marker.to_string(), delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Full message lists, one per call.
    pub fn conversations(&self) -> Vec<Vec<Message>> {
        self.conversations.lock().unwrap().clone()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.temperatures.lock().unwrap().clone()
    }

    async fn answer(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = neno_core::types::last_user_content(messages)
            .unwrap_or_default()
            .to_string();
        self.prompts.lock().unwrap().push(prompt.clone());
        self.conversations.lock().unwrap().push(messages.to_vec());
        self.temperatures.lock().unwrap().push(options.temperature);

        if let Some((marker, delay)) = &self.delay {
            if prompt.contains(marker.as_str()) {
                tokio::time::sleep(*delay).await;
            }
        }
        (self.responder)(&prompt)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ProviderResponse, ProviderError> {
        let content = self.answer(messages, options).await?;
        Ok(ProviderResponse::new(content, "scripted-model", "adapter"))
    }

    async fn generate_stream(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<ChatStream, ProviderError> {
        let content = self.answer(messages, options).await?;
        let name = self.name.clone();
        let deltas: Vec<Result<StreamDelta, ProviderError>> = content
            .split_inclusive(' ')
            .map(|word| {
                Ok(StreamDelta {
                    delta: word.to_string(),
                    model: Some("scripted-model".to_string()),
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
        "scripted-model"
    }
}

/// Registry holding exactly the given providers, in order.
pub(crate) fn registry_with(providers: &[Arc<ScriptedProvider>]) -> Arc<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();
    for provider in providers {
        registry.register(provider.clone());
    }
    Arc::new(registry)
}
