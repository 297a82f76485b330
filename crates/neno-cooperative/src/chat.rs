//! Chat service — the entry point for one conversation turn.
//!
//! Adds the mode system prompt, routes complex requests through the
//! cooperative orchestrator and falls back to a plain registry call when
//! cooperation is off, not needed, or fails.

use std::sync::Arc;

use tracing::{error, info};

use neno_core::types::{last_user_content, Message};
use neno_providers::{ChatRequest, ProviderSelection, Reply};

use crate::error::ChatError;
use crate::modes::build_system_prompt;
use crate::orchestrator::CooperativeOrchestrator;
use crate::types::CooperativeResult;

/// Per-request knobs.
#[derive(Clone, Debug)]
pub struct ChatOptions {
    pub provider: ProviderSelection,
    pub stream: bool,
    /// Allow the cooperative path for complex prompts.
    pub cooperative: bool,
    pub mode: String,
    /// Answer language, or `"auto"` to follow the user.
    pub lang: String,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            provider: ProviderSelection::Auto,
            stream: false,
            cooperative: true,
            mode: "default".to_string(),
            lang: "auto".to_string(),
        }
    }
}

/// What answered a chat turn.
#[derive(Debug)]
pub enum ChatOutcome {
    /// One registry call over the whole conversation.
    Direct(Reply),
    /// The cooperative pipeline over the last user message.
    Cooperative(CooperativeResult),
}

impl ChatOutcome {
    pub fn into_reply(self) -> Reply {
        match self {
            ChatOutcome::Direct(reply) => reply,
            ChatOutcome::Cooperative(result) => result.final_result,
        }
    }

    pub fn is_cooperative(&self) -> bool {
        matches!(self, ChatOutcome::Cooperative(_))
    }
}

pub struct ChatService {
    orchestrator: Arc<CooperativeOrchestrator>,
}

impl ChatService {
    pub fn new(orchestrator: Arc<CooperativeOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Arc<CooperativeOrchestrator> {
        &self.orchestrator
    }

    /// Answer one turn of `messages`.
    pub async fn respond(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatOutcome, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::EmptyConversation);
        }

        let mut conversation = Vec::with_capacity(messages.len() + 1);
        if !messages.iter().any(Message::is_system) {
            conversation.push(Message::system(build_system_prompt(&options.mode, &options.lang)));
        }
        conversation.extend_from_slice(messages);

        let prompt = last_user_content(&conversation).unwrap_or_default();
        if options.cooperative && !prompt.is_empty() {
            let analysis = self.orchestrator.analyze_complexity(prompt);
            if analysis.needs_cooperation {
                info!(
                    mode = %options.mode,
                    score = analysis.complexity_score,
                    "Using cooperative path"
                );
                match self
                    .orchestrator
                    .execute_cooperative_task(prompt, options.stream)
                    .await
                {
                    Ok(result) => return Ok(ChatOutcome::Cooperative(result)),
                    Err(e) => error!(error = %e, "Cooperation failed, falling back to a single call"),
                }
            }
        }

        let request = ChatRequest::new(self.orchestrator.options().clone())
            .with_provider(options.provider.clone())
            .with_stream(options.stream);
        let reply = self
            .orchestrator
            .registry()
            .get_response(&conversation, &request)
            .await?;

        info!(mode = %options.mode, stream = options.stream, "Chat turn answered");
        Ok(ChatOutcome::Direct(reply))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
