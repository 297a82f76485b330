//! Cooperative orchestrator — the context object wiring analysis,
//! division, execution and combination around one provider registry.
//!
//! Built once at startup and shared by `Arc`:
//!
//! ```text
//! prompt ─▶ analyze ─┬─ simple ──▶ registry (one call, stream honoured)
//!                    └─ complex ─▶ divide ─▶ execute ─▶ combine
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use neno_core::config::CooperativeConfig;
use neno_core::types::{Message, ProviderResponse};
use neno_providers::{ChatRequest, GenerateOptions, ProviderRegistry, Reply};

use crate::combiner;
use crate::complexity;
use crate::divider;
use crate::error::CooperativeError;
use crate::executor::CooperativeExecutor;
use crate::types::{ComplexityAnalysis, CooperationStatus, CooperativeResult, Subtask, SubtaskResult};

pub struct CooperativeOrchestrator {
    registry: Arc<ProviderRegistry>,
    config: CooperativeConfig,
    /// Base generation options; each stage overrides the temperature.
    options: GenerateOptions,
}

impl CooperativeOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, config: CooperativeConfig) -> Self {
        Self {
            registry,
            config,
            options: GenerateOptions::default(),
        }
    }

    /// Use `options` (model, max tokens) as the base for every call.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn config(&self) -> &CooperativeConfig {
        &self.config
    }

    pub fn analyze_complexity(&self, prompt: &str) -> ComplexityAnalysis {
        complexity::analyze_complexity(prompt, &self.config)
    }

    pub async fn divide_task(&self, prompt: &str, num_workers: usize) -> Vec<Subtask> {
        let options = self
            .options
            .clone()
            .with_temperature(self.config.division_temperature);
        divider::divide_task(&self.registry, &options, prompt, num_workers).await
    }

    pub async fn execute_subtasks(&self, subtasks: &[Subtask], stream: bool) -> Vec<SubtaskResult> {
        let options = self
            .options
            .clone()
            .with_temperature(self.config.subtask_temperature);
        CooperativeExecutor::new(
            Arc::clone(&self.registry),
            options,
            self.config.max_workers,
            Duration::from_secs(self.config.subtask_timeout_secs),
        )
        .execute(subtasks, stream)
        .await
    }

    pub async fn combine_results(
        &self,
        results: &[SubtaskResult],
        original_prompt: &str,
    ) -> Result<ProviderResponse, CooperativeError> {
        let options = self
            .options
            .clone()
            .with_temperature(self.config.combine_temperature);
        combiner::combine_results(&self.registry, &options, results, original_prompt).await
    }

    /// Answer `prompt`, cooperatively when its complexity calls for it.
    pub async fn execute_cooperative_task(
        &self,
        prompt: &str,
        stream: bool,
    ) -> Result<CooperativeResult, CooperativeError> {
        let analysis = self.analyze_complexity(prompt);

        if !analysis.needs_cooperation {
            info!(score = analysis.complexity_score, "Simple task, single provider call");
            let request = ChatRequest::new(self.options.clone()).with_stream(stream);
            let reply = self
                .registry
                .get_response(&[Message::user(prompt)], &request)
                .await?;

            return Ok(CooperativeResult {
                cooperative: false,
                workers_used: 1,
                complexity_analysis: analysis,
                subtasks: Vec::new(),
                subtask_results: Vec::new(),
                final_result: reply,
            });
        }

        info!(
            score = analysis.complexity_score,
            workers = analysis.recommended_workers,
            "Complex task, cooperating"
        );

        let subtasks = self.divide_task(prompt, analysis.recommended_workers).await;
        let subtask_results = self.execute_subtasks(&subtasks, stream).await;
        let combined = self.combine_results(&subtask_results, prompt).await?;

        Ok(CooperativeResult {
            cooperative: true,
            workers_used: subtasks.len(),
            complexity_analysis: analysis,
            subtasks,
            subtask_results,
            final_result: Reply::Complete(combined),
        })
    }

    pub fn get_cooperation_status(&self) -> CooperationStatus {
        CooperationStatus {
            cooperative_system: "active".to_string(),
            max_workers: self.config.max_workers,
            complexity_threshold: self.config.complexity_threshold,
            available_providers: self.registry.len(),
            provider_names: self.registry.provider_names(),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
