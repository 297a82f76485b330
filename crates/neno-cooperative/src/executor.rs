//! Cooperative executor — runs subtasks against the provider registry.
//!
//! Blocking runs fan out on a [`JoinSet`] bounded by a [`Semaphore`];
//! streaming runs go one subtask at a time. Every subtask gets its own
//! timeout and its failure is recorded as a value, so one bad call never
//! cancels its siblings.
//!
//! A subtask whose `depends_on` names an earlier subtask waits for it and
//! receives its output as context. Subtasks are grouped into waves by
//! dependency depth; each wave runs in parallel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use neno_core::types::{Message, ProviderResponse};
use neno_providers::{ChatRequest, GenerateOptions, ProviderRegistry};

use crate::types::{Subtask, SubtaskResult};

// ─────────────────────────────────────────────
// CooperativeExecutor
// ─────────────────────────────────────────────

/// Runs a batch of subtasks and collects one result per subtask.
pub struct CooperativeExecutor {
    registry: Arc<ProviderRegistry>,
    options: GenerateOptions,
    max_workers: usize,
    timeout: Duration,
}

impl CooperativeExecutor {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        options: GenerateOptions,
        max_workers: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            options,
            max_workers: max_workers.max(1),
            timeout,
        }
    }

    /// Run every subtask; results come back in submission order.
    pub async fn execute(&self, subtasks: &[Subtask], stream: bool) -> Vec<SubtaskResult> {
        if subtasks.is_empty() {
            return Vec::new();
        }

        let links = dependency_links(subtasks);
        let results = if stream {
            self.execute_sequential(subtasks, &links).await
        } else {
            self.execute_waves(subtasks, &links).await
        };

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            submitted = subtasks.len(),
            succeeded,
            failed = subtasks.len() - succeeded,
            stream,
            "Subtasks finished"
        );
        results
    }

    async fn execute_waves(&self, subtasks: &[Subtask], links: &[Option<usize>]) -> Vec<SubtaskResult> {
        let levels = wave_levels(links);
        let last_wave = levels.iter().copied().max().unwrap_or(0);
        let permits = self.max_workers.min(subtasks.len());
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut slots: Vec<Option<SubtaskResult>> = vec![None; subtasks.len()];

        for wave in 0..=last_wave {
            let mut join_set = JoinSet::new();

            for index in (0..subtasks.len()).filter(|&i| levels[i] == wave) {
                let context = links[index].and_then(|d| slots[d].as_ref());
                let prompt = subtask_prompt(&subtasks[index], context);
                let registry = Arc::clone(&self.registry);
                let semaphore = Arc::clone(&semaphore);
                let request = ChatRequest::new(self.options.clone());
                let limit = self.timeout;

                debug!(subtask = index + 1, wave, role = %subtasks[index].role, "Spawning subtask");
                join_set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let outcome = run_subtask(&registry, prompt, &request, limit).await;
                    (index, outcome)
                });
            }

            // Completion order; slots restore submission order.
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((index, outcome)) => {
                        slots[index] = Some(record(index, &subtasks[index], outcome));
                    }
                    Err(e) => warn!(error = %e, "Subtask task aborted"),
                }
            }
        }

        slots
            .into_iter()
            .zip(subtasks)
            .map(|(slot, task)| {
                slot.unwrap_or_else(|| SubtaskResult::failed(task.clone(), "subtask task panicked"))
            })
            .collect()
    }

    async fn execute_sequential(
        &self,
        subtasks: &[Subtask],
        links: &[Option<usize>],
    ) -> Vec<SubtaskResult> {
        let request = ChatRequest::new(self.options.clone()).with_stream(true);
        let mut results: Vec<SubtaskResult> = Vec::with_capacity(subtasks.len());

        for (index, task) in subtasks.iter().enumerate() {
            let context = links[index].and_then(|d| results.get(d));
            let prompt = subtask_prompt(task, context);
            let outcome = run_subtask(&self.registry, prompt, &request, self.timeout).await;
            results.push(record(index, task, outcome));
        }

        results
    }
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

/// One registry call, drained to a full response, under `limit`.
async fn run_subtask(
    registry: &ProviderRegistry,
    prompt: String,
    request: &ChatRequest,
    limit: Duration,
) -> Result<ProviderResponse, String> {
    let messages = [Message::user(prompt)];
    let call = async {
        let reply = registry
            .get_response(&messages, request)
            .await
            .map_err(|e| e.to_string())?;
        reply.into_response().await.map_err(|e| e.to_string())
    };

    match tokio::time::timeout(limit, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(format!("subtask timed out after {limit:?}")),
    }
}

fn record(index: usize, task: &Subtask, outcome: Result<ProviderResponse, String>) -> SubtaskResult {
    match outcome {
        Ok(resp) => {
            info!(subtask = index + 1, role = %task.role, provider = %resp.provider, success = true, "Subtask done");
            SubtaskResult::succeeded(task.clone(), resp)
        }
        Err(e) => {
            warn!(subtask = index + 1, role = %task.role, success = false, error = %e, "Subtask failed");
            SubtaskResult::failed(task.clone(), e)
        }
    }
}

/// Index of the earlier subtask each subtask depends on, if resolvable.
///
/// A reference matches an earlier subtask's `order`, or its 1-based
/// position when it has none. Self, forward and unknown references are
/// dropped.
fn dependency_links(subtasks: &[Subtask]) -> Vec<Option<usize>> {
    subtasks
        .iter()
        .enumerate()
        .map(|(index, task)| {
            let target = task.depends_on?;
            let found = subtasks[..index]
                .iter()
                .enumerate()
                .position(|(j, earlier)| earlier.order.unwrap_or(j + 1) == target);
            if found.is_none() {
                debug!(subtask = index + 1, depends_on = target, "Ignoring unresolved dependency");
            }
            found
        })
        .collect()
}

/// Dependency depth of each subtask; depth 0 runs first.
fn wave_levels(links: &[Option<usize>]) -> Vec<usize> {
    let mut levels: Vec<usize> = Vec::with_capacity(links.len());
    for link in links {
        // Links only point backwards, so the target's level is known.
        let level = link.map(|d| levels[d] + 1).unwrap_or(0);
        levels.push(level);
    }
    levels
}

/// Subtask text, extended with the output of its dependency if it succeeded.
fn subtask_prompt(task: &Subtask, dependency: Option<&SubtaskResult>) -> String {
    match dependency.and_then(|d| d.content().map(|c| (d.task.role.as_str(), c))) {
        Some((role, output)) => format!(
            "{}\n\nOutput of the previous step ({role}):\n{output}",
            task.task
        ),
        None => task.task.clone(),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry_with, ScriptedProvider};
    use neno_providers::ProviderError;

    fn executor(provider: &Arc<ScriptedProvider>, timeout: Duration) -> CooperativeExecutor {
        CooperativeExecutor::new(
            registry_with(&[provider.clone()]),
            GenerateOptions::default(),
            3,
            timeout,
        )
    }

    fn three_subtasks() -> Vec<Subtask> {
        vec![
            Subtask::new("parte um", "researcher").with_order(1),
            Subtask::new("parte dois", "writer").with_order(2),
            Subtask::new("parte três", "reviewer").with_order(3),
        ]
    }

    #[test]
    fn test_dependency_links() {
        let subtasks = vec![
            Subtask::new("a", "r").with_order(1),
            Subtask::new("b", "w").with_order(2).with_depends_on(1),
            Subtask::new("c", "r").with_depends_on(3), // self
            Subtask::new("d", "r").with_depends_on(9), // unknown
            Subtask::new("e", "r").with_depends_on(2),
        ];
        assert_eq!(
            dependency_links(&subtasks),
            vec![None, Some(0), None, None, Some(1)]
        );
        assert_eq!(
            wave_levels(&dependency_links(&subtasks)),
            vec![0, 1, 0, 0, 2]
        );
    }

    #[test]
    fn test_subtask_prompt_with_context() {
        let task = Subtask::new("Revise o texto", "reviewer");
        let dep = SubtaskResult::succeeded(
            Subtask::new("Escreva", "writer"),
            ProviderResponse::new("Era uma vez", "m", "groq"),
        );
        let prompt = subtask_prompt(&task, Some(&dep));
        assert!(prompt.starts_with("Revise o texto"));
        assert!(prompt.contains("(writer)"));
        assert!(prompt.ends_with("Era uma vez"));

        let failed = SubtaskResult::failed(Subtask::new("x", "writer"), "boom");
        assert_eq!(subtask_prompt(&task, Some(&failed)), "Revise o texto");
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_order_kept() {
        let provider = Arc::new(ScriptedProvider::new("openai", |prompt| {
            if prompt.contains("dois") {
                Err(ProviderError::Timeout)
            } else {
                Ok(format!("feito: {prompt}"))
            }
        }));
        let results = executor(&provider, Duration::from_secs(5))
            .execute(&three_subtasks(), false)
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[2].success);
        assert_eq!(results[1].task.task, "parte dois");
        assert!(results[1].error.as_deref().unwrap().contains("timed out"));
        assert_eq!(results[2].content(), Some("feito: parte três"));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_subtask_timeout_is_a_failure() {
        let provider = Arc::new(
            ScriptedProvider::new("openai", |prompt| Ok(prompt.to_uppercase()))
                .with_delay("dois", Duration::from_secs(10)),
        );
        let results = executor(&provider, Duration::from_millis(100))
            .execute(&three_subtasks(), false)
            .await;

        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].error.as_deref().unwrap().starts_with("subtask timed out"));
        assert_eq!(results[2].content(), Some("PARTE TRÊS"));
    }

    #[tokio::test]
    async fn test_subtasks_use_given_temperature() {
        let provider = Arc::new(ScriptedProvider::new("groq", |_| Ok("ok".into())));
        let executor = CooperativeExecutor::new(
            registry_with(&[provider.clone()]),
            GenerateOptions::default().with_temperature(0.7),
            2,
            Duration::from_secs(5),
        );
        executor.execute(&three_subtasks(), false).await;
        assert_eq!(provider.temperatures(), vec![0.7, 0.7, 0.7]);
    }

    #[tokio::test]
    async fn test_dependency_output_passed_as_context() {
        let provider = Arc::new(ScriptedProvider::new("openai", |prompt| {
            if prompt.starts_with("Pesquise") {
                Ok("fatos sobre café".into())
            } else {
                Ok(format!("texto baseado em [{prompt}]"))
            }
        }));
        let subtasks = vec![
            Subtask::new("Escreva o capítulo", "writer").with_order(2).with_depends_on(1),
            Subtask::new("Pesquise o tema", "researcher").with_order(1),
        ];
        // Forward reference: the writer is first, so it cannot wait.
        let results = executor(&provider, Duration::from_secs(5))
            .execute(&subtasks, false)
            .await;
        assert!(!results[0].content().unwrap().contains("fatos"));

        let subtasks = vec![
            Subtask::new("Pesquise o tema", "researcher").with_order(1),
            Subtask::new("Escreva o capítulo", "writer").with_order(2).with_depends_on(1),
        ];
        let results = executor(&provider, Duration::from_secs(5))
            .execute(&subtasks, false)
            .await;
        assert!(results[1].content().unwrap().contains("fatos sobre café"));
        assert!(results[1].content().unwrap().contains("(researcher)"));
    }

    #[tokio::test]
    async fn test_streaming_runs_sequentially_and_drains() {
        let provider = Arc::new(ScriptedProvider::new("openrouter", |prompt| {
            Ok(format!("resposta para {prompt}"))
        }));
        let results = executor(&provider, Duration::from_secs(5))
            .execute(&three_subtasks(), true)
            .await;

        assert!(results.iter().all(|r| r.success));
        assert_eq!(results[0].content(), Some("resposta para parte um"));
        assert_eq!(results[0].result.as_ref().unwrap().provider, "openrouter");
        assert_eq!(
            provider.prompts(),
            vec!["parte um", "parte dois", "parte três"]
        );
    }

    #[tokio::test]
    async fn test_empty_streamed_answer_keeps_provider_name() {
        let provider = Arc::new(ScriptedProvider::new("openrouter", |_| Ok(String::new())));
        let results = executor(&provider, Duration::from_secs(5))
            .execute(&[Subtask::new("parte um", "writer")], true)
            .await;

        assert!(results[0].success);
        assert_eq!(results[0].content(), Some(""));
        assert_eq!(results[0].result.as_ref().unwrap().provider, "openrouter");
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let provider = Arc::new(ScriptedProvider::new("openai", |_| Ok("x".into())));
        let results = executor(&provider, Duration::from_secs(1)).execute(&[], false).await;
        assert!(results.is_empty());
        assert_eq!(provider.calls(), 0);
    }
}
