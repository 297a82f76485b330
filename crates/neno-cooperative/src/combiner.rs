//! Result combiner — fuses successful subtask outputs into one answer.

use tracing::{error, info};

use neno_core::types::{Message, ProviderResponse};
use neno_providers::{ChatRequest, GenerateOptions, ProviderRegistry};

use crate::error::CooperativeError;
use crate::types::SubtaskResult;

/// Provider name reported for a raw, unsynthesized combination.
pub const RAW_PROVIDER: &str = "raw";

/// Merge the successful entries of `results`.
///
/// - nothing succeeded: [`CooperativeError::AllSubtasksFailed`]
/// - one success: returned unchanged, no extra call
/// - several: a synthesis call; if it fails, the labeled parts joined by
///   blank lines come back with `combined_raw` set
pub async fn combine_results(
    registry: &ProviderRegistry,
    options: &GenerateOptions,
    results: &[SubtaskResult],
    original_prompt: &str,
) -> Result<ProviderResponse, CooperativeError> {
    let successes: Vec<(&SubtaskResult, &ProviderResponse)> = results
        .iter()
        .filter(|r| r.success)
        .filter_map(|r| r.result.as_ref().map(|resp| (r, resp)))
        .collect();

    match successes.as_slice() {
        [] => Err(CooperativeError::AllSubtasksFailed {
            attempted: results.len(),
        }),
        [(_, only)] => Ok((*only).clone()),
        parts => {
            let combined = labeled_parts(parts);
            let messages = [Message::user(synthesis_prompt(original_prompt, &combined))];
            let request = ChatRequest::new(options.clone());

            let synthesis = match registry.get_response(&messages, &request).await {
                Ok(reply) => reply.into_response().await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match synthesis {
                Ok(resp) => {
                    info!(parts = parts.len(), provider = %resp.provider, "Partial results synthesized");
                    Ok(resp)
                }
                Err(e) => {
                    error!(parts = parts.len(), error = %e, "Synthesis failed, returning raw parts");
                    let mut raw = ProviderResponse::new(combined, "", RAW_PROVIDER);
                    raw.combined_raw = true;
                    Ok(raw)
                }
            }
        }
    }
}

fn labeled_parts(parts: &[(&SubtaskResult, &ProviderResponse)]) -> String {
    parts
        .iter()
        .enumerate()
        .map(|(i, (result, resp))| format!("## Part {} - {}\n{}", i + 1, result.task.role, resp.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn synthesis_prompt(original_prompt: &str, combined: &str) -> String {
    format!(
        "Combine the partial results below into one cohesive, complete answer.\n\
         \n\
         ORIGINAL REQUEST:\n\
         {original_prompt}\n\
         \n\
         PARTIAL RESULTS:\n\
         {combined}\n\
         \n\
         Give a single integrated answer that covers every part consistently."
    )
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{registry_with, ScriptedProvider};
    use crate::types::Subtask;
    use neno_providers::ProviderError;
    use std::sync::Arc;

    fn ok(role: &str, content: &str) -> SubtaskResult {
        SubtaskResult::succeeded(
            Subtask::new(format!("{role} task"), role),
            ProviderResponse::new(content, "m", "groq"),
        )
    }

    fn failed(role: &str) -> SubtaskResult {
        SubtaskResult::failed(Subtask::new(format!("{role} task"), role), "request timed out")
    }

    #[tokio::test]
    async fn test_no_success_is_an_error() {
        let provider = Arc::new(ScriptedProvider::new("openai", |_| Ok("x".into())));
        let registry = registry_with(&[provider.clone()]);

        let err = combine_results(&registry, &GenerateOptions::default(), &[failed("a"), failed("b")], "p")
            .await
            .unwrap_err();
        assert!(matches!(err, CooperativeError::AllSubtasksFailed { attempted: 2 }));

        let err = combine_results(&registry, &GenerateOptions::default(), &[], "p")
            .await
            .unwrap_err();
        assert!(matches!(err, CooperativeError::AllSubtasksFailed { attempted: 0 }));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_success_returned_unchanged() {
        let provider = Arc::new(ScriptedProvider::new("openai", |_| Ok("síntese".into())));
        let registry = registry_with(&[provider.clone()]);
        let results = [failed("researcher"), ok("writer", "só eu")];

        let resp = combine_results(&registry, &GenerateOptions::default(), &results, "p")
            .await
            .unwrap();
        assert_eq!(resp, ProviderResponse::new("só eu", "m", "groq"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_uses_only_successes() {
        let provider = Arc::new(ScriptedProvider::new("openai", |prompt| {
            Ok(format!("SÍNTESE<{prompt}>"))
        }));
        let registry = registry_with(&[provider.clone()]);
        let results = [ok("researcher", "fatos"), failed("writer"), ok("reviewer", "revisão")];
        let options = GenerateOptions::default().with_temperature(0.3);

        let resp = combine_results(&registry, &options, &results, "Escreva um ebook")
            .await
            .unwrap();

        assert!(!resp.combined_raw);
        assert_eq!(resp.provider, "openai");
        assert!(resp.content.contains("## Part 1 - researcher\nfatos"));
        assert!(resp.content.contains("## Part 2 - reviewer\nrevisão"));
        assert!(!resp.content.contains("writer"));
        assert!(resp.content.contains("Escreva um ebook"));
        assert_eq!(provider.temperatures(), vec![0.3]);
    }

    #[tokio::test]
    async fn test_synthesis_failure_returns_raw_parts() {
        let provider = Arc::new(ScriptedProvider::new("openai", |_| {
            Err(ProviderError::Status {
                status: 503,
                body: "overloaded".into(),
            })
        }));
        let registry = registry_with(&[provider]);
        let results = [ok("researcher", "fatos"), ok("writer", "texto")];

        let resp = combine_results(&registry, &GenerateOptions::default(), &results, "p")
            .await
            .unwrap();

        assert!(resp.combined_raw);
        assert_eq!(resp.provider, RAW_PROVIDER);
        assert_eq!(
            resp.content,
            "## Part 1 - researcher\nfatos\n\n## Part 2 - writer\ntexto"
        );
    }
}
