//! Task divider — splits one prompt into role-tagged subtasks.
//!
//! Two steps: ask a model for a JSON split and parse it, and if either the
//! call or the parse fails, split the prompt's words deterministically.
//! Division never fails.

use serde::Deserialize;
use tracing::{debug, info, warn};

use neno_core::types::Message;
use neno_providers::{ChatRequest, GenerateOptions, ProviderRegistry};

use crate::error::DivisionParseError;
use crate::types::Subtask;

/// Roles used by the deterministic split and to fill missing roles.
pub const FALLBACK_ROLES: [&str; 3] = ["researcher", "writer", "reviewer"];

/// Role of the single subtask produced for one worker.
pub const PRIMARY_ROLE: &str = "primary";

/// Split `prompt` into at most `num_workers` subtasks.
///
/// A worker count of zero counts as one. One worker yields the prompt
/// verbatim with role `primary` and no model call.
pub async fn divide_task(
    registry: &ProviderRegistry,
    options: &GenerateOptions,
    prompt: &str,
    num_workers: usize,
) -> Vec<Subtask> {
    let num_workers = num_workers.max(1);
    if num_workers == 1 {
        return vec![Subtask::new(prompt, PRIMARY_ROLE)];
    }

    let request = ChatRequest::new(options.clone());
    let messages = [Message::user(division_prompt(prompt, num_workers))];

    let answer = match registry.get_response(&messages, &request).await {
        Ok(reply) => reply.into_response().await,
        Err(e) => {
            warn!(error = %e, "Division call failed, using word split");
            return fallback_division(prompt, num_workers);
        }
    };

    match answer {
        Ok(resp) => match parse_subtasks(&resp.content, num_workers) {
            Ok(subtasks) => {
                info!(
                    requested = num_workers,
                    produced = subtasks.len(),
                    provider = %resp.provider,
                    "Task divided by model"
                );
                subtasks
            }
            Err(e) => {
                warn!(error = %e, "Unusable division answer, using word split");
                fallback_division(prompt, num_workers)
            }
        },
        Err(e) => {
            warn!(error = %e, "Division answer interrupted, using word split");
            fallback_division(prompt, num_workers)
        }
    }
}

fn division_prompt(prompt: &str, num_workers: usize) -> String {
    format!(
        "Split the following task into exactly {n} coherent, complementary subtasks.\n\
         \n\
         MAIN TASK:\n\
         {prompt}\n\
         \n\
         Answer with a JSON array of {n} objects, each with:\n\
         - \"task\": what this subtask must produce\n\
         - \"role\": the specialist role (researcher, writer, reviewer, ...)\n\
         - \"depends_on\": optional 1-based index of an earlier subtask whose output it needs\n",
        n = num_workers,
    )
}

/// Read subtasks out of free-form model text.
///
/// Takes the first well-formed JSON array of subtask objects found in the
/// text. Entries without a task are dropped, missing roles are filled from
/// [`FALLBACK_ROLES`], missing orders from the position, and the list is
/// truncated to `max`.
pub fn parse_subtasks(text: &str, max: usize) -> Result<Vec<Subtask>, DivisionParseError> {
    let mut saw_array = false;

    for (start, _) in text.match_indices('[') {
        let mut de = serde_json::Deserializer::from_str(&text[start..]);
        let Ok(parsed) = Vec::<Subtask>::deserialize(&mut de) else {
            continue;
        };
        saw_array = true;

        let subtasks: Vec<Subtask> = parsed
            .into_iter()
            .filter(|s| !s.task.trim().is_empty())
            .take(max)
            .enumerate()
            .map(|(i, mut s)| {
                s.task = s.task.trim().to_string();
                if s.role.trim().is_empty() {
                    s.role = FALLBACK_ROLES[i % FALLBACK_ROLES.len()].to_string();
                }
                s.order.get_or_insert(i + 1);
                s
            })
            .collect();

        if !subtasks.is_empty() {
            return Ok(subtasks);
        }
        debug!(offset = start, "Skipping JSON array without usable subtasks");
    }

    if saw_array {
        Err(DivisionParseError::Empty)
    } else {
        Err(DivisionParseError::NoArray)
    }
}

/// Deterministic split: `num_workers` contiguous word chunks.
///
/// Each chunk holds `words / num_workers` words and the last one takes the
/// remainder. Roles cycle through [`FALLBACK_ROLES`].
pub fn fallback_division(prompt: &str, num_workers: usize) -> Vec<Subtask> {
    let n = num_workers.max(1);
    let words: Vec<&str> = prompt.split_whitespace().collect();
    let chunk_size = words.len() / n;

    (0..n)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i + 1 == n { words.len() } else { start + chunk_size };
            let chunk = words[start..end].join(" ");
            Subtask::new(
                format!("{chunk} (part {} of {n})", i + 1),
                FALLBACK_ROLES[i % FALLBACK_ROLES.len()],
            )
            .with_order(i + 1)
        })
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
