//! Data carried through the cooperative pipeline.

use serde::{Deserialize, Deserializer, Serialize};

use neno_core::types::ProviderResponse;
use neno_providers::Reply;

// ─────────────────────────────────────────────
// Complexity
// ─────────────────────────────────────────────

/// Score and counts derived from one prompt.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComplexityAnalysis {
    pub complexity_score: f64,
    pub needs_cooperation: bool,
    pub word_count: usize,
    pub char_count: usize,
    pub sentence_count: usize,
    pub has_complex_keywords: bool,
    /// Always within `1..=max_workers`.
    pub recommended_workers: usize,
}

// ─────────────────────────────────────────────
// Subtasks
// ─────────────────────────────────────────────

/// One role-tagged fragment of a divided prompt.
///
/// Deserialization is lenient: the divider reads these out of free-form
/// model output.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Subtask {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub role: String,
    /// 1-based position among its siblings.
    #[serde(
        default,
        deserialize_with = "lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub order: Option<usize>,
    /// `order` of an earlier subtask whose output this one needs.
    #[serde(
        default,
        deserialize_with = "lenient_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub depends_on: Option<usize>,
}

impl Subtask {
    pub fn new(task: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_depends_on(mut self, order: usize) -> Self {
        self.depends_on = Some(order);
        self
    }
}

/// Accepts `2`, `"2"` or `null`; anything else reads as no index.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Outcome of one subtask. Failures are values, never propagated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SubtaskResult {
    pub task: Subtask,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ProviderResponse>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubtaskResult {
    pub fn succeeded(task: Subtask, result: ProviderResponse) -> Self {
        Self {
            task,
            result: Some(result),
            success: true,
            error: None,
        }
    }

    pub fn failed(task: Subtask, error: impl Into<String>) -> Self {
        Self {
            task,
            result: None,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Output text of a successful subtask.
    pub fn content(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.content.as_str())
    }
}

// ─────────────────────────────────────────────
// Pipeline result
// ─────────────────────────────────────────────

/// Top-level value returned by one orchestration run.
#[derive(Debug)]
pub struct CooperativeResult {
    pub cooperative: bool,
    pub workers_used: usize,
    pub complexity_analysis: ComplexityAnalysis,
    /// Every subtask submitted to the executor; empty on the single-call path.
    pub subtasks: Vec<Subtask>,
    /// One entry per submitted subtask, in submission order.
    pub subtask_results: Vec<SubtaskResult>,
    pub final_result: Reply,
}

impl CooperativeResult {
    pub fn failed_subtasks(&self) -> impl Iterator<Item = &SubtaskResult> {
        self.subtask_results.iter().filter(|r| !r.success)
    }
}

/// Snapshot of the cooperative system for status displays.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CooperationStatus {
    pub cooperative_system: String,
    pub max_workers: usize,
    pub complexity_threshold: f64,
    pub available_providers: usize,
    pub provider_names: Vec<String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
