//! Complexity analyzer — decides whether a prompt deserves cooperation.
//!
//! Pure and deterministic. Weights, threshold, divisor and keyword lexicon
//! all come from [`CooperativeConfig`]:
//!
//! ```text
//! score   = word_weight·words + char_weight·chars + sentence_weight·sentences
//!         + keyword_bonus (if any keyword occurs)
//! workers = clamp(ceil(score / worker_score_divisor), 1, max_workers)
//! ```

use std::sync::LazyLock;

use regex::Regex;

use neno_core::config::CooperativeConfig;

use crate::types::ComplexityAnalysis;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence break pattern is valid"));

/// Score `prompt` against `policy`.
pub fn analyze_complexity(prompt: &str, policy: &CooperativeConfig) -> ComplexityAnalysis {
    let word_count = prompt.split_whitespace().count();
    let char_count = prompt.chars().count();
    // Segments around terminator runs; a trailing terminator leaves an
    // empty last segment, which still counts.
    let sentence_count = SENTENCE_BREAK.split(prompt).count();

    let lowered = prompt.to_lowercase();
    let has_complex_keywords = policy
        .keywords
        .iter()
        .any(|kw| !kw.is_empty() && lowered.contains(&kw.to_lowercase()));

    let mut complexity_score = policy.word_weight * word_count as f64
        + policy.char_weight * char_count as f64
        + policy.sentence_weight * sentence_count as f64;
    if has_complex_keywords {
        complexity_score += policy.keyword_bonus;
    }

    ComplexityAnalysis {
        complexity_score,
        needs_cooperation: complexity_score > policy.complexity_threshold,
        word_count,
        char_count,
        sentence_count,
        has_complex_keywords,
        recommended_workers: recommended_workers(complexity_score, policy),
    }
}

/// Worker count for a score, always within `1..=max_workers`.
pub fn recommended_workers(score: f64, policy: &CooperativeConfig) -> usize {
    let max = policy.max_workers.max(1);
    if policy.worker_score_divisor <= 0.0 || !score.is_finite() {
        return max;
    }
    let wanted = (score / policy.worker_score_divisor).ceil();
    if wanted < 1.0 {
        1
    } else if wanted >= max as f64 {
        max
    } else {
        wanted as usize
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
