//! Shared CLI helpers — reply printing, cooperative report, banner.

use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use futures_util::StreamExt;

use neno_cooperative::{ChatOutcome, CooperativeResult};
use neno_core::types::ProviderResponse;
use neno_core::utils::truncate_string;
use neno_providers::Reply;

/// Subtask previews in the cooperative report are cut to this many chars.
const PREVIEW_CHARS: usize = 120;

/// Print a complete response to stdout.
pub fn print_response(response: &ProviderResponse) {
    println!();
    println!(
        "{} {}",
        "🤖 NENO".cyan().bold(),
        format!("[{} · {}]", response.provider, response.model).dimmed()
    );
    if response.content.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", response.content);
    }
    if response.combined_raw {
        println!(
            "{}",
            "(synthesis failed; showing the concatenated partial results)".yellow()
        );
    }
    println!();
}

/// Print a reply, writing stream fragments as they arrive.
///
/// Returns the full text so the REPL can keep it in the conversation.
pub async fn print_reply(reply: Reply) -> Result<String> {
    match reply {
        Reply::Complete(response) => {
            print_response(&response);
            Ok(response.content)
        }
        Reply::Stream { mut stream, .. } => {
            println!();
            println!("{}", "🤖 NENO".cyan().bold());
            let mut stdout = std::io::stdout();
            let mut text = String::new();
            while let Some(delta) = stream.next().await {
                let delta = delta?;
                write!(stdout, "{}", delta.delta)?;
                stdout.flush()?;
                text.push_str(&delta.delta);
            }
            println!();
            println!();
            Ok(text)
        }
    }
}

/// Print the outcome of one chat turn.
pub async fn print_outcome(outcome: ChatOutcome) -> Result<String> {
    if let ChatOutcome::Cooperative(result) = &outcome {
        println!(
            "{}",
            format!("⚙ cooperative answer from {} workers", result.workers_used).dimmed()
        );
    }
    print_reply(outcome.into_reply()).await
}

/// Print every stage of a cooperative run.
pub fn print_report(result: &CooperativeResult) {
    let analysis = &result.complexity_analysis;
    println!();
    println!("{}", "⚙ Cooperative run".cyan().bold());
    println!(
        "  {:<14} {:.1} ({} words, {} sentences{})",
        "Score:".bold(),
        analysis.complexity_score,
        analysis.word_count,
        analysis.sentence_count,
        if analysis.has_complex_keywords {
            ", keyword"
        } else {
            ""
        }
    );

    if !result.cooperative {
        println!("  {:<14} single provider call", "Mode:".bold());
        return;
    }

    println!("  {:<14} {}", "Workers:".bold(), result.workers_used);
    println!();
    for (i, outcome) in result.subtask_results.iter().enumerate() {
        let marker = if outcome.success {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {}. [{}] {}",
            marker,
            i + 1,
            outcome.task.role,
            truncate_string(&outcome.task.task, PREVIEW_CHARS)
        );
        match (&outcome.result, &outcome.error) {
            (Some(resp), _) => println!(
                "      {}",
                format!("{} · {}", resp.provider, truncate_string(&resp.content, PREVIEW_CHARS))
                    .dimmed()
            ),
            (None, Some(error)) => println!("      {}", error.red()),
            (None, None) => {}
        }
    }
}

/// Print the banner shown at REPL start.
pub fn print_banner(provider_names: &[String]) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🤖 NENO".cyan().bold(), version.dimmed());
    println!(
        "{}",
        format!("Providers: {}", provider_names.join(", ")).dimmed()
    );
    println!("{}", "Type a message, or \"exit\" to quit.".dimmed());
    println!();
}

/// Print a "thinking" spinner placeholder (for non-log mode).
pub fn print_thinking() {
    eprint!("{}", "⠿ thinking...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use neno_core::types::StreamDelta;
    use neno_providers::{ChatStream, ProviderError};

    #[tokio::test]
    async fn complete_reply_returns_content() {
        let reply = Reply::Complete(ProviderResponse::new("olá", "gpt-4o-mini", "openai"));
        assert_eq!(print_reply(reply).await.unwrap(), "olá");
    }

    #[tokio::test]
    async fn stream_reply_concatenates_fragments() {
        let deltas: Vec<Result<StreamDelta, ProviderError>> = ["um ", "dois"]
            .into_iter()
            .map(|d| {
                Ok(StreamDelta {
                    delta: d.to_string(),
                    model: None,
                    provider: "groq".to_string(),
                })
            })
            .collect();
        let stream: ChatStream = Box::pin(futures_util::stream::iter(deltas));

        let reply = Reply::Stream {
            provider: "groq".into(),
            stream,
        };
        assert_eq!(print_reply(reply).await.unwrap(), "um dois");
    }

    #[tokio::test]
    async fn stream_error_is_returned() {
        let deltas: Vec<Result<StreamDelta, ProviderError>> =
            vec![Err(ProviderError::Stream("connection reset".into()))];
        let stream: ChatStream = Box::pin(futures_util::stream::iter(deltas));

        let reply = Reply::Stream {
            provider: "groq".into(),
            stream,
        };
        let err = print_reply(reply).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
