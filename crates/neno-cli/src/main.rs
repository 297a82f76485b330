//! NENO CLI — entry point.
//!
//! # Commands
//!
//! - `neno chat [-m MESSAGE]` — chat (single-shot or REPL), cooperative by default
//! - `neno analyze PROMPT` — complexity analysis, no network
//! - `neno divide PROMPT [-w N]` — show how a prompt would be split
//! - `neno cooperate PROMPT` — run the full cooperative pipeline with a report
//! - `neno status` — configuration, providers and cooperation settings
//! - `neno onboard` — write a default config
//! - `neno transcribe FILE` — Whisper speech-to-text

mod helpers;
mod onboard;
mod repl;
mod status;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use neno_cooperative::complexity::analyze_complexity;
use neno_cooperative::{ChatOptions, ChatService, CooperativeOrchestrator};
use neno_core::config::{load_config, Config};
use neno_core::types::Message;
use neno_core::utils::expand_home;
use neno_providers::transcription::is_audio_file;
use neno_providers::{
    GenerateOptions, ProviderRegistry, ProviderSelection, RegistryError, TranscriptionProvider,
    WhisperTranscriber,
};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// NENO — multi-provider LLM assistant with cooperative execution
#[derive(Parser)]
#[command(name = "neno", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with NENO (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Provider name, or "auto" for priority order with fallback
        #[arg(short, long, default_value = "auto")]
        provider: String,

        /// Assistant mode (default, programmer, research, creative, voice, ...)
        #[arg(long, default_value = "default")]
        mode: String,

        /// Answer language, or "auto" to follow the user
        #[arg(long, default_value = "auto")]
        lang: String,

        /// Stream the answer as it is generated
        #[arg(long, default_value_t = false)]
        stream: bool,

        /// Never split complex prompts across workers
        #[arg(long, default_value_t = false)]
        no_cooperative: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Score a prompt's complexity (no network)
    Analyze {
        prompt: String,
    },

    /// Split a prompt into subtasks
    Divide {
        prompt: String,

        /// Number of workers (defaults to the recommended count)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        workers: Option<u16>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Run the cooperative pipeline and report every stage
    Cooperate {
        prompt: String,

        /// Stream subtasks (run sequentially)
        #[arg(long, default_value_t = false)]
        stream: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration, providers and cooperation status
    Status,

    /// Write a default configuration file
    Onboard,

    /// Transcribe an audio file
    Transcribe {
        file: String,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            provider,
            mode,
            lang,
            stream,
            no_cooperative,
            logs,
        } => {
            init_logging(logs);
            let options = ChatOptions {
                provider: ProviderSelection::from(provider.as_str()),
                stream,
                cooperative: !no_cooperative,
                mode,
                lang,
            };
            run_chat(message, options).await
        }
        Commands::Analyze { prompt } => run_analyze(&prompt),
        Commands::Divide {
            prompt,
            workers,
            logs,
        } => {
            init_logging(logs);
            run_divide(&prompt, workers.map(usize::from)).await
        }
        Commands::Cooperate {
            prompt,
            stream,
            logs,
        } => {
            init_logging(logs);
            run_cooperate(&prompt, stream).await
        }
        Commands::Status => status::run(),
        Commands::Onboard => onboard::run(),
        Commands::Transcribe { file, logs } => {
            init_logging(logs);
            run_transcribe(&file).await
        }
    }
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, options: ChatOptions) -> Result<()> {
    let config = load_config(None);
    let service = ChatService::new(build_orchestrator(&config)?);

    match message {
        Some(msg) => {
            info!(mode = %options.mode, "processing single message");
            let outcome = service
                .respond(&[Message::user(msg)], &options)
                .await
                .context("chat request failed")?;
            helpers::print_outcome(outcome).await?;
        }
        None => repl::run(service, options).await?,
    }

    Ok(())
}

fn run_analyze(prompt: &str) -> Result<()> {
    let config = load_config(None);
    let analysis = analyze_complexity(prompt, &config.cooperative);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn run_divide(prompt: &str, workers: Option<usize>) -> Result<()> {
    let config = load_config(None);
    let orchestrator = build_orchestrator(&config)?;
    let workers =
        workers.unwrap_or_else(|| orchestrator.analyze_complexity(prompt).recommended_workers);

    let subtasks = orchestrator.divide_task(prompt, workers).await;
    println!("{}", serde_json::to_string_pretty(&subtasks)?);
    Ok(())
}

async fn run_cooperate(prompt: &str, stream: bool) -> Result<()> {
    let config = load_config(None);
    let orchestrator = build_orchestrator(&config)?;

    let result = orchestrator
        .execute_cooperative_task(prompt, stream)
        .await
        .context("cooperative task failed")?;

    helpers::print_report(&result);
    helpers::print_reply(result.final_result).await?;
    Ok(())
}

async fn run_transcribe(file: &str) -> Result<()> {
    let config = load_config(None);
    let transcriber = WhisperTranscriber::from_config(&config.transcription);
    if !transcriber.is_configured() {
        anyhow::bail!("transcription needs an API key (GROQ_API_KEY or transcription.apiKey)");
    }

    let path = expand_home(file);
    if !is_audio_file(file) {
        eprintln!("{} {} does not look like an audio file", "!".yellow(), path.display());
    }

    let text = transcriber
        .transcribe(Path::new(&path))
        .await
        .with_context(|| format!("failed to transcribe {}", path.display()))?;

    if text.is_empty() {
        println!("{}", "(no speech recognized)".dimmed());
    } else {
        println!("{text}");
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Wiring
// ─────────────────────────────────────────────

/// Build the provider registry and orchestrator from the loaded configuration.
pub fn build_orchestrator(config: &Config) -> Result<Arc<CooperativeOrchestrator>> {
    let registry =
        ProviderRegistry::from_config(config).context("failed to initialize providers")?;
    if registry.is_empty() {
        return Err(RegistryError::NoProviders.into());
    }

    let orchestrator = CooperativeOrchestrator::new(Arc::new(registry), config.cooperative.clone())
        .with_options(GenerateOptions::from_config(&config.request));
    Ok(Arc::new(orchestrator))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("neno=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
